use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use tracing::info;

use crate::adapters::{from_wei, to_wei, EvmClient};
use crate::config::AmountSetting;
use crate::error::ActionError;
use crate::execution::{Action, ChainSession};

/// Deposit part of the native balance into the wrapped token
pub struct WrapNative {
    setting: AmountSetting,
}

impl WrapNative {
    pub fn new(setting: AmountSetting) -> Self {
        Self { setting }
    }
}

#[async_trait]
impl Action<EvmClient> for WrapNative {
    type Output = TxHash;

    fn name(&self) -> &str {
        "wrap_native"
    }

    async fn execute(&self, client: &EvmClient) -> Result<TxHash, ActionError> {
        let network = client.network();
        let amount = client.resolve_amount(&self.setting).await?;
        let value = to_wei(amount, network.decimals)?;
        if value.is_zero() {
            return Err(ActionError::InsufficientFunds(format!(
                "nothing to wrap on {}",
                network.name
            )));
        }

        info!(
            account = client.context().account(),
            network = network.name,
            "Wrap {} {}",
            amount,
            network.token
        );
        client.wrap_native(value).await
    }
}

/// Withdraw the whole wrapped balance back to native
pub struct UnwrapNative;

#[async_trait]
impl Action<EvmClient> for UnwrapNative {
    type Output = TxHash;

    fn name(&self) -> &str {
        "unwrap_native"
    }

    async fn execute(&self, client: &EvmClient) -> Result<TxHash, ActionError> {
        let network = client.network();
        let balance = client.wrapped_balance().await?;
        if balance == U256::ZERO {
            return Err(ActionError::NoRetry("Can not withdraw Zero amount".to_string()));
        }

        info!(
            account = client.context().account(),
            network = network.name,
            "Unwrap {} {}",
            from_wei(balance, network.decimals).round_dp(6),
            network.token
        );
        client.unwrap_native(balance).await
    }
}

/// Native transfer to the account's transfer address
pub struct Transfer {
    name: &'static str,
    setting: AmountSetting,
    to: Option<String>,
}

impl Transfer {
    pub fn new(name: &'static str, setting: AmountSetting, to: Option<String>) -> Self {
        Self { name, setting, to }
    }

    fn recipient(&self) -> Result<Address, ActionError> {
        let raw = self
            .to
            .as_deref()
            .ok_or_else(|| ActionError::MissingParameter("transfer_address".to_string()))?;
        raw.parse().map_err(|e| {
            ActionError::Configuration(format!("Transfer address {} is invalid: {}", raw, e))
        })
    }
}

#[async_trait]
impl Action<EvmClient> for Transfer {
    type Output = TxHash;

    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, client: &EvmClient) -> Result<TxHash, ActionError> {
        let to = self.recipient()?;
        let network = client.network();
        let amount = client.resolve_amount(&self.setting).await?;
        let value = to_wei(amount, network.decimals)?;

        info!(
            account = client.context().account(),
            network = network.name,
            "Transfer {} {} to {} address",
            amount,
            network.token,
            to
        );
        client.send_native(to, value).await
    }
}
