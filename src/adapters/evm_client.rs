//! EVM account client
//!
//! Wraps an alloy provider bound to one account's signer, proxy and RPC
//! endpoint. Every library error is classified into an `ActionError` at the
//! call site so the executor can pick the recovery.

use alloy::network::TransactionBuilder;
use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::transports::http::Http;
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::http::build_http_client;
use crate::config::AmountSetting;
use crate::domain::{Account, FeeModel, NetworkDescriptor};
use crate::error::{ActionError, Result, WayfarerError};
use crate::execution::{ChainSession, ExecutionContext, GasOracle};
use crate::signing::Wallet;

// Wrapped native token (WETH9 layout)
sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IWrappedNative {
        function deposit() external payable;
        function withdraw(uint256 wad) external;
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Native units to display decimal
pub fn from_wei(value: U256, decimals: u8) -> Decimal {
    format_units(value, decimals)
        .ok()
        .and_then(|s| Decimal::from_str(&s).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Display decimal to native units
pub fn to_wei(amount: Decimal, decimals: u8) -> std::result::Result<U256, ActionError> {
    parse_units(&amount.normalize().to_string(), decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| ActionError::Software(format!("Can not convert {} to units: {}", amount, e)))
}

/// Pick an amount from a setting: a random share of `balance` when
/// `percent`, otherwise a random absolute value in `[min, max]`.
pub fn pick_amount(setting: &AmountSetting, balance: Decimal, rng: &mut impl Rng) -> Decimal {
    let spread = setting.max - setting.min;
    let factor = Decimal::from_f64(rng.gen::<f64>()).unwrap_or(Decimal::ZERO);
    let value = setting.min + spread * factor;

    if setting.percent {
        (balance * value / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(8, RoundingStrategy::ToZero)
    } else {
        value.round_dp_with_strategy(6, RoundingStrategy::ToZero)
    }
}

/// Alloy-backed client for one account on one EVM network
pub struct EvmClient {
    ctx: ExecutionContext,
    wallet: Wallet,
    timeout: Duration,
    provider: DynProvider,
}

impl EvmClient {
    pub fn new(
        account: &Account,
        network: &'static NetworkDescriptor,
        proxy_pool: Arc<[String]>,
        timeout: Duration,
    ) -> Result<Self> {
        let wallet = Wallet::for_account(account)?;
        Self::from_context(ExecutionContext::new(account, network, proxy_pool), wallet, timeout)
    }

    fn from_context(ctx: ExecutionContext, wallet: Wallet, timeout: Duration) -> Result<Self> {
        if ctx.network().is_solana() {
            return Err(WayfarerError::Configuration(format!(
                "{} is not an EVM network",
                ctx.network().name
            )));
        }
        let provider = Self::connect(&ctx, &wallet, timeout)?;
        Ok(Self {
            ctx,
            wallet,
            timeout,
            provider,
        })
    }

    fn connect(ctx: &ExecutionContext, wallet: &Wallet, timeout: Duration) -> Result<DynProvider> {
        let url = ctx.rpc_url().parse::<url::Url>().map_err(|e| {
            WayfarerError::Configuration(format!("Invalid RPC URL {}: {}", ctx.rpc_url(), e))
        })?;
        let http = build_http_client(ctx.proxy(), timeout)?;
        let client = RpcClient::new(Http::with_client(http, url), false);

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_client(client)
            .erased();

        debug!(
            account = ctx.account(),
            network = ctx.network().name,
            "Connected to {} via {}",
            ctx.rpc_url(),
            ctx.proxy().unwrap_or("direct")
        );
        Ok(provider)
    }

    /// Same account and proxy on another network
    pub fn for_network(&self, network: &'static NetworkDescriptor) -> Result<Self> {
        Self::from_context(self.ctx.for_network(network), self.wallet.clone(), self.timeout)
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn network(&self) -> &'static NetworkDescriptor {
        self.ctx.network()
    }

    pub async fn native_balance(&self) -> std::result::Result<U256, ActionError> {
        Ok(self.provider.get_balance(self.address()).await?)
    }

    pub async fn native_balance_decimal(&self) -> std::result::Result<Decimal, ActionError> {
        let balance = self.native_balance().await?;
        Ok(from_wei(balance, self.network().decimals))
    }

    pub async fn gas_price_wei(&self) -> std::result::Result<u128, ActionError> {
        Ok(self.provider.get_gas_price().await?)
    }

    pub async fn wrapped_balance(&self) -> std::result::Result<U256, ActionError> {
        let contract = IWrappedNative::new(self.wrapped_address()?, self.provider.clone());
        Ok(contract.balanceOf(self.address()).call().await?)
    }

    /// Amount for an action, drawn from the setting against the native balance
    pub async fn resolve_amount(
        &self,
        setting: &AmountSetting,
    ) -> std::result::Result<Decimal, ActionError> {
        let balance = self.native_balance_decimal().await?;
        let amount = pick_amount(setting, balance, &mut rand::thread_rng());
        if amount > balance {
            return Err(ActionError::InsufficientFunds(format!(
                "need {} {}, have {}",
                amount,
                self.network().token,
                balance
            )));
        }
        Ok(amount)
    }

    pub async fn send_native(
        &self,
        to: Address,
        value: U256,
    ) -> std::result::Result<TxHash, ActionError> {
        let mut tx = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_value(value);
        if let Some(gas_price) = self.legacy_gas_price().await? {
            tx = tx.with_gas_price(gas_price);
        }

        let pending = self.provider.send_transaction(tx).await?;
        let receipt = pending.get_receipt().await?;
        self.confirm(receipt.status(), receipt.transaction_hash)
    }

    pub async fn wrap_native(&self, value: U256) -> std::result::Result<TxHash, ActionError> {
        let contract = IWrappedNative::new(self.wrapped_address()?, self.provider.clone());
        let mut call = contract.deposit().value(value);
        if let Some(gas_price) = self.legacy_gas_price().await? {
            call = call.gas_price(gas_price);
        }

        let receipt = call.send().await?.get_receipt().await?;
        self.confirm(receipt.status(), receipt.transaction_hash)
    }

    pub async fn unwrap_native(&self, value: U256) -> std::result::Result<TxHash, ActionError> {
        let contract = IWrappedNative::new(self.wrapped_address()?, self.provider.clone());
        let mut call = contract.withdraw(value);
        if let Some(gas_price) = self.legacy_gas_price().await? {
            call = call.gas_price(gas_price);
        }

        let receipt = call.send().await?.get_receipt().await?;
        self.confirm(receipt.status(), receipt.transaction_hash)
    }

    fn wrapped_address(&self) -> std::result::Result<Address, ActionError> {
        let network = self.network();
        let raw = network.wrapped_native.ok_or_else(|| {
            ActionError::NoRetry(format!("{} has no wrapped {} contract", network.name, network.token))
        })?;
        raw.parse()
            .map_err(|e| ActionError::Configuration(format!("Bad wrapped token address {}: {}", raw, e)))
    }

    async fn legacy_gas_price(&self) -> std::result::Result<Option<u128>, ActionError> {
        match self.network().fee_model {
            FeeModel::Legacy => Ok(Some(self.gas_price_wei().await?)),
            _ => Ok(None),
        }
    }

    fn confirm(&self, success: bool, tx_hash: TxHash) -> std::result::Result<TxHash, ActionError> {
        let url = self.network().tx_url(&format!("{:?}", tx_hash));
        if !success {
            return Err(ActionError::ContractReverted(format!("Transaction failed: {}", url)));
        }
        info!(account = self.ctx.account(), network = self.network().name, "Transaction confirmed: {}", url);
        Ok(tx_hash)
    }
}

impl ChainSession for EvmClient {
    fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    fn reconnect(&mut self) -> Result<()> {
        self.provider = Self::connect(&self.ctx, &self.wallet, self.timeout)?;
        Ok(())
    }
}

#[async_trait]
impl GasOracle for EvmClient {
    async fn gas_price_gwei(&self) -> std::result::Result<Decimal, ActionError> {
        let wei = self.gas_price_wei().await?;
        Ok(from_wei(U256::from(wei), 9))
    }

    fn rotate_endpoints(&mut self) {
        if let Err(e) = self.change_proxy() {
            warn!(account = self.ctx.account(), "Proxy rotation failed: {}", e);
        }
        if let Err(e) = self.change_rpc() {
            warn!(account = self.ctx.account(), "RPC rotation failed: {}", e);
        }
    }
}
