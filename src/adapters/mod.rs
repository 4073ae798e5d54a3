pub mod evm_client;
pub mod http;
pub mod solana_client;

pub use evm_client::{from_wei, pick_amount, to_wei, EvmClient};
pub use http::build_http_client;
pub use solana_client::SolanaClient;

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Account, KeyKind, NetworkDescriptor};
use crate::error::{ActionError, Result};
use crate::execution::{ChainSession, ExecutionContext};

/// Client for an account, chosen by the kind of its key
pub enum AccountClient {
    Evm(EvmClient),
    Solana(SolanaClient),
}

impl AccountClient {
    /// Route the account to its client family. The key kind is checked
    /// before any client is built.
    pub fn connect(
        account: &Account,
        network: &'static NetworkDescriptor,
        proxy_pool: Arc<[String]>,
        timeout: Duration,
    ) -> Result<Self> {
        match account.key_kind()? {
            KeyKind::Evm => Ok(Self::Evm(EvmClient::new(account, network, proxy_pool, timeout)?)),
            KeyKind::Solana => Ok(Self::Solana(SolanaClient::new(account, proxy_pool, timeout)?)),
        }
    }

    pub fn key_kind(&self) -> KeyKind {
        match self {
            Self::Evm(_) => KeyKind::Evm,
            Self::Solana(_) => KeyKind::Solana,
        }
    }

    pub fn address(&self) -> String {
        match self {
            Self::Evm(client) => client.address().to_string(),
            Self::Solana(client) => client.address().to_string(),
        }
    }

    pub async fn native_balance(&self) -> std::result::Result<Decimal, ActionError> {
        match self {
            Self::Evm(client) => client.native_balance_decimal().await,
            Self::Solana(client) => client.native_balance_decimal().await,
        }
    }
}

impl ChainSession for AccountClient {
    fn context(&self) -> &ExecutionContext {
        match self {
            Self::Evm(client) => client.context(),
            Self::Solana(client) => client.context(),
        }
    }

    fn context_mut(&mut self) -> &mut ExecutionContext {
        match self {
            Self::Evm(client) => client.context_mut(),
            Self::Solana(client) => client.context_mut(),
        }
    }

    fn reconnect(&mut self) -> Result<()> {
        match self {
            Self::Evm(client) => client.reconnect(),
            Self::Solana(client) => client.reconnect(),
        }
    }
}
