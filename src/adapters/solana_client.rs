use ::solana_rpc_client::http_sender::HttpSender;
use ::solana_client::nonblocking::rpc_client::RpcClient;
use ::solana_client::rpc_client::RpcClientConfig;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::http::build_http_client;
use crate::domain::{Account, KeyKind, NetworkDescriptor, SOLANA};
use crate::error::{ActionError, Result, WayfarerError};
use crate::execution::{ChainSession, ExecutionContext};
use crate::signing::solana::solana_keypair;

/// Solana RPC client for one account
pub struct SolanaClient {
    ctx: ExecutionContext,
    pubkey: Pubkey,
    address: String,
    timeout: Duration,
    rpc: RpcClient,
}

/// Nonblocking RPC client on the context's current endpoint and proxy
fn connect(ctx: &ExecutionContext, timeout: Duration) -> Result<RpcClient> {
    let http = build_http_client(ctx.proxy(), timeout)?;
    let sender = HttpSender::new_with_client(ctx.rpc_url(), http);
    Ok(RpcClient::new_sender(sender, RpcClientConfig::default()))
}

impl SolanaClient {
    pub fn new(account: &Account, proxy_pool: Arc<[String]>, timeout: Duration) -> Result<Self> {
        if account.key_kind()? != KeyKind::Solana {
            return Err(WayfarerError::Configuration(format!(
                "Account \"{}\" does not hold a Solana key",
                account.name
            )));
        }
        let pubkey = solana_keypair(account.secret())?.pubkey();
        let ctx = ExecutionContext::new(account, &SOLANA, proxy_pool);
        let rpc = connect(&ctx, timeout)?;

        Ok(Self {
            ctx,
            pubkey,
            address: pubkey.to_string(),
            timeout,
            rpc,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network(&self) -> &'static NetworkDescriptor {
        self.ctx.network()
    }

    pub fn rpc_url(&self) -> String {
        self.rpc.url()
    }

    /// Balance in lamports
    pub async fn native_balance(&self) -> std::result::Result<u64, ActionError> {
        Ok(self.rpc.get_balance(&self.pubkey).await?)
    }

    pub async fn native_balance_decimal(&self) -> std::result::Result<Decimal, ActionError> {
        let lamports = self.native_balance().await?;
        Ok(Decimal::from_i128_with_scale(lamports as i128, self.network().decimals as u32))
    }
}

impl ChainSession for SolanaClient {
    fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    fn reconnect(&mut self) -> Result<()> {
        self.rpc = connect(&self.ctx, self.timeout)?;
        debug!(account = %self.ctx.account(), rpc = %self.rpc.url(), "Solana client rebuilt");
        Ok(())
    }
}
