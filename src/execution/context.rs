//! Per-operation runtime state and the rotation seam every chain client implements.

use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Account, NetworkDescriptor};
use crate::error::{ActionError, Result};

/// Classification recorded for every failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MissingParameter,
    AlreadySatisfied,
    NoRetry,
    Eligibility,
    Configuration,
    InsufficientFunds,
    GasShortfall,
    ProxyRequested,
    Transport,
    Node,
    ContractReverted,
    Software,
    Unknown,
}

impl From<&ActionError> for FailureKind {
    fn from(err: &ActionError) -> Self {
        match err {
            ActionError::MissingParameter(_) => Self::MissingParameter,
            ActionError::AlreadySatisfied(_) => Self::AlreadySatisfied,
            ActionError::NoRetry(_) => Self::NoRetry,
            ActionError::Eligibility(_) => Self::Eligibility,
            ActionError::Configuration(_) => Self::Configuration,
            ActionError::InsufficientFunds(_) => Self::InsufficientFunds,
            ActionError::GasShortfall(_) => Self::GasShortfall,
            ActionError::ProxyRequested(_) => Self::ProxyRequested,
            ActionError::Transport { .. } => Self::Transport,
            ActionError::Node(_) => Self::Node,
            ActionError::ContractReverted(_) => Self::ContractReverted,
            ActionError::Software(_) => Self::Software,
            ActionError::Unknown(_) => Self::Unknown,
        }
    }
}

/// Mutable state of one in-flight operation for one account.
///
/// The current proxy is always taken from `proxy_pool` and the current RPC
/// endpoint from the network's endpoint list; rotation never leaves them.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    account: String,
    network: &'static NetworkDescriptor,
    proxy_pool: Arc<[String]>,
    proxy: Option<String>,
    rpc_url: String,
    attempts: u32,
    history: Vec<FailureKind>,
}

impl ExecutionContext {
    pub fn new(
        account: &Account,
        network: &'static NetworkDescriptor,
        proxy_pool: Arc<[String]>,
    ) -> Self {
        let mut rng = rand::thread_rng();
        let proxy = account
            .proxy
            .clone()
            .filter(|p| proxy_pool.contains(p))
            .or_else(|| proxy_pool.choose(&mut rng).cloned());
        let rpc_url = network
            .rpc
            .choose(&mut rng)
            .map(|url| url.to_string())
            .unwrap_or_default();

        Self {
            account: account.name.clone(),
            network,
            proxy_pool,
            proxy,
            rpc_url,
            attempts: 0,
            history: Vec::new(),
        }
    }

    /// Same account and proxy, different network
    pub fn for_network(&self, network: &'static NetworkDescriptor) -> Self {
        let rpc_url = network
            .rpc
            .choose(&mut rand::thread_rng())
            .map(|url| url.to_string())
            .unwrap_or_default();

        Self {
            account: self.account.clone(),
            network,
            proxy_pool: Arc::clone(&self.proxy_pool),
            proxy: self.proxy.clone(),
            rpc_url,
            attempts: 0,
            history: Vec::new(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn network(&self) -> &'static NetworkDescriptor {
        self.network
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn proxy_url(&self) -> Option<String> {
        self.proxy.as_ref().map(|p| {
            if p.contains("://") {
                p.clone()
            } else {
                format!("http://{}", p)
            }
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn history(&self) -> &[FailureKind] {
        &self.history
    }

    pub(crate) fn begin_operation(&mut self) {
        self.attempts = 0;
        self.history.clear();
    }

    pub(crate) fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub(crate) fn record_failure(&mut self, kind: FailureKind) {
        self.history.push(kind);
    }

    /// Swap to another proxy from the pool. Returns false when no other proxy exists.
    pub fn rotate_proxy(&mut self) -> bool {
        warn!(
            account = %self.account,
            "Trying to replace old proxy: {}",
            self.proxy.as_deref().unwrap_or("<none>")
        );

        let fresh: Vec<&String> = self
            .proxy_pool
            .iter()
            .filter(|p| Some(p.as_str()) != self.proxy.as_deref())
            .collect();

        match fresh.choose(&mut rand::thread_rng()) {
            Some(proxy) => {
                self.proxy = Some((*proxy).clone());
                info!(account = %self.account, "Proxy successfully replaced. New proxy: {}", proxy);
                true
            }
            None => {
                warn!(
                    account = %self.account,
                    "All proxies were used, please add more proxies to the accounts file"
                );
                false
            }
        }
    }

    /// Swap to another RPC endpoint of the same network.
    pub fn rotate_rpc(&mut self) -> bool {
        warn!(account = %self.account, "Trying to replace old RPC: {}", self.rpc_url);

        let fresh: Vec<&&str> = self
            .network
            .rpc
            .iter()
            .filter(|url| **url != self.rpc_url)
            .collect();

        match fresh.choose(&mut rand::thread_rng()) {
            Some(url) => {
                self.rpc_url = url.to_string();
                info!(account = %self.account, "RPC successfully replaced. New RPC: {}", url);
                true
            }
            None => {
                warn!(
                    account = %self.account,
                    "{} has only 1 RPC, no replacement is possible",
                    self.network.name
                );
                false
            }
        }
    }
}

/// A chain client bound to one account whose endpoints can be rotated.
pub trait ChainSession: Send + Sync {
    fn context(&self) -> &ExecutionContext;

    fn context_mut(&mut self) -> &mut ExecutionContext;

    /// Rebuild transports after the context's proxy or RPC endpoint changed
    fn reconnect(&mut self) -> Result<()>;

    fn change_proxy(&mut self) -> Result<bool> {
        if self.context_mut().rotate_proxy() {
            self.reconnect()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn change_rpc(&mut self) -> Result<bool> {
        if self.context_mut().rotate_rpc() {
            self.reconnect()?;
            return Ok(true);
        }
        Ok(false)
    }
}
