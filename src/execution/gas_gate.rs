use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::GasConfig;
use crate::domain::KeyKind;
use crate::error::{ActionError, Result};

/// Source of the reference chain's gas price.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GasOracle: Send + Sync {
    /// Current gas price in gwei
    async fn gas_price_gwei(&self) -> std::result::Result<Decimal, ActionError>;

    /// Swap proxy and RPC endpoint after repeated poll failures. Never fails.
    fn rotate_endpoints(&mut self);
}

/// On-disk ceiling, `{ "maximum_gwei": number }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasCeiling {
    #[serde(with = "rust_decimal::serde::float")]
    pub maximum_gwei: Decimal,
}

impl GasCeiling {
    /// Read the cached ceiling, falling back to `default` on a missing or
    /// unreadable file, then write it back.
    pub async fn load_or_init(path: &Path, default: Decimal) -> Self {
        let ceiling = match tokio::fs::read_to_string(path).await {
            Ok(raw) => match serde_json::from_str::<GasCeiling>(&raw) {
                Ok(ceiling) => ceiling,
                Err(e) => {
                    warn!("Gas ceiling file {} is malformed ({}), using {}", path.display(), e, default);
                    Self { maximum_gwei: default }
                }
            },
            Err(_) => Self { maximum_gwei: default },
        };

        if let Err(e) = ceiling.save(path).await {
            warn!("Can not write gas ceiling file {}: {}", path.display(), e);
        }
        ceiling
    }

    async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}

/// Holds gas-sensitive actions until the reference chain is cheap enough.
pub struct GasGate {
    config: GasConfig,
    ceiling: OnceCell<Decimal>,
}

impl GasGate {
    pub fn new(config: GasConfig) -> Self {
        Self {
            config,
            ceiling: OnceCell::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.control
    }

    pub fn reference_network(&self) -> &str {
        &self.config.reference_network
    }

    /// Ceiling in gwei, loaded from the cache file on first use
    pub async fn ceiling(&self) -> Decimal {
        *self
            .ceiling
            .get_or_init(|| async {
                GasCeiling::load_or_init(&self.config.cache_path, self.config.maximum_gwei)
                    .await
                    .maximum_gwei
            })
            .await
    }

    /// Run `action` once gas allows. Disabled control and Solana keys skip polling.
    pub async fn run<O, F, Fut, T>(&self, key_kind: KeyKind, oracle: &mut O, action: F) -> T
    where
        O: GasOracle + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.config.control && key_kind == KeyKind::Evm {
            self.wait_for_gas(oracle).await;
        }
        action().await
    }

    /// Poll until the reference gas price is strictly below the ceiling.
    ///
    /// Poll failures never escape: every second one rotates endpoints, the
    /// others sleep `error_sleep_secs`.
    pub async fn wait_for_gas<O: GasOracle + ?Sized>(&self, oracle: &mut O) {
        let ceiling = self.ceiling().await;
        let mut failures: u32 = 0;

        loop {
            match oracle.gas_price_gwei().await {
                Ok(gwei) if gwei < ceiling => {
                    debug!("Gas is {} gwei, ceiling {}", gwei.round_dp(2), ceiling);
                    return;
                }
                Ok(gwei) => {
                    info!(
                        "Gas is too high ({} >= {} gwei). Next check in {} sec",
                        gwei.round_dp(2),
                        ceiling,
                        self.config.sleep_time_gas
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.sleep_time_gas)).await;
                }
                Err(e) => {
                    failures += 1;
                    warn!("Gas price check failed: {}", e);
                    if failures % 2 == 0 {
                        oracle.rotate_endpoints();
                    } else {
                        tokio::time::sleep(Duration::from_secs(self.config.error_sleep_secs)).await;
                    }
                }
            }
        }
    }
}
