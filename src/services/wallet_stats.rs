//! Balance scans across accounts and networks with bounded fan-out.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::adapters::AccountClient;
use crate::config::AppConfig;
use crate::domain::{network_by_name, Account, AccountDirectory, KeyKind, NetworkDescriptor};
use crate::error::{ActionError, Result};

/// Balances of one account; `None` marks a failed query
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalances {
    pub name: String,
    pub address: Option<String>,
    pub balances: BTreeMap<String, Option<Decimal>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletReport {
    pub generated_at: DateTime<Utc>,
    pub networks: Vec<String>,
    pub accounts: Vec<AccountBalances>,
    /// Sum per network over successful queries
    pub totals: BTreeMap<String, Decimal>,
}

pub struct WalletStats {
    config: AppConfig,
    directory: AccountDirectory,
}

/// Whether an account's key can hold a balance on `network`
fn key_fits(kind: KeyKind, network: &NetworkDescriptor) -> bool {
    match kind {
        KeyKind::Evm => !network.is_solana(),
        KeyKind::Solana => network.is_solana(),
    }
}

async fn query_balance(
    account: &Account,
    network: &'static NetworkDescriptor,
    proxy_pool: Arc<[String]>,
    timeout: Duration,
) -> std::result::Result<(String, Decimal), String> {
    let client = AccountClient::connect(account, network, proxy_pool, timeout).map_err(|e| e.to_string())?;
    let balance = client.native_balance().await.map_err(|e| e.to_string())?;
    Ok((client.address(), balance))
}

impl WalletStats {
    pub fn new(config: AppConfig, directory: AccountDirectory) -> Self {
        Self { config, directory }
    }

    fn networks(&self) -> Result<Vec<&'static NetworkDescriptor>> {
        self.config
            .stats
            .networks
            .iter()
            .map(|name| network_by_name(name))
            .collect()
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.general.request_timeout_secs)
    }

    /// Native balance of every account on every configured network.
    ///
    /// At most `stats.batch_size` queries are in flight; a failed query is
    /// recorded as `None` and never aborts the scan.
    pub async fn collect(&self) -> Result<WalletReport> {
        let networks = self.networks()?;
        let batch_size = self.config.stats.effective_batch_size();

        let mut jobs = Vec::new();
        for (index, account) in self.directory.accounts().iter().enumerate() {
            let kind = match account.key_kind() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(account = %account.name, "Skipping account: {}", e);
                    continue;
                }
            };
            for network in networks.iter().copied().filter(|n| key_fits(kind, n)) {
                jobs.push((index, account, network));
            }
        }

        info!(
            "Checking {} balances across {} networks ({} at a time)",
            jobs.len(),
            networks.len(),
            batch_size
        );

        let timeout = self.timeout();
        let results: Vec<_> = stream::iter(jobs)
            .map(|(index, account, network)| {
                let pool = self.directory.proxy_pool();
                async move {
                    let result = query_balance(account, network, pool, timeout).await;
                    (index, network.name, result)
                }
            })
            .buffer_unordered(batch_size)
            .collect()
            .await;

        let mut accounts: Vec<AccountBalances> = self
            .directory
            .accounts()
            .iter()
            .map(|account| AccountBalances {
                name: account.name.clone(),
                address: None,
                balances: BTreeMap::new(),
            })
            .collect();
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

        for (index, network, result) in results {
            let entry = &mut accounts[index];
            match result {
                Ok((address, balance)) => {
                    entry.address.get_or_insert(address);
                    entry.balances.insert(network.to_string(), Some(balance));
                    *totals.entry(network.to_string()).or_default() += balance;
                }
                Err(e) => {
                    warn!(account = %entry.name, network, "Balance query failed: {}", e);
                    entry.balances.insert(network.to_string(), None);
                }
            }
        }

        Ok(WalletReport {
            generated_at: Utc::now(),
            networks: networks.iter().map(|n| n.name.to_string()).collect(),
            accounts,
            totals,
        })
    }

    /// Write the report to `paths.stats_file`
    pub async fn save(&self, report: &WalletReport) -> Result<()> {
        let path = &self.config.paths.stats_file;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_string_pretty(report)?).await?;
        info!("Wallet statistics saved to {}", path.display());
        Ok(())
    }

    /// Network among `candidates` where the account holds the most native token
    pub async fn richest_network(
        &self,
        account: &Account,
        candidates: &[&'static NetworkDescriptor],
    ) -> std::result::Result<(&'static NetworkDescriptor, Decimal), ActionError> {
        let kind = account
            .key_kind()
            .map_err(|e| ActionError::Configuration(e.to_string()))?;
        let timeout = self.timeout();
        let batch_size = self.config.stats.effective_batch_size();

        let balances: Vec<(&'static NetworkDescriptor, Option<Decimal>)> = stream::iter(
            candidates.iter().copied().filter(|n| key_fits(kind, n)),
        )
        .map(|network| {
            let pool = self.directory.proxy_pool();
            async move {
                match query_balance(account, network, pool, timeout).await {
                    Ok((_, balance)) => (network, Some(balance)),
                    Err(e) => {
                        debug!(account = %account.name, network = network.name, "Balance query failed: {}", e);
                        (network, None)
                    }
                }
            }
        })
        .buffer_unordered(batch_size)
        .collect()
        .await;

        pick_richest(balances, self.config.amounts.min_amount_to_bridge)
    }
}

/// Largest known balance, rejecting all-empty results and balances under `minimum`
pub fn pick_richest(
    balances: Vec<(&'static NetworkDescriptor, Option<Decimal>)>,
    minimum: Decimal,
) -> std::result::Result<(&'static NetworkDescriptor, Decimal), ActionError> {
    let best = balances
        .into_iter()
        .filter_map(|(network, balance)| balance.map(|b| (network, b)))
        .max_by(|a, b| a.1.cmp(&b.1));

    match best {
        Some((_, balance)) if balance.is_zero() => Err(ActionError::NoRetry(
            "Insufficient balances in all networks".to_string(),
        )),
        None => Err(ActionError::NoRetry(
            "Insufficient balances in all networks".to_string(),
        )),
        Some((network, balance)) if balance < minimum => Err(ActionError::NoRetry(format!(
            "Best balance is {} {} on {}, below the {} minimum",
            balance, network.token, network.name, minimum
        ))),
        Some(found) => Ok(found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ARBITRUM, BASE, SOLANA};
    use rust_decimal_macros::dec;

    #[test]
    fn richest_network_wins() {
        let (network, balance) = pick_richest(
            vec![(&ARBITRUM, Some(dec!(0.2))), (&BASE, Some(dec!(0.5))), (&SOLANA, None)],
            dec!(0.001),
        )
        .unwrap();
        assert_eq!(network.name, "Base");
        assert_eq!(balance, dec!(0.5));
    }

    #[test]
    fn empty_or_dust_is_no_retry() {
        let all_zero = pick_richest(vec![(&ARBITRUM, Some(dec!(0))), (&BASE, None)], dec!(0.001));
        assert!(matches!(all_zero, Err(ActionError::NoRetry(ref m)) if m.contains("all networks")));

        let dust = pick_richest(vec![(&BASE, Some(dec!(0.0001)))], dec!(0.001));
        assert!(matches!(dust, Err(ActionError::NoRetry(_))));
    }

    #[test]
    fn key_kind_filters_networks() {
        assert!(key_fits(KeyKind::Evm, &BASE));
        assert!(!key_fits(KeyKind::Evm, &SOLANA));
        assert!(key_fits(KeyKind::Solana, &SOLANA));
    }

    #[tokio::test]
    async fn unknown_stats_network_is_configuration_error() {
        let mut config = AppConfig::default();
        config.stats.networks = vec!["Atlantis".into()];
        let stats = WalletStats::new(config, AccountDirectory::new(vec![]).unwrap());
        assert!(stats.collect().await.is_err());
    }

    #[tokio::test]
    async fn empty_directory_gives_empty_report() {
        let stats = WalletStats::new(AppConfig::default(), AccountDirectory::new(vec![]).unwrap());
        let report = stats.collect().await.unwrap();
        assert!(report.accounts.is_empty());
        assert!(report.totals.is_empty());
        assert_eq!(report.networks, vec!["Ethereum", "BeraChain"]);
    }
}
