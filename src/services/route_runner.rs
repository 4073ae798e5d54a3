//! Plan consumer: walks every account's persisted route step by step.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::actions::{instantiate, resolve_action};
use crate::adapters::EvmClient;
use crate::config::AppConfig;
use crate::domain::{network_by_name, Account, AccountDirectory, ActionPlan, KeyKind};
use crate::error::{Result, WayfarerError};
use crate::execution::{sleep_in_range, GasGate, Outcome, ResilientExecutor, RetryPolicy};
use crate::planning::ProgressStore;

/// How one account's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRun {
    /// Every step is done
    Finished,
    /// A step failed; the cursor stays on it for the next run
    Stopped,
    /// Shutdown was requested between steps
    Interrupted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub finished: usize,
    pub stopped: usize,
    /// Accounts dropped by an account-fatal error
    pub fatal: usize,
    pub steps_completed: usize,
}

pub struct RouteRunner {
    config: AppConfig,
    directory: AccountDirectory,
    store: ProgressStore,
    executor: ResilientExecutor,
    gas_gate: GasGate,
}

impl RouteRunner {
    pub fn new(config: AppConfig, directory: AccountDirectory) -> Self {
        let store = ProgressStore::new(config.paths.progress_file.clone());
        let executor = ResilientExecutor::new(RetryPolicy::from(&config.general));
        let gas_gate = GasGate::new(config.gas.clone());
        Self {
            config,
            directory,
            store,
            executor,
            gas_gate,
        }
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Consume every unfinished plan in the progress file, one account at a time.
    ///
    /// Account-fatal errors end only that account; anything else aborts the batch.
    pub async fn run(&self, stop: watch::Receiver<bool>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if self.store.is_empty().await? {
            warn!("Progress file is empty, generate routes first");
            return Ok(summary);
        }

        let progress = self.store.load().await?;
        let pending: Vec<(String, ActionPlan)> = progress
            .iter()
            .filter(|(_, plan)| !plan.is_complete())
            .map(|(name, plan)| (name.to_string(), plan.clone()))
            .collect();

        info!("{} accounts with unfinished routes", pending.len());

        for (index, (name, plan)) in pending.iter().enumerate() {
            if *stop.borrow() {
                warn!("Shutdown requested, stopping before account {}", name);
                break;
            }

            let Some(account) = self.directory.get(name) else {
                warn!(account = %name, "Account is not in the accounts file, skipping");
                continue;
            };

            let mut steps = 0;
            match self.run_account(account, plan.clone(), &stop, &mut steps).await {
                Ok(AccountRun::Finished) => summary.finished += 1,
                Ok(AccountRun::Stopped) => summary.stopped += 1,
                Ok(AccountRun::Interrupted) => {
                    summary.steps_completed += steps;
                    break;
                }
                Err(e) if e.is_account_fatal() => {
                    error!(account = %name, "Account stopped: {}", e);
                    summary.fatal += 1;
                }
                Err(e) => return Err(e),
            }
            summary.steps_completed += steps;

            if index + 1 < pending.len() && !*stop.borrow() {
                self.pause(self.config.general.sleep_time_accounts, &stop).await;
            }
        }

        info!(
            "Run finished: {} completed, {} stopped, {} failed fatally, {} steps done",
            summary.finished, summary.stopped, summary.fatal, summary.steps_completed
        );
        Ok(summary)
    }

    async fn run_account(
        &self,
        account: &Account,
        mut plan: ActionPlan,
        stop: &watch::Receiver<bool>,
        steps: &mut usize,
    ) -> Result<AccountRun> {
        if account.key_kind()? != KeyKind::Evm {
            return Err(WayfarerError::Configuration(format!(
                "Account \"{}\" holds a non-EVM key; route actions need an EVM key",
                account.name
            )));
        }

        while let Some(step) = plan.current().cloned() {
            if *stop.borrow() {
                return Ok(AccountRun::Interrupted);
            }

            info!(
                account = %account.name,
                action = %step.action,
                network = %step.network,
                "Step {}/{}",
                plan.current_step + 1,
                plan.route.len()
            );

            let descriptor = resolve_action(&step.action)?;
            let network = network_by_name(&step.network)?;
            let action = instantiate(descriptor.kind, &self.config.amounts, account);
            let timeout = Duration::from_secs(self.config.general.request_timeout_secs);

            let mut client = EvmClient::new(account, network, self.directory.proxy_pool(), timeout)?;
            let outcome = if descriptor.gas_sensitive {
                let reference = network_by_name(self.gas_gate.reference_network())?;
                let mut oracle = client.for_network(reference)?;
                // Lazy: nothing runs until the gate lets it through
                let attempt = self.executor.run(&mut client, action.as_ref());
                self.gas_gate.run(KeyKind::Evm, &mut oracle, || attempt).await?
            } else {
                self.executor.run(&mut client, action.as_ref()).await?
            };

            match outcome {
                Outcome::Completed(_) | Outcome::AlreadySatisfied => {
                    plan = self.store.advance(&account.name).await?;
                    *steps += 1;
                    if !plan.is_complete() {
                        self.pause(self.config.general.sleep_time_modules, stop).await;
                    }
                }
                Outcome::Failed => {
                    warn!(
                        account = %account.name,
                        action = %step.action,
                        "Step failed, route stays at step {}",
                        plan.current_step + 1
                    );
                    return Ok(AccountRun::Stopped);
                }
            }
        }

        Ok(AccountRun::Finished)
    }

    /// Random sleep that ends early on shutdown
    async fn pause(&self, range: (u64, u64), stop: &watch::Receiver<bool>) {
        let mut stop = stop.clone();
        tokio::select! {
            _ = sleep_in_range(range) => {}
            _ = stop.wait_for(|stopped| *stopped) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanStep;
    use crate::planning::Progress;

    const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.general.sleep_time_accounts = (0, 0);
        config.general.sleep_time_modules = (0, 0);
        config.general.sleep_time_retry = (0, 0);
        config.paths.progress_file = std::env::temp_dir()
            .join(format!("wayfarer-run-{}", uuid::Uuid::new_v4()))
            .join("wallets_progress.json");
        config
    }

    #[tokio::test]
    async fn empty_progress_file_runs_nothing() {
        let directory = AccountDirectory::new(vec![]).unwrap();
        let runner = RouteRunner::new(config(), directory);
        let (_tx, rx) = watch::channel(false);
        assert_eq!(runner.run(rx).await.unwrap(), RunSummary::default());
    }

    #[tokio::test]
    async fn account_fatal_errors_do_not_abort_the_batch() {
        let solana = Account::new(
            "sol",
            solana_sdk::signature::Keypair::new().to_base58_string(),
            None,
            None,
        );
        let typo = Account::new("typo", EVM_KEY, None, None);
        let directory = AccountDirectory::new(vec![solana, typo]).unwrap();
        let runner = RouteRunner::new(config(), directory);

        let mut progress = Progress::new();
        progress.insert("sol", ActionPlan::new(vec![PlanStep::new("wrap_native", "BeraChain")]));
        progress.insert("ghost", ActionPlan::new(vec![PlanStep::new("wrap_native", "BeraChain")]));
        progress.insert("typo", ActionPlan::new(vec![PlanStep::new("wrap_nativ", "BeraChain")]));
        progress.insert("done", ActionPlan {
            current_step: 1,
            route: vec![PlanStep::new("wrap_native", "BeraChain")],
        });
        runner.store().save_all(&progress).await.unwrap();

        let (_tx, rx) = watch::channel(false);
        let summary = runner.run(rx).await.unwrap();
        assert_eq!(summary.fatal, 2);
        assert_eq!(summary.finished, 0);
        assert_eq!(summary.steps_completed, 0);
    }

    #[tokio::test]
    async fn stop_before_first_account() {
        let typo = Account::new("typo", EVM_KEY, None, None);
        let directory = AccountDirectory::new(vec![typo]).unwrap();
        let runner = RouteRunner::new(config(), directory);

        let mut progress = Progress::new();
        progress.insert("typo", ActionPlan::new(vec![PlanStep::new("wrap_nativ", "BeraChain")]));
        runner.store().save_all(&progress).await.unwrap();

        let (_tx, rx) = watch::channel(true);
        assert_eq!(runner.run(rx).await.unwrap(), RunSummary::default());
    }
}
