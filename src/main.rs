use clap::Parser;
use std::time::Duration;
use tracing::{info, info_span, Instrument};
use wayfarer::adapters::EvmClient;
use wayfarer::cli::{self, Cli, Commands};
use wayfarer::config::AppConfig;
use wayfarer::domain::{network_by_name, AccountDirectory, KeyKind, NetworkDescriptor};
use wayfarer::error::{Result, WayfarerError};
use wayfarer::execution::{GasGate, GasOracle};
use wayfarer::planning::{regenerate_progress, ProgressStore};
use wayfarer::services::{RouteRunner, WalletStats};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple, stop_on_signal};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    config.validate().map_err(WayfarerError::Configuration)?;

    match cli.command {
        Commands::Networks => {
            init_logging_simple();
            cli::print_networks();
        }
        Commands::Actions => {
            init_logging_simple();
            cli::print_actions();
        }
        Commands::Accounts => {
            init_logging_simple();
            let directory = load_directory(&config)?;
            cli::print_accounts(&directory);
        }
        Commands::Generate => {
            init_logging(&config.logging);
            let directory = load_directory(&config)?;
            let store = ProgressStore::new(config.paths.progress_file.clone());
            let span = info_span!("generate", run_id = %uuid::Uuid::new_v4());
            regenerate_progress(&config, &directory, &store)
                .instrument(span)
                .await?;
        }
        Commands::Run => {
            init_logging(&config.logging);
            let directory = load_directory(&config)?;
            let stop = stop_on_signal();
            let runner = RouteRunner::new(config, directory);
            let span = info_span!("run", run_id = %uuid::Uuid::new_v4());
            let summary = runner.run(stop).instrument(span).await?;
            println!(
                "finished: {}  stopped: {}  fatal: {}  steps: {}",
                summary.finished, summary.stopped, summary.fatal, summary.steps_completed
            );
        }
        Commands::Stats => {
            init_logging(&config.logging);
            let directory = load_directory(&config)?;
            let stats = WalletStats::new(config, directory);
            let span = info_span!("stats", run_id = %uuid::Uuid::new_v4());
            async {
                let report = stats.collect().await?;
                stats.save(&report).await?;
                for (network, total) in &report.totals {
                    info!("{}: {} in total", network, total);
                }
                Ok::<_, WayfarerError>(())
            }
            .instrument(span)
            .await?;
        }
        Commands::Gas => {
            init_logging_simple();
            show_gas(&config).await?;
        }
        Commands::Richest { account, networks } => {
            init_logging(&config.logging);
            let directory = load_directory(&config)?;
            let target = directory.get(&account).cloned().ok_or_else(|| {
                WayfarerError::Configuration(format!("Unknown account \"{}\"", account))
            })?;
            let names = if networks.is_empty() {
                config.stats.networks.clone()
            } else {
                networks
            };
            let candidates = names
                .iter()
                .map(|name| network_by_name(name))
                .collect::<Result<Vec<&'static NetworkDescriptor>>>()?;

            let stats = WalletStats::new(config, directory);
            let (network, balance) = stats.richest_network(&target, &candidates).await?;
            println!("{}: {} {} on {}", target.name, balance, network.token, network.name);
        }
    }

    Ok(())
}

fn load_directory(config: &AppConfig) -> Result<AccountDirectory> {
    AccountDirectory::load(&config.paths.accounts_file, config.general.use_proxy)
}

/// Reference-chain gas through the first EVM account's proxy
async fn show_gas(config: &AppConfig) -> Result<()> {
    let directory = load_directory(config)?;
    let account = directory
        .accounts()
        .iter()
        .find(|account| matches!(account.key_kind(), Ok(KeyKind::Evm)))
        .ok_or_else(|| WayfarerError::Configuration("No EVM account in the accounts file".into()))?;

    let gate = GasGate::new(config.gas.clone());
    let network = network_by_name(gate.reference_network())?;
    let client = EvmClient::new(
        account,
        network,
        directory.proxy_pool(),
        Duration::from_secs(config.general.request_timeout_secs),
    )?;

    let gwei = client.gas_price_gwei().await?;
    let ceiling = gate.ceiling().await;
    println!(
        "{} gas: {} gwei (ceiling {} gwei, control {})",
        network.name,
        gwei.round_dp(3),
        ceiling,
        if gate.is_enabled() { "on" } else { "off" }
    );
    Ok(())
}
