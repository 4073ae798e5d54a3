use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::actions::ACTIONS;
use crate::domain::{AccountDirectory, KeyKind, NETWORKS};
use crate::signing::{solana_address, Wallet};

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(version = "0.1.0")]
#[command(about = "Multi-account route runner with classified retry and proxy rotation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml plus $WAYFARER_ENV overrides)
    #[arg(short, long, default_value = "config", global = true)]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate every selected account's route into the progress file
    Generate,
    /// Consume the routes in the progress file
    Run,
    /// Collect native balances of all accounts and write the stats file
    Stats,
    /// Show reference-chain gas price and the gas ceiling
    Gas,
    /// Find the network where an account holds the most native token
    Richest {
        /// Account name from the accounts file
        account: String,
        /// Candidate networks (comma separated); defaults to stats.networks
        #[arg(long, value_delimiter = ',')]
        networks: Vec<String>,
    },
    /// List accounts with key kind and address
    Accounts,
    /// List supported networks
    Networks,
    /// List registered actions
    Actions,
}

pub fn print_networks() {
    println!("{:<16} {:>16}  {:<6} {:<8} {}", "NETWORK", "CHAIN ID", "TOKEN", "FEES", "RPC");
    for network in NETWORKS {
        let fees = match network.fee_model {
            crate::domain::FeeModel::Legacy => "legacy",
            crate::domain::FeeModel::Dynamic => "1559",
            crate::domain::FeeModel::NotApplicable => "-",
        };
        println!(
            "{:<16} {:>16}  {:<6} {:<8} {}",
            network.name,
            network.chain_id,
            network.token,
            fees,
            network.rpc.len()
        );
    }
}

pub fn print_actions() {
    for action in ACTIONS {
        let network = action.fixed_network.unwrap_or("slot network");
        println!("{:<16} [{}] {}", action.kind.as_str(), network, action.summary);
    }
}

/// Names, key kinds, addresses and proxies; secrets are never printed
pub fn print_accounts(directory: &AccountDirectory) {
    for (index, account) in directory.accounts().iter().enumerate() {
        let (kind, address) = match account.key_kind() {
            Ok(KeyKind::Evm) => (
                "evm",
                Wallet::from_private_key(account.secret())
                    .map(|w| w.address().to_string())
                    .unwrap_or_else(|e| format!("<{}>", e)),
            ),
            Ok(KeyKind::Solana) => (
                "solana",
                solana_address(account.secret()).unwrap_or_else(|e| format!("<{}>", e)),
            ),
            Err(e) => ("invalid", format!("<{}>", e)),
        };
        println!(
            "{:>4}  {:<20} {:<8} {:<46} {}",
            index + 1,
            account.name,
            kind,
            address,
            account.proxy.as_deref().map(redact_proxy).unwrap_or_else(|| "direct".to_string())
        );
    }
    println!("{} accounts, {} proxies in pool", directory.len(), directory.proxy_pool().len());
}

/// Hide proxy credentials: `user:pass@host:port` becomes `***@host:port`
pub fn redact_proxy(proxy: &str) -> String {
    match proxy.rsplit_once('@') {
        Some((_, host)) => format!("***@{}", host),
        None => proxy.to_string(),
    }
}
