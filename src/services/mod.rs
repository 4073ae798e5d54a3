pub mod route_runner;
pub mod wallet_stats;

pub use route_runner::{AccountRun, RouteRunner, RunSummary};
pub use wallet_stats::{pick_richest, AccountBalances, WalletReport, WalletStats};
