pub mod actions;
pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod execution;
pub mod planning;
pub mod services;
pub mod signing;

pub use actions::{resolve_action, ActionKind, ACTIONS};
pub use adapters::{AccountClient, EvmClient, SolanaClient};
pub use config::AppConfig;
pub use domain::{network_by_name, Account, AccountDirectory, ActionPlan, KeyKind, PlanStep, NETWORKS};
pub use error::{ActionError, Result, TransportFault, WayfarerError};
pub use execution::{
    Action, ChainSession, ExecutionContext, GasGate, GasOracle, Outcome, ResilientExecutor,
    RetryPolicy,
};
pub use planning::{regenerate_progress, Progress, ProgressStore, RouteGenerator};
pub use services::{RouteRunner, RunSummary, WalletStats};
pub use signing::Wallet;
