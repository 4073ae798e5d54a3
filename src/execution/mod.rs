//! Resilient execution of chain actions
//!
//! - `context`: per-operation state and the rotation seam (`ChainSession`)
//! - `executor`: classified retry with proxy/RPC rotation
//! - `gas_gate`: holds EVM actions until reference-chain gas is acceptable

pub mod context;
pub mod executor;
pub mod gas_gate;

pub use context::{ChainSession, ExecutionContext, FailureKind};
pub use executor::{Action, Outcome, ResilientExecutor, RetryPolicy};
pub use gas_gate::{GasCeiling, GasGate, GasOracle};

use rand::Rng;
use std::time::Duration;

/// Sleep a random number of seconds within `[min, max]`.
pub async fn sleep_in_range((min, max): (u64, u64)) {
    let secs = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    if secs > 0 {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}
