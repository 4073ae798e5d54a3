use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::context::{ChainSession, FailureKind};
use super::sleep_in_range;
use crate::config::GeneralConfig;
use crate::error::{ActionError, Result, WayfarerError};

/// One unit of work run against a chain session.
#[async_trait]
pub trait Action<S: Send + Sync>: Send + Sync {
    type Output: Send;

    /// Canonical action name used in logs
    fn name(&self) -> &str;

    async fn execute(&self, session: &S) -> std::result::Result<Self::Output, ActionError>;
}

/// Result of a resilient run that did not end the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// The desired end state already held
    AlreadySatisfied,
    /// Retry budget exhausted or a no-retry classification
    Failed,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::AlreadySatisfied)
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Retry policy for the executor
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first (R)
    pub maximum_retry: u32,
    /// Backoff bounds in seconds
    pub sleep_time_retry: (u64, u64),
    /// Proxy-exhaustion ceiling (P)
    pub proxy_replacement_count: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&GeneralConfig::default())
    }
}

impl From<&GeneralConfig> for RetryPolicy {
    fn from(general: &GeneralConfig) -> Self {
        Self {
            maximum_retry: general.maximum_retry,
            sleep_time_retry: general.sleep_time_retry,
            proxy_replacement_count: general.proxy_replacement_count,
        }
    }
}

/// What the executor does after classifying a failure
enum Recovery {
    Backoff,
    RotateProxy { sleep: bool },
    RotateRpc,
}

/// Runs actions with classified retry, proxy rotation and RPC rotation.
pub struct ResilientExecutor {
    policy: RetryPolicy,
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `action` until it succeeds, is classified as terminal, or the
    /// budget of `maximum_retry + 1` attempts is spent.
    ///
    /// Eligibility and configuration failures, and the proxy-exhaustion
    /// guard, are returned as errors so the batch loop can drop the account.
    pub async fn run<S, A>(&self, session: &mut S, action: &A) -> Result<Outcome<A::Output>>
    where
        S: ChainSession,
        A: Action<S> + ?Sized,
    {
        let max_attempts = self.policy.maximum_retry.saturating_add(1);
        let mut rotations: u32 = 0;
        session.context_mut().begin_operation();

        loop {
            let attempt = session.context_mut().record_attempt();
            let account = session.context().account().to_string();
            let network = session.context().network().name;

            debug!(
                account = %account,
                action = action.name(),
                network,
                attempt,
                "Attempt {}/{}",
                attempt,
                max_attempts
            );

            let err = match action.execute(session).await {
                Ok(value) => {
                    info!(account = %account, action = action.name(), network, attempt, "Action completed");
                    return Ok(Outcome::Completed(value));
                }
                Err(err) => err,
            };

            session.context_mut().record_failure(FailureKind::from(&err));

            let recovery = match err {
                ActionError::MissingParameter(_) => {
                    error!(account = %account, action = action.name(), network, attempt, "{}", err);
                    return Ok(Outcome::Failed);
                }
                ActionError::AlreadySatisfied(reason) => {
                    warn!(account = %account, action = action.name(), network, attempt, "{}", reason);
                    return Ok(Outcome::AlreadySatisfied);
                }
                ActionError::NoRetry(reason) => {
                    error!(account = %account, action = action.name(), network, attempt, "{}", reason);
                    return Ok(Outcome::Failed);
                }
                ActionError::Eligibility(reason) => {
                    error!(account = %account, action = action.name(), network, attempt, "Not eligible: {}", reason);
                    return Err(WayfarerError::Eligibility { account, reason });
                }
                ActionError::Configuration(reason) => {
                    error!(account = %account, action = action.name(), network, attempt, "{}", reason);
                    return Err(WayfarerError::Configuration(reason));
                }
                ActionError::InsufficientFunds(_) | ActionError::GasShortfall(_) => {
                    warn!(account = %account, action = action.name(), network, attempt, "{}", err);
                    Recovery::Backoff
                }
                ActionError::ProxyRequested(ref reason) => {
                    warn!(account = %account, action = action.name(), network, attempt, "Proxy change requested: {}", reason);
                    Recovery::RotateProxy { sleep: true }
                }
                ActionError::Transport { fault, ref detail } => {
                    error!(
                        account = %account,
                        action = action.name(),
                        network,
                        attempt,
                        "{}: {}",
                        fault.describe(),
                        detail
                    );
                    Recovery::RotateProxy { sleep: false }
                }
                ActionError::Node(_) | ActionError::ContractReverted(_) => {
                    error!(account = %account, action = action.name(), network, attempt, "{}", err);
                    Recovery::RotateRpc
                }
                ActionError::Software(_) => {
                    error!(account = %account, action = action.name(), network, attempt, "Software error: {}", err);
                    Recovery::Backoff
                }
                ActionError::Unknown(_) => {
                    error!(account = %account, action = action.name(), network, attempt, "{}", err);
                    Recovery::Backoff
                }
            };

            let sleep = match recovery {
                Recovery::Backoff => true,
                Recovery::RotateProxy { sleep } => {
                    self.guard_rotation(&account, &mut rotations)?;
                    session.change_proxy()?;
                    sleep
                }
                Recovery::RotateRpc => {
                    self.guard_rotation(&account, &mut rotations)?;
                    session.change_rpc()?;
                    true
                }
            };

            if attempt >= max_attempts {
                error!(
                    account = %account,
                    action = action.name(),
                    network,
                    attempt,
                    "Tries are over, software will stop module"
                );
                return Ok(Outcome::Failed);
            }

            if sleep {
                sleep_in_range(self.policy.sleep_time_retry).await;
            }
        }
    }

    /// Count a rotation-triggering failure; every second one counts toward
    /// the ceiling, which fires on the `2P`-th failure.
    fn guard_rotation(&self, account: &str, rotations: &mut u32) -> Result<()> {
        *rotations += 1;
        let ceiling = self.policy.proxy_replacement_count;
        if *rotations % 2 == 0 && *rotations / 2 >= ceiling {
            error!(account = %account, "Can not find a good proxy {} times", ceiling);
            return Err(WayfarerError::NoWorkingProxy {
                account: account.to_string(),
                ceiling,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, ARBITRUM_NOVA};
    use crate::error::TransportFault;
    use crate::execution::ExecutionContext;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeSession {
        ctx: ExecutionContext,
        reconnects: u32,
    }

    impl FakeSession {
        fn new() -> Self {
            let account = Account::new(
                "acc-1",
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
                Some("p1:80".into()),
                None,
            );
            let pool: Arc<[String]> = vec!["p1:80".to_string(), "p2:80".to_string()].into();
            Self {
                ctx: ExecutionContext::new(&account, &ARBITRUM_NOVA, pool),
                reconnects: 0,
            }
        }
    }

    impl ChainSession for FakeSession {
        fn context(&self) -> &ExecutionContext {
            &self.ctx
        }

        fn context_mut(&mut self) -> &mut ExecutionContext {
            &mut self.ctx
        }

        fn reconnect(&mut self) -> Result<()> {
            self.reconnects += 1;
            Ok(())
        }
    }

    /// Replays a script of results, then keeps failing with the last error.
    struct Scripted {
        script: Mutex<Vec<std::result::Result<u32, ActionError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut script: Vec<std::result::Result<u32, ActionError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Action<FakeSession> for Scripted {
        type Output = u32;

        fn name(&self) -> &str {
            "scripted"
        }

        async fn execute(&self, _session: &FakeSession) -> std::result::Result<u32, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script.last().cloned().unwrap()
            }
        }
    }

    fn executor(retry: u32, ceiling: u32) -> ResilientExecutor {
        ResilientExecutor::new(RetryPolicy {
            maximum_retry: retry,
            sleep_time_retry: (0, 0),
            proxy_replacement_count: ceiling,
        })
    }

    #[tokio::test]
    async fn success_after_transient_failures() {
        let mut session = FakeSession::new();
        let action = Scripted::new(vec![
            Err(ActionError::Unknown("boom".into())),
            Err(ActionError::InsufficientFunds("low".into())),
            Ok(7),
        ]);
        let outcome = executor(3, 3).run(&mut session, &action).await.unwrap();
        assert_eq!(outcome, Outcome::Completed(7));
        assert_eq!(action.calls(), 3);
        assert_eq!(
            session.ctx.history(),
            &[FailureKind::Unknown, FailureKind::InsufficientFunds]
        );
    }

    #[tokio::test]
    async fn already_satisfied_counts_as_success() {
        let mut session = FakeSession::new();
        let action = Scripted::new(vec![Err(ActionError::AlreadySatisfied("claimed".into()))]);
        let outcome = executor(3, 3).run(&mut session, &action).await.unwrap();
        assert_eq!(outcome, Outcome::AlreadySatisfied);
        assert!(outcome.is_success());
        assert_eq!(action.calls(), 1);
    }

    #[tokio::test]
    async fn missing_parameter_fails_without_retry() {
        let mut session = FakeSession::new();
        let action = Scripted::new(vec![Err(ActionError::MissingParameter("transfer_address".into()))]);
        let outcome = executor(5, 3).run(&mut session, &action).await.unwrap();
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(action.calls(), 1);
    }

    #[tokio::test]
    async fn eligibility_propagates() {
        let mut session = FakeSession::new();
        let action = Scripted::new(vec![Err(ActionError::Eligibility("no allocation".into()))]);
        let err = executor(5, 3).run(&mut session, &action).await.unwrap_err();
        assert!(err.is_account_fatal());
        assert!(matches!(err, WayfarerError::Eligibility { ref account, .. } if account == "acc-1"));
    }

    #[tokio::test]
    async fn node_errors_rotate_rpc() {
        let mut session = FakeSession::new();
        let first_rpc = session.ctx.rpc_url().to_string();
        let action = Scripted::new(vec![Err(ActionError::Node("nonce too low".into())), Ok(1)]);
        let outcome = executor(3, 10).run(&mut session, &action).await.unwrap();
        assert_eq!(outcome, Outcome::Completed(1));
        assert_ne!(session.ctx.rpc_url(), first_rpc);
        assert_eq!(session.reconnects, 1);
    }

    #[tokio::test]
    async fn transport_errors_rotate_proxy() {
        let mut session = FakeSession::new();
        let action = Scripted::new(vec![
            Err(ActionError::transport(TransportFault::Status(502), "bad gateway")),
            Ok(1),
        ]);
        executor(3, 10).run(&mut session, &action).await.unwrap();
        assert_eq!(session.ctx.proxy(), Some("p2:80"));
    }
}
