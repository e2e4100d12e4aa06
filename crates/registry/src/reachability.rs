use std::future::Future;
use std::time::Duration;

use config_seed_config::RegistryConfig;
use tracing::{info, warn};

use crate::{RegistryError, Result};

/// Bounded, fixed-delay polling budget for waiting on the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachabilityPolicy {
    fail_limit: u32,
    wait: Duration,
}

impl ReachabilityPolicy {
    pub fn new(fail_limit: u32, wait: Duration) -> Self {
        Self { fail_limit, wait }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.fail_limit, config.fail_wait_time())
    }

    pub fn fail_limit(&self) -> u32 {
        self.fail_limit
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

impl Default for ReachabilityPolicy {
    fn default() -> Self {
        Self::new(30, Duration::from_secs(3))
    }
}

/// Calls `probe` until it succeeds or `fail_limit` attempts have failed,
/// sleeping `wait` between attempts. Returns the number of attempts made.
pub async fn wait_until_reachable<F, Fut>(policy: &ReachabilityPolicy, mut probe: F) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut failures = 0;
    loop {
        match probe().await {
            Ok(()) => {
                let attempts = failures + 1;
                info!(attempts, "registry is reachable");
                return Ok(attempts);
            }
            Err(e) => {
                failures += 1;
                warn!(
                    attempt = failures,
                    fail_limit = policy.fail_limit,
                    error = %e,
                    "registry not reachable"
                );
                if failures >= policy.fail_limit {
                    return Err(RegistryError::Unreachable { attempts: failures });
                }
                tokio::time::sleep(policy.wait).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_reachable_first_try() {
        let policy = ReachabilityPolicy::new(3, Duration::ZERO);
        let attempts = wait_until_reachable(&policy, || async { Ok::<(), RegistryError>(()) })
            .await
            .unwrap();
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_reachable_after_failures() {
        let policy = ReachabilityPolicy::new(5, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let attempts = wait_until_reachable(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(RegistryError::Unavailable("connection refused".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unreachable_after_fail_limit() {
        let policy = ReachabilityPolicy::new(4, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = wait_until_reachable(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(RegistryError::Status {
                    status: 503,
                    body: String::new(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(RegistryError::Unreachable { attempts: 4 })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_policy_from_config() {
        let config = RegistryConfig {
            fail_limit: 7,
            fail_wait_time_secs: 2,
            ..Default::default()
        };
        let policy = ReachabilityPolicy::from_config(&config);
        assert_eq!(policy.fail_limit(), 7);
        assert_eq!(policy.wait(), Duration::from_secs(2));
    }
}
