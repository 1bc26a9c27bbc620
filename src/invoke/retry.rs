use std::time::Duration;

use crate::core::Reference;
use crate::error::LocalException;

/// The at-most-once retry decision procedure.
///
/// Classification already happened by the time the policy runs: the caller
/// only offers failures that are safe to repeat. The policy bounds the
/// number of attempts with its interval table, one entry per permitted
/// retry.
#[derive(Debug)]
pub(crate) struct RetryPolicy {
  intervals: Vec<Duration>,
}

impl RetryPolicy {
  pub(crate) fn new(intervals: Vec<Duration>) -> Self {
    Self { intervals }
  }

  /// Decides whether the invocation may try again.
  ///
  /// Increments `cnt` and returns the delay before the next attempt, or
  /// the original exception once the attempt cap is exceeded. A stale
  /// indirect binding additionally drops its locator cache entry so the
  /// next attempt resolves afresh.
  pub(crate) fn check_retry(
    &self,
    exception: &LocalException,
    reference: &Reference,
    cnt: &mut u32,
  ) -> Result<Duration, LocalException> {
    if exception.is_not_exist() && reference.is_indirect() {
      if let Some(info) = reference.locator_info() {
        info.clear_cache(reference);
      }
    }

    *cnt += 1;

    let limit: u32 = self.intervals.len() as u32;

    if *cnt > limit {
      tracing::debug!(
        attempt = *cnt,
        limit,
        exception = %exception,
        "retry limit reached, propagating",
      );

      return Err(exception.clone());
    }

    let interval: Duration = self.intervals[(*cnt - 1) as usize];

    tracing::debug!(
      attempt = *cnt,
      limit,
      delay_ms = interval.as_millis() as u64,
      exception = %exception,
      "retrying invocation",
    );

    Ok(interval)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::core::Endpoint;
  use crate::core::Identity;
  use crate::core::Reference;
  use crate::core::Transport;
  use crate::error::LocalException;
  use crate::invoke::retry::RetryPolicy;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;

  fn reference() -> Reference {
    Runtime::new(RuntimeConfig::default())
      .proxy_from_string("account : tcp -h node1 -p 4061")
      .unwrap()
      .reference()
      .clone()
  }

  #[test]
  fn test_intervals_select_by_attempt() {
    let policy: RetryPolicy =
      RetryPolicy::new(vec![Duration::ZERO, Duration::from_millis(100)]);
    let reference: Reference = reference();
    let mut cnt: u32 = 0;

    let first: Duration = policy
      .check_retry(&LocalException::CloseConnection, &reference, &mut cnt)
      .unwrap();
    let second: Duration = policy
      .check_retry(&LocalException::CloseConnection, &reference, &mut cnt)
      .unwrap();

    assert_eq!(first, Duration::ZERO);
    assert_eq!(second, Duration::from_millis(100));
    assert_eq!(cnt, 2);
  }

  #[test]
  fn test_cap_rethrows_original() {
    let policy: RetryPolicy = RetryPolicy::new(vec![Duration::ZERO]);
    let reference: Reference = reference();
    let mut cnt: u32 = 1;

    let result: Result<Duration, LocalException> =
      policy.check_retry(&LocalException::ConnectionLost, &reference, &mut cnt);

    assert_eq!(result, Err(LocalException::ConnectionLost));
    assert_eq!(cnt, 2);
  }

  #[test]
  fn test_not_exist_clears_locator_cache() {
    let runtime: Runtime = Runtime::new(RuntimeConfig::default());
    let reference: Reference = runtime
      .proxy_from_string("account -L \"locator : tcp -h ns1 -p 4061 -t 60000\" @ GreeterAdapter")
      .unwrap()
      .reference()
      .clone();

    let info = reference.locator_info().unwrap().clone();
    info.insert_endpoints(&reference, vec![Endpoint::new(Transport::Tcp, "node1", 4061)]);
    assert!(info.get_endpoints(&reference).is_some());

    let not_exist: LocalException = LocalException::ObjectNotExist {
      identity: Identity::new("account", "").unwrap(),
      facet: String::new(),
      operation: "ice_ping".to_owned(),
    };

    let policy: RetryPolicy = RetryPolicy::new(vec![Duration::ZERO]);
    let mut cnt: u32 = 0;

    policy.check_retry(&not_exist, &reference, &mut cnt).unwrap();

    assert!(info.get_endpoints(&reference).is_none());
  }

  #[test]
  fn test_empty_table_never_retries() {
    let policy: RetryPolicy = RetryPolicy::new(Vec::new());
    let reference: Reference = reference();
    let mut cnt: u32 = 0;

    let result: Result<Duration, LocalException> =
      policy.check_retry(&LocalException::CloseConnection, &reference, &mut cnt);

    assert!(result.is_err());
  }
}
