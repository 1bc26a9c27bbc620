use bytes::Bytes;
use std::time::Duration;
use tokio::time;

use crate::binding::Completion;
use crate::binding::Reply;
use crate::consts;
use crate::core::Context;
use crate::core::OperationMode;
use crate::core::Reference;
use crate::error::Error;
use crate::error::LocalException;
use crate::invoke::OutgoingRequest;
use crate::proxy::Proxy;

/// A single invocation in flight.
///
/// One `Outgoing` drives an operation from pre-flight to completion:
/// binding a handler, submitting the prepared request, and classifying
/// failures until the attempt succeeds, the retry policy gives up, or the
/// invocation timeout fires. Both the asynchronous and the blocking
/// operation shapes run through this state machine.
pub(crate) struct Outgoing {
  proxy: Proxy,
  operation: String,
  mode: OperationMode,
  context: Context,
  payload: Bytes,
}

impl Outgoing {
  pub(crate) fn new(
    proxy: &Proxy,
    operation: &str,
    mode: OperationMode,
    context: Option<&Context>,
    payload: Bytes,
  ) -> Self {
    let context: Context = match context {
      Some(context) => context.clone(),
      None => proxy.context().clone(),
    };

    Self {
      proxy: proxy.clone(),
      operation: operation.to_owned(),
      mode,
      context,
      payload,
    }
  }

  fn request(&self) -> OutgoingRequest {
    let reference: &Reference = self.proxy.reference();

    OutgoingRequest::new(
      reference.identity().clone(),
      reference.facet().to_owned(),
      self.operation.clone(),
      self.mode,
      reference.mode(),
      reference.encoding(),
      self.context.clone(),
      self.payload.clone(),
    )
  }

  /// Dispatches the invocation.
  ///
  /// Returns the reply for two-way invocations, `None` once a one-way or
  /// datagram request is sent or a batch request is queued.
  pub(crate) async fn dispatch(self) -> Result<Option<Reply>, Error> {
    if self.proxy.runtime().is_destroyed() {
      return Err(LocalException::RuntimeDestroyed.into());
    }

    match invocation_limit(&self.proxy) {
      Some(limit) => match time::timeout(limit, self.run()).await {
        Ok(result) => result,
        Err(_) => Err(LocalException::InvocationTimeout.into()),
      },
      None => self.run().await,
    }
  }

  async fn run(self) -> Result<Option<Reply>, Error> {
    if self.proxy.mode().is_batch() {
      self.proxy.batch_request_queue().enqueue(self.request());
      return Ok(None);
    }

    let mut cnt: u32 = 0;

    'retry: loop {
      let handler = self.proxy.request_handler()?;

      match handler.submit(self.request()).await {
        Ok(Completion::Replied(reply)) => break 'retry Ok(Some(reply)),
        Ok(Completion::Sent) => break 'retry Ok(None),
        Err(failure) => {
          let delay: Duration =
            handle_failure(&self.proxy, failure.exception, self.mode, failure.sent, &mut cnt)?;

          if !delay.is_zero() {
            time::sleep(delay).await;
          }
        }
      }
    }
  }
}

/// Classifies a dispatch failure and consults the retry policy.
///
/// The cached handler is cleared unconditionally so the next attempt
/// re-binds. Retry is considered only for local exceptions, and only when
/// repeating the request cannot violate at-most-once: the request never
/// reached the wire, the operation is non-mutating or idempotent, the
/// server closed gracefully, or the binding is provably stale.
pub(crate) fn handle_failure(
  proxy: &Proxy,
  exception: Error,
  mode: OperationMode,
  sent: bool,
  cnt: &mut u32,
) -> Result<Duration, Error> {
  proxy.clear_handler();

  let Error::Local(local) = exception else {
    return Err(exception);
  };

  let repeatable: bool =
    !sent || !mode.is_mutating() || local.is_graceful_close() || local.is_not_exist();

  if !repeatable {
    return Err(local.into());
  }

  proxy
    .runtime()
    .check_retry(&local, proxy.reference(), cnt)
    .map_err(Error::from)
}

fn invocation_limit(proxy: &Proxy) -> Option<Duration> {
  match proxy.invocation_timeout() {
    consts::INVOCATION_TIMEOUT_INFINITE => None,
    consts::INVOCATION_TIMEOUT_CONNECTION => {
      let timeout: i32 = proxy.cached_connection()?.timeout();

      (timeout >= 1).then(|| Duration::from_millis(timeout as u64))
    }
    timeout => Some(Duration::from_millis(timeout as u64)),
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::core::OperationMode;
  use crate::error::Error;
  use crate::error::LocalException;
  use crate::error::SystemException;
  use crate::invoke::outgoing::handle_failure;
  use crate::proxy::Proxy;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;

  fn proxy() -> Proxy {
    Runtime::new(RuntimeConfig::default())
      .proxy_from_string("account : tcp -h node1 -p 4061")
      .unwrap()
  }

  #[test]
  fn test_sent_mutating_generic_failure_propagates() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      LocalException::ConnectTimeout.into(),
      OperationMode::Normal,
      true,
      &mut cnt,
    );

    assert_eq!(result, Err(LocalException::ConnectTimeout.into()));
    assert_eq!(cnt, 0);
  }

  #[test]
  fn test_unsent_mutating_failure_is_retryable() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      LocalException::ConnectionRefused.into(),
      OperationMode::Normal,
      false,
      &mut cnt,
    );

    assert_eq!(result, Ok(Duration::ZERO));
    assert_eq!(cnt, 1);
  }

  #[test]
  fn test_graceful_close_is_retryable_after_sent() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      LocalException::CloseConnection.into(),
      OperationMode::Normal,
      true,
      &mut cnt,
    );

    assert_eq!(result, Ok(Duration::ZERO));
  }

  #[test]
  fn test_idempotent_failure_is_retryable_after_sent() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      LocalException::ConnectionLost.into(),
      OperationMode::Idempotent,
      true,
      &mut cnt,
    );

    assert_eq!(result, Ok(Duration::ZERO));
  }

  #[test]
  fn test_system_exception_never_retries() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    let exception: Error = SystemException::new("broken invariant").into();
    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      exception.clone(),
      OperationMode::Nonmutating,
      false,
      &mut cnt,
    );

    assert_eq!(result, Err(exception));
    assert_eq!(cnt, 0);
  }

  #[test]
  fn test_retry_cap_propagates_original() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    assert!(
      handle_failure(
        &proxy,
        LocalException::CloseConnection.into(),
        OperationMode::Normal,
        true,
        &mut cnt,
      )
      .is_ok(),
    );

    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      LocalException::CloseConnection.into(),
      OperationMode::Normal,
      true,
      &mut cnt,
    );

    assert_eq!(result, Err(LocalException::CloseConnection.into()));
    assert_eq!(cnt, 2);
  }

  #[test]
  fn test_destroyed_runtime_propagates_original() {
    let proxy: Proxy = proxy();
    let mut cnt: u32 = 0;

    proxy.runtime().destroy();

    let result: Result<Duration, Error> = handle_failure(
      &proxy,
      LocalException::CloseConnection.into(),
      OperationMode::Normal,
      true,
      &mut cnt,
    );

    assert_eq!(result, Err(LocalException::CloseConnection.into()));
  }
}
