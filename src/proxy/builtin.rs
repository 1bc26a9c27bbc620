use bytes::Bytes;
use std::sync::Arc as StdArc;
use tokio::time;

use crate::binding::Connection;
use crate::binding::Reply;
use crate::consts;
use crate::core::Context;
use crate::core::OperationMode;
use crate::error::Error;
use crate::error::LocalException;
use crate::error::SystemException;
use crate::error::UnknownUserException;
use crate::error::UsageError;
use crate::invoke::Outgoing;
use crate::invoke::handle_failure;
use crate::proxy::Proxy;
use crate::utils;
use crate::wire;
use crate::wire::InputStream;

/// Shape of the call site performing a two-way-only check.
///
/// The two shapes surface mode misuse differently: blocking call sites
/// raise a dedicated two-way-only error, asynchronous call sites raise an
/// illegal-argument error naming the operation.
#[derive(Clone, Copy, Debug)]
enum CallSite {
  Blocking,
  Async,
}

impl Proxy {
  fn check_twoway(&self, operation: &str, site: CallSite) -> Result<(), Error> {
    if self.is_twoway() {
      return Ok(());
    }

    match site {
      CallSite::Blocking => Err(UsageError::twoway_only(operation).into()),
      CallSite::Async => Err(
        UsageError::illegal_argument(format!(
          "`{operation}' can only be invoked on a two-way proxy",
        ))
        .into(),
      ),
    }
  }

  // ---------------------------------------------------------------------------
  // ping
  // ---------------------------------------------------------------------------

  /// Tests whether the target object is reachable.
  ///
  /// # Errors
  ///
  /// Propagates any dispatch failure surviving retry classification.
  pub async fn ping_async(&self, context: Option<&Context>) -> Result<(), Error> {
    self.ping_inner(context).await
  }

  /// Blocking shape of [`ping_async`][Proxy::ping_async].
  pub fn ping(&self, context: Option<&Context>) -> Result<(), Error> {
    utils::wait(self.ping_inner(context))
  }

  async fn ping_inner(&self, context: Option<&Context>) -> Result<(), Error> {
    let payload: Bytes = wire::empty_encaps(self.encoding());
    let reply: Option<Reply> =
      Outgoing::new(self, consts::OP_PING, OperationMode::Nonmutating, context, payload)
        .dispatch()
        .await?;

    if let Some(reply) = reply {
      open_params(&check_user_exception(reply)?)?;
    }

    Ok(())
  }

  // ---------------------------------------------------------------------------
  // is_a
  // ---------------------------------------------------------------------------

  /// Tests whether the target object implements `type_id`.
  ///
  /// # Errors
  ///
  /// Returns an illegal-argument error on a non-two-way proxy; otherwise
  /// propagates any dispatch failure surviving retry classification.
  pub async fn is_a_async(&self, type_id: &str, context: Option<&Context>) -> Result<bool, Error> {
    self.check_twoway(consts::OP_IS_A, CallSite::Async)?;
    self.is_a_inner(type_id, context).await
  }

  /// Blocking shape of [`is_a_async`][Proxy::is_a_async].
  ///
  /// # Errors
  ///
  /// Returns a two-way-only error on a non-two-way proxy.
  pub fn is_a(&self, type_id: &str, context: Option<&Context>) -> Result<bool, Error> {
    self.check_twoway(consts::OP_IS_A, CallSite::Blocking)?;
    utils::wait(self.is_a_inner(type_id, context))
  }

  async fn is_a_inner(&self, type_id: &str, context: Option<&Context>) -> Result<bool, Error> {
    let payload: Bytes = wire::encaps(self.encoding(), |out| out.write_string(type_id));
    let reply: Option<Reply> =
      Outgoing::new(self, consts::OP_IS_A, OperationMode::Nonmutating, context, payload)
        .dispatch()
        .await?;

    let mut params: InputStream = open_params(&check_user_exception(expect_reply(reply)?)?)?;

    Ok(params.read_bool()?)
  }

  // ---------------------------------------------------------------------------
  // id
  // ---------------------------------------------------------------------------

  /// Returns the most-derived type id of the target object.
  ///
  /// # Errors
  ///
  /// Returns an illegal-argument error on a non-two-way proxy; otherwise
  /// propagates any dispatch failure surviving retry classification.
  pub async fn id_async(&self, context: Option<&Context>) -> Result<String, Error> {
    self.check_twoway(consts::OP_ID, CallSite::Async)?;
    self.id_inner(context).await
  }

  /// Blocking shape of [`id_async`][Proxy::id_async].
  ///
  /// # Errors
  ///
  /// Returns a two-way-only error on a non-two-way proxy.
  pub fn id(&self, context: Option<&Context>) -> Result<String, Error> {
    self.check_twoway(consts::OP_ID, CallSite::Blocking)?;
    utils::wait(self.id_inner(context))
  }

  async fn id_inner(&self, context: Option<&Context>) -> Result<String, Error> {
    let payload: Bytes = wire::empty_encaps(self.encoding());
    let reply: Option<Reply> =
      Outgoing::new(self, consts::OP_ID, OperationMode::Nonmutating, context, payload)
        .dispatch()
        .await?;

    let mut params: InputStream = open_params(&check_user_exception(expect_reply(reply)?)?)?;

    Ok(params.read_string()?)
  }

  // ---------------------------------------------------------------------------
  // ids
  // ---------------------------------------------------------------------------

  /// Returns every type id implemented by the target object.
  ///
  /// # Errors
  ///
  /// Returns an illegal-argument error on a non-two-way proxy; otherwise
  /// propagates any dispatch failure surviving retry classification.
  pub async fn ids_async(&self, context: Option<&Context>) -> Result<Vec<String>, Error> {
    self.check_twoway(consts::OP_IDS, CallSite::Async)?;
    self.ids_inner(context).await
  }

  /// Blocking shape of [`ids_async`][Proxy::ids_async].
  ///
  /// # Errors
  ///
  /// Returns a two-way-only error on a non-two-way proxy.
  pub fn ids(&self, context: Option<&Context>) -> Result<Vec<String>, Error> {
    self.check_twoway(consts::OP_IDS, CallSite::Blocking)?;
    utils::wait(self.ids_inner(context))
  }

  async fn ids_inner(&self, context: Option<&Context>) -> Result<Vec<String>, Error> {
    let payload: Bytes = wire::empty_encaps(self.encoding());
    let reply: Option<Reply> =
      Outgoing::new(self, consts::OP_IDS, OperationMode::Nonmutating, context, payload)
        .dispatch()
        .await?;

    let mut params: InputStream = open_params(&check_user_exception(expect_reply(reply)?)?)?;

    Ok(params.read_string_seq()?)
  }

  // ---------------------------------------------------------------------------
  // invoke
  // ---------------------------------------------------------------------------

  /// Invokes `operation` with a pre-marshalled in-parameter encapsulation.
  ///
  /// Returns whether the reply carried a user-level success and the
  /// out-parameter (or exception) encapsulation. The out-encapsulation is
  /// populated only on a two-way proxy; user exceptions are returned for
  /// the caller to demarshal, never raised.
  ///
  /// # Errors
  ///
  /// Propagates any dispatch failure surviving retry classification.
  pub async fn invoke_async(
    &self,
    operation: &str,
    mode: OperationMode,
    in_encaps: &[u8],
    context: Option<&Context>,
  ) -> Result<(bool, Bytes), Error> {
    self.invoke_inner(operation, mode, in_encaps, context).await
  }

  /// Blocking shape of [`invoke_async`][Proxy::invoke_async].
  pub fn invoke(
    &self,
    operation: &str,
    mode: OperationMode,
    in_encaps: &[u8],
    context: Option<&Context>,
  ) -> Result<(bool, Bytes), Error> {
    utils::wait(self.invoke_inner(operation, mode, in_encaps, context))
  }

  async fn invoke_inner(
    &self,
    operation: &str,
    mode: OperationMode,
    in_encaps: &[u8],
    context: Option<&Context>,
  ) -> Result<(bool, Bytes), Error> {
    let payload: Bytes = if in_encaps.is_empty() {
      wire::empty_encaps(self.encoding())
    } else {
      Bytes::copy_from_slice(in_encaps)
    };

    let reply: Option<Reply> = Outgoing::new(self, operation, mode, context, payload)
      .dispatch()
      .await?;

    match reply {
      Some(reply) => Ok((reply.ok(), reply.into_payload())),
      None => Ok((true, Bytes::new())),
    }
  }

  // ---------------------------------------------------------------------------
  // flush_batch_requests
  // ---------------------------------------------------------------------------

  /// Flushes the queued batch requests through the bound handler.
  ///
  /// # Errors
  ///
  /// Propagates the binding failure or the first submission failure;
  /// flushing is never retried.
  pub async fn flush_batch_requests_async(&self) -> Result<(), Error> {
    let queue = self.batch_request_queue();
    let handler = self.request_handler()?;

    tracing::trace!(
      operation = consts::OP_FLUSH_BATCH_REQUESTS,
      queued = queue.len(),
      "flushing batch requests",
    );

    queue.flush(&handler).await
  }

  /// Blocking shape of
  /// [`flush_batch_requests_async`][Proxy::flush_batch_requests_async].
  pub fn flush_batch_requests(&self) -> Result<(), Error> {
    utils::wait(self.flush_batch_requests_async())
  }

  // ---------------------------------------------------------------------------
  // get_connection
  // ---------------------------------------------------------------------------

  /// Returns the connection serving this proxy, binding one if necessary.
  ///
  /// # Errors
  ///
  /// Propagates any binding failure surviving retry classification.
  pub async fn get_connection_async(&self) -> Result<StdArc<Connection>, Error> {
    if self.runtime().is_destroyed() {
      return Err(LocalException::RuntimeDestroyed.into());
    }

    tracing::trace!(operation = consts::OP_GET_CONNECTION, identity = %self.identity());

    let mut cnt: u32 = 0;

    'bind: loop {
      let handler = self.request_handler()?;

      match handler.connection() {
        Ok(connection) => break 'bind Ok(connection),
        Err(exception) => {
          let delay = handle_failure(
            self,
            exception.into(),
            OperationMode::Nonmutating,
            false,
            &mut cnt,
          )?;

          if !delay.is_zero() {
            time::sleep(delay).await;
          }
        }
      }
    }
  }

  /// Blocking shape of [`get_connection_async`][Proxy::get_connection_async].
  pub fn get_connection(&self) -> Result<StdArc<Connection>, Error> {
    utils::wait(self.get_connection_async())
  }

  // ---------------------------------------------------------------------------
  // checked_facet
  // ---------------------------------------------------------------------------

  /// Derives `facet` and remote-verifies that the servant implements
  /// `type_id`.
  ///
  /// Returns `None` when the servant denies the type or the facet does not
  /// exist at the target.
  ///
  /// # Errors
  ///
  /// Propagates any other dispatch failure.
  pub async fn checked_facet_async(
    &self,
    facet: &str,
    type_id: &str,
    context: Option<&Context>,
  ) -> Result<Option<Proxy>, Error> {
    let candidate: Proxy = self.with_facet(facet).as_twoway();

    match candidate.is_a_async(type_id, context).await {
      Ok(true) => Ok(Some(candidate)),
      Ok(false) => Ok(None),
      Err(Error::Local(LocalException::FacetNotExist { .. })) => Ok(None),
      Err(error) => Err(error),
    }
  }

  /// Blocking shape of [`checked_facet_async`][Proxy::checked_facet_async].
  pub fn checked_facet(
    &self,
    facet: &str,
    type_id: &str,
    context: Option<&Context>,
  ) -> Result<Option<Proxy>, Error> {
    utils::wait(self.checked_facet_async(facet, type_id, context))
  }
}

// -----------------------------------------------------------------------------
// Reply Demarshalling
// -----------------------------------------------------------------------------

fn expect_reply(reply: Option<Reply>) -> Result<Reply, Error> {
  reply.ok_or_else(|| {
    SystemException::new("two-way invocation completed without a reply").into()
  })
}

fn check_user_exception(reply: Reply) -> Result<Reply, Error> {
  if reply.ok() {
    return Ok(reply);
  }

  let mut input: InputStream = InputStream::new(reply.into_payload());
  let (_, mut params): (_, InputStream) = input.read_encaps()?;
  let type_id: String = params.read_string()?;

  Err(UnknownUserException::new(type_id).into())
}

fn open_params(reply: &Reply) -> Result<InputStream, Error> {
  let mut input: InputStream = InputStream::new(reply.payload().clone());
  let (_, params): (_, InputStream) = input.read_encaps()?;

  Ok(params)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::error::Error;
  use crate::error::UsageError;
  use crate::proxy::Proxy;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;

  fn proxy(input: &str) -> Proxy {
    Runtime::new(RuntimeConfig::default())
      .proxy_from_string(input)
      .unwrap()
  }

  #[test]
  fn test_blocking_twoway_check_raises_twoway_only() {
    let oneway: Proxy = proxy("account -o : tcp -h node1 -p 4061");

    let result: Result<bool, Error> = oneway.is_a("::Demo::Greeter", None);

    assert_eq!(
      result,
      Err(UsageError::twoway_only("ice_isA").into()),
    );
    assert!(matches!(
      oneway.id(None),
      Err(Error::Usage(UsageError::TwowayOnly { .. })),
    ));
    assert!(matches!(
      oneway.ids(None),
      Err(Error::Usage(UsageError::TwowayOnly { .. })),
    ));
  }

  #[tokio::test]
  async fn test_async_twoway_check_raises_illegal_argument() {
    let datagram: Proxy = proxy("account -d : udp -h node1 -p 4063");

    let result: Result<bool, Error> = datagram.is_a_async("::Demo::Greeter", None).await;

    assert!(matches!(
      result,
      Err(Error::Usage(UsageError::IllegalArgument { .. })),
    ));
  }

  #[test]
  fn test_batch_ping_queues_without_binding() {
    let batch: Proxy = proxy("account -O : tcp -h node1 -p 4061");

    batch.ping(None).unwrap();
    batch.ping(None).unwrap();

    assert_eq!(batch.batch_request_queue().len(), 2);
  }
}
