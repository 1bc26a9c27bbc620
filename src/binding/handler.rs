use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::binding::Connection;
use crate::error::Error;
use crate::error::LocalException;
use crate::invoke::OutgoingRequest;
use crate::proxy::Proxy;
use crate::types::Reference;

// -----------------------------------------------------------------------------
// @type - Reply
// -----------------------------------------------------------------------------

/// The demarshalling input of a completed two-way invocation.
#[derive(Clone, Debug)]
pub struct Reply {
  ok: bool,
  payload: Bytes,
}

impl Reply {
  /// Creates a new reply.
  ///
  /// `ok` distinguishes a user-level success from a user exception; the
  /// payload is the out-parameter (or exception) encapsulation.
  #[inline]
  pub fn new(ok: bool, payload: Bytes) -> Self {
    Self { ok, payload }
  }

  /// Returns `true` if the reply carries a user-level success.
  #[inline]
  pub const fn ok(&self) -> bool {
    self.ok
  }

  /// Returns the out-parameter encapsulation.
  #[inline]
  pub fn payload(&self) -> &Bytes {
    &self.payload
  }

  /// Consumes the reply and returns the out-parameter encapsulation.
  #[inline]
  pub fn into_payload(self) -> Bytes {
    self.payload
  }
}

// -----------------------------------------------------------------------------
// @type - Completion
// -----------------------------------------------------------------------------

/// Successful outcome of a submitted invocation.
#[derive(Clone, Debug)]
pub enum Completion {
  /// A two-way reply arrived.
  Replied(Reply),
  /// A one-way or datagram request was written to the transport.
  Sent,
}

// -----------------------------------------------------------------------------
// @type - Failure
// -----------------------------------------------------------------------------

/// Failed outcome of a submitted invocation.
///
/// `sent` records whether the request reached the wire before the failure;
/// retry classification depends on it.
#[derive(Clone, Debug)]
pub struct Failure {
  /// The failure itself.
  pub exception: Error,
  /// Whether the request was written to the transport.
  pub sent: bool,
}

impl Failure {
  /// Creates a new failure.
  #[inline]
  pub fn new<E>(exception: E, sent: bool) -> Self
  where
    E: Into<Error>,
  {
    Self {
      exception: exception.into(),
      sent,
    }
  }
}

// -----------------------------------------------------------------------------
// @api - RequestHandler
// -----------------------------------------------------------------------------

/// Binds a proxy to a concrete connection and submits its requests.
///
/// Handlers are produced by the [`RequestHandlerFactory`] installed on the
/// runtime. A factory may return a placeholder *connect* handler that
/// resolves to a concrete one once the connection is established; the
/// placeholder notifies the owning proxy through
/// [`Proxy::update_handler`][crate::proxy::Proxy::update_handler], which in
/// turn consults [`RequestHandler::update`] on the cached handler.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
  /// Resolves the handler replacement protocol.
  ///
  /// Returns the handler the owning proxy should cache, given that
  /// `previous` resolved to `replacement`. A handler that *is* `previous`
  /// returns `replacement`; any other handler returns itself unchanged.
  fn update(
    self: Arc<Self>,
    previous: &Arc<dyn RequestHandler>,
    replacement: &Arc<dyn RequestHandler>,
  ) -> Arc<dyn RequestHandler>;

  /// Submits an invocation.
  ///
  /// Resolves once a reply arrives (two-way) or once the request is written
  /// (one-way and datagram).
  async fn submit(&self, request: OutgoingRequest) -> Result<Completion, Failure>;

  /// Returns the connection this handler is bound to.
  ///
  /// # Errors
  ///
  /// Returns the binding failure if no connection could be established.
  fn connection(&self) -> Result<Arc<Connection>, LocalException>;
}

// -----------------------------------------------------------------------------
// @api - RequestHandlerFactory
// -----------------------------------------------------------------------------

/// Produces request handlers bound to a proxy's reference.
///
/// The factory owns connection establishment, endpoint selection, and
/// locator/router resolution; the proxy core only installs its results in
/// the per-proxy cache.
pub trait RequestHandlerFactory: Send + Sync + 'static {
  /// Returns a handler able to dispatch requests for `reference`.
  ///
  /// # Errors
  ///
  /// Returns the binding failure, typically a
  /// [`LocalException`][crate::error::LocalException] from connection
  /// establishment.
  fn request_handler(
    &self,
    reference: &Reference,
    proxy: &Proxy,
  ) -> Result<Arc<dyn RequestHandler>, Error>;
}
