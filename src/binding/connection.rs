use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::types::Endpoint;

/// An established transport connection.
///
/// The proxy core treats connections as opaque: it reports the endpoint a
/// handler bound to and inherits the endpoint's timeout when an invocation
/// requests the connection-timeout sentinel. Establishment, multiplexing,
/// and teardown belong to the transport layer.
#[derive(Debug)]
pub struct Connection {
  endpoint: Endpoint,
}

impl Connection {
  /// Creates a connection handle bound to `endpoint`.
  #[inline]
  pub fn new(endpoint: Endpoint) -> Self {
    Self { endpoint }
  }

  /// Returns the endpoint this connection is bound to.
  #[inline]
  pub fn endpoint(&self) -> &Endpoint {
    &self.endpoint
  }

  /// Returns the transport-level timeout in milliseconds, `-1` if disabled.
  #[inline]
  pub const fn timeout(&self) -> i32 {
    self.endpoint.timeout()
  }
}

impl Display for Connection {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(&self.endpoint, f)
  }
}
