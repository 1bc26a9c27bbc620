use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::core::Identity;

/// Transport and runtime failures observed while dispatching an invocation.
///
/// Local exceptions are the only failures eligible for the at-most-once
/// retry predicate. The discriminator methods below drive the retry
/// classification switch.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LocalException {
  /// The server signalled an orderly shutdown.
  ///
  /// Outstanding requests are safe to repeat by protocol guarantee.
  CloseConnection,
  /// The target object does not exist at the bound endpoint.
  ObjectNotExist {
    /// Identity of the missing object.
    identity: Identity,
    /// Facet selected by the failed request.
    facet: String,
    /// Operation carried by the failed request.
    operation: String,
  },
  /// The target object exists but does not carry the requested facet.
  FacetNotExist {
    /// Identity of the target object.
    identity: Identity,
    /// The missing facet.
    facet: String,
    /// Operation carried by the failed request.
    operation: String,
  },
  /// The target object does not implement the requested operation.
  OperationNotExist {
    /// Identity of the target object.
    identity: Identity,
    /// Facet selected by the failed request.
    facet: String,
    /// The missing operation.
    operation: String,
  },
  /// The remote endpoint refused the connection.
  ConnectionRefused,
  /// The connection was lost while a request was in flight.
  ConnectionLost,
  /// Connection establishment exceeded its timeout.
  ConnectTimeout,
  /// A transport-level wait exceeded its timeout.
  Timeout,
  /// An invocation exceeded its end-to-end timeout.
  InvocationTimeout,
  /// An invocation was cancelled before completion.
  InvocationCanceled,
  /// No endpoint is available to reach the target.
  NoEndpoint {
    /// Stringified form of the unreachable proxy.
    proxy: String,
  },
  /// The owning runtime was destroyed.
  RuntimeDestroyed,
  /// A value on the wire could not be encoded or decoded.
  Marshal {
    /// Description of the malformed data.
    reason: String,
  },
}

impl LocalException {
  /// Creates a [`Marshal`][LocalException::Marshal] exception.
  #[inline]
  pub fn marshal<T>(reason: T) -> Self
  where
    T: Display,
  {
    Self::Marshal {
      reason: reason.to_string(),
    }
  }

  /// Returns `true` if the server signalled an orderly shutdown.
  #[inline]
  pub const fn is_graceful_close(&self) -> bool {
    matches!(self, Self::CloseConnection)
  }

  /// Returns `true` if the failure indicates a stale object binding.
  #[inline]
  pub const fn is_not_exist(&self) -> bool {
    matches!(self, Self::ObjectNotExist { .. })
  }
}

impl Display for LocalException {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::CloseConnection => f.write_str("connection closed gracefully by the server"),
      Self::ObjectNotExist {
        identity,
        facet,
        operation,
      } => {
        write!(f, "object does not exist: identity `{identity}'")?;
        write_request_details(f, facet, operation)
      }
      Self::FacetNotExist {
        identity,
        facet,
        operation,
      } => {
        write!(f, "facet does not exist: identity `{identity}'")?;
        write_request_details(f, facet, operation)
      }
      Self::OperationNotExist {
        identity,
        facet,
        operation,
      } => {
        write!(f, "operation does not exist: identity `{identity}'")?;
        write_request_details(f, facet, operation)
      }
      Self::ConnectionRefused => f.write_str("connection refused"),
      Self::ConnectionLost => f.write_str("connection lost"),
      Self::ConnectTimeout => f.write_str("connection establishment timed out"),
      Self::Timeout => f.write_str("transport timeout"),
      Self::InvocationTimeout => f.write_str("invocation timed out"),
      Self::InvocationCanceled => f.write_str("invocation cancelled"),
      Self::NoEndpoint { proxy } => write!(f, "no suitable endpoint for proxy `{proxy}'"),
      Self::RuntimeDestroyed => f.write_str("runtime destroyed"),
      Self::Marshal { reason } => write!(f, "marshal error: {reason}"),
    }
  }
}

impl Error for LocalException {}

fn write_request_details(f: &mut Formatter<'_>, facet: &str, operation: &str) -> FmtResult {
  if !facet.is_empty() {
    write!(f, " facet `{facet}'")?;
  }

  write!(f, " operation `{operation}'")
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
