use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Errors caused by incorrect use of the proxy API.
///
/// Usage errors are raised synchronously at the call site and are never
/// offered to the retry policy.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsageError {
  /// An identity with an empty name was supplied.
  IllegalIdentity,
  /// An argument was outside its permitted range.
  IllegalArgument {
    /// Description of the offending argument.
    reason: String,
  },
  /// A two-way-only operation was invoked on a non-two-way proxy.
  TwowayOnly {
    /// Name of the rejected operation.
    operation: String,
  },
  /// A stringified proxy could not be parsed.
  ProxyParse {
    /// Description of the syntax error.
    reason: String,
  },
}

impl UsageError {
  /// Creates an [`IllegalArgument`][UsageError::IllegalArgument] error.
  #[inline]
  pub fn illegal_argument<T>(reason: T) -> Self
  where
    T: Display,
  {
    Self::IllegalArgument {
      reason: reason.to_string(),
    }
  }

  /// Creates a [`TwowayOnly`][UsageError::TwowayOnly] error.
  #[inline]
  pub fn twoway_only<T>(operation: T) -> Self
  where
    T: Display,
  {
    Self::TwowayOnly {
      operation: operation.to_string(),
    }
  }

  /// Creates a [`ProxyParse`][UsageError::ProxyParse] error.
  #[inline]
  pub fn proxy_parse<T>(reason: T) -> Self
  where
    T: Display,
  {
    Self::ProxyParse {
      reason: reason.to_string(),
    }
  }
}

impl Display for UsageError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::IllegalIdentity => f.write_str("identity name cannot be empty"),
      Self::IllegalArgument { reason } => write!(f, "illegal argument: {reason}"),
      Self::TwowayOnly { operation } => {
        write!(f, "`{operation}' can only be invoked on a two-way proxy")
      }
      Self::ProxyParse { reason } => write!(f, "invalid proxy string: {reason}"),
    }
  }
}

impl Error for UsageError {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
