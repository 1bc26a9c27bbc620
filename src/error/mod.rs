//! Error types of the proxy core.
//!
//! Failures fall into four kinds with distinct propagation rules:
//!
//! 1. [`UsageError`]: incorrect use of the proxy API. Raised synchronously
//!    at the call site; never retried.
//! 2. [`LocalException`]: transport and runtime failures. Eligible for the
//!    at-most-once retry predicate.
//! 3. [`SystemException`]: internal invariant violations. Never retried.
//! 4. [`UnknownUserException`]: an application-defined exception arrived on
//!    a built-in operation. Never retried.
//!
//! The umbrella [`Error`] type carries any of the four and is what the
//! public proxy surface returns.

mod local;
mod system;
mod usage;
mod user;

pub use self::local::LocalException;
pub use self::system::SystemException;
pub use self::usage::UsageError;
pub use self::user::UnknownUserException;

use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

// -----------------------------------------------------------------------------
// @error - Error
// -----------------------------------------------------------------------------

/// Any failure surfaced by the proxy core.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
  /// Incorrect use of the proxy API.
  Usage(UsageError),
  /// A transport or runtime failure.
  Local(LocalException),
  /// An internal invariant violation.
  System(SystemException),
  /// An undeclared user exception on a built-in operation.
  UnknownUser(UnknownUserException),
}

impl Error {
  /// Returns `true` if the failure is a local (transport/runtime) exception.
  #[inline]
  pub const fn is_local(&self) -> bool {
    matches!(self, Self::Local(_))
  }

  /// Returns the inner local exception, if any.
  #[inline]
  pub const fn as_local(&self) -> Option<&LocalException> {
    match self {
      Self::Local(exception) => Some(exception),
      _ => None,
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Usage(error) => Display::fmt(error, f),
      Self::Local(exception) => Display::fmt(exception, f),
      Self::System(exception) => Display::fmt(exception, f),
      Self::UnknownUser(exception) => Display::fmt(exception, f),
    }
  }
}

impl StdError for Error {
  fn source(&self) -> Option<&(dyn StdError + 'static)> {
    match self {
      Self::Usage(error) => Some(error),
      Self::Local(exception) => Some(exception),
      Self::System(exception) => Some(exception),
      Self::UnknownUser(exception) => Some(exception),
    }
  }
}

impl From<UsageError> for Error {
  #[inline]
  fn from(other: UsageError) -> Self {
    Self::Usage(other)
  }
}

impl From<LocalException> for Error {
  #[inline]
  fn from(other: LocalException) -> Self {
    Self::Local(other)
  }
}

impl From<SystemException> for Error {
  #[inline]
  fn from(other: SystemException) -> Self {
    Self::System(other)
  }
}

impl From<UnknownUserException> for Error {
  #[inline]
  fn from(other: UnknownUserException) -> Self {
    Self::UnknownUser(other)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
