use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// An internal invariant violation.
///
/// System exceptions are never offered to the retry policy; they propagate
/// unchanged to the caller.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct SystemException {
  message: String,
}

impl SystemException {
  /// Creates a new system exception with the given message.
  #[inline]
  pub fn new<T>(message: T) -> Self
  where
    T: Display,
  {
    Self {
      message: message.to_string(),
    }
  }

  /// Returns the human-readable error message.
  #[inline]
  pub fn message(&self) -> &str {
    self.message.as_str()
  }
}

impl Display for SystemException {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "system exception: {}", self.message)
  }
}

impl Error for SystemException {}
