use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// A user exception arrived on a built-in operation that declares none.
///
/// Built-in operations cannot demarshal application-defined exception
/// types, so the reply is surfaced with only the wire type id of the
/// exception that was raised.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct UnknownUserException {
  type_id: String,
}

impl UnknownUserException {
  /// Creates a new exception wrapping the given wire type id.
  #[inline]
  pub fn new<T>(type_id: T) -> Self
  where
    T: Display,
  {
    Self {
      type_id: type_id.to_string(),
    }
  }

  /// Returns the wire type id of the undeclared user exception.
  #[inline]
  pub fn type_id(&self) -> &str {
    self.type_id.as_str()
  }
}

impl Display for UnknownUserException {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "unknown user exception of type `{}'", self.type_id)
  }
}

impl Error for UnknownUserException {}
