use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

use crate::error::UsageError;

/// Version of the wire encoding applied to marshalled parameters.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EncodingVersion {
  major: u8,
  minor: u8,
}

impl EncodingVersion {
  /// The original wire encoding.
  pub const V_1_0: Self = Self::new(1, 0);

  /// The wire encoding with optional members and sliced values.
  pub const V_1_1: Self = Self::new(1, 1);

  /// Creates a new encoding version.
  #[inline]
  pub const fn new(major: u8, minor: u8) -> Self {
    Self { major, minor }
  }

  /// Returns the major version component.
  #[inline]
  pub const fn major(&self) -> u8 {
    self.major
  }

  /// Returns the minor version component.
  #[inline]
  pub const fn minor(&self) -> u8 {
    self.minor
  }
}

impl Display for EncodingVersion {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{}.{}", self.major, self.minor)
  }
}

impl FromStr for EncodingVersion {
  type Err = UsageError;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    let error = || UsageError::proxy_parse(format!("invalid encoding version `{input}'"));

    let (major, minor): (&str, &str) = input.split_once('.').ok_or_else(error)?;
    let major: u8 = major.parse().map_err(|_| error())?;
    let minor: u8 = minor.parse().map_err(|_| error())?;

    Ok(Self::new(major, minor))
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
