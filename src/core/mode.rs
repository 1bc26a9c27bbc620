use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::error::LocalException;

// -----------------------------------------------------------------------------
// @type - InvocationMode
// -----------------------------------------------------------------------------

/// Invocation semantics of a proxy.
///
/// Two-way invocations await a reply; one-way invocations complete once
/// sent over a reliable transport; datagram invocations complete once sent
/// over an unreliable transport; batch variants queue requests for a later
/// bulk flush.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum InvocationMode {
  /// Request/reply over a reliable transport.
  Twoway,
  /// Fire-and-forget over a reliable transport.
  Oneway,
  /// Queued fire-and-forget over a reliable transport.
  BatchOneway,
  /// Fire-and-forget over an unreliable transport.
  Datagram,
  /// Queued fire-and-forget over an unreliable transport.
  BatchDatagram,
}

impl InvocationMode {
  /// Returns `true` if invocations await a reply.
  #[inline]
  pub const fn is_twoway(&self) -> bool {
    matches!(self, Self::Twoway)
  }

  /// Returns `true` if invocations are queued for a bulk flush.
  #[inline]
  pub const fn is_batch(&self) -> bool {
    matches!(self, Self::BatchOneway | Self::BatchDatagram)
  }

  /// Returns `true` if invocations use an unreliable transport.
  #[inline]
  pub const fn is_datagram(&self) -> bool {
    matches!(self, Self::Datagram | Self::BatchDatagram)
  }

  /// Returns the stringified-proxy flag selecting this mode.
  #[inline]
  pub(crate) const fn flag(&self) -> &'static str {
    match self {
      Self::Twoway => "-t",
      Self::Oneway => "-o",
      Self::BatchOneway => "-O",
      Self::Datagram => "-d",
      Self::BatchDatagram => "-D",
    }
  }

  /// Converts this mode into its wire discriminator.
  #[inline]
  pub(crate) const fn to_wire(self) -> u8 {
    match self {
      Self::Twoway => 0,
      Self::Oneway => 1,
      Self::BatchOneway => 2,
      Self::Datagram => 3,
      Self::BatchDatagram => 4,
    }
  }

  /// Reconstructs a mode from its wire discriminator.
  pub(crate) fn from_wire(value: u8) -> Result<Self, LocalException> {
    match value {
      0 => Ok(Self::Twoway),
      1 => Ok(Self::Oneway),
      2 => Ok(Self::BatchOneway),
      3 => Ok(Self::Datagram),
      4 => Ok(Self::BatchDatagram),
      _ => Err(LocalException::marshal(format!(
        "invalid invocation mode discriminator {value}",
      ))),
    }
  }
}

impl Display for InvocationMode {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Twoway => f.write_str("twoway"),
      Self::Oneway => f.write_str("oneway"),
      Self::BatchOneway => f.write_str("batch-oneway"),
      Self::Datagram => f.write_str("datagram"),
      Self::BatchDatagram => f.write_str("batch-datagram"),
    }
  }
}

// -----------------------------------------------------------------------------
// @type - OperationMode
// -----------------------------------------------------------------------------

/// Idempotency marker of a single operation.
///
/// Retry classification consults this marker: non-mutating and idempotent
/// operations may always be retried without violating at-most-once.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationMode {
  /// The operation may modify remote state.
  Normal,
  /// The operation observes but never modifies remote state.
  Nonmutating,
  /// The operation may modify remote state, but repeating it is safe.
  Idempotent,
}

impl OperationMode {
  /// Returns `true` if repeating the operation could double-apply a change.
  #[inline]
  pub const fn is_mutating(&self) -> bool {
    matches!(self, Self::Normal)
  }
}

impl Display for OperationMode {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Normal => f.write_str("normal"),
      Self::Nonmutating => f.write_str("nonmutating"),
      Self::Idempotent => f.write_str("idempotent"),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
