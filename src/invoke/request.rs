use bytes::Bytes;

use crate::core::Context;
use crate::core::EncodingVersion;
use crate::core::Identity;
use crate::core::InvocationMode;
use crate::core::OperationMode;

/// A fully prepared invocation descriptor.
///
/// The proxy builds one descriptor per attempt and hands it to the bound
/// request handler, which frames it onto a connection. The payload is the
/// marshalled in-parameter encapsulation; the handler never inspects it.
#[derive(Clone, Debug)]
pub struct OutgoingRequest {
  identity: Identity,
  facet: String,
  operation: String,
  mode: OperationMode,
  proxy_mode: InvocationMode,
  encoding: EncodingVersion,
  context: Context,
  payload: Bytes,
}

impl OutgoingRequest {
  pub(crate) fn new(
    identity: Identity,
    facet: String,
    operation: String,
    mode: OperationMode,
    proxy_mode: InvocationMode,
    encoding: EncodingVersion,
    context: Context,
    payload: Bytes,
  ) -> Self {
    Self {
      identity,
      facet,
      operation,
      mode,
      proxy_mode,
      encoding,
      context,
      payload,
    }
  }

  /// Returns the identity of the target object.
  #[inline]
  pub fn identity(&self) -> &Identity {
    &self.identity
  }

  /// Returns the facet selecting the target servant.
  #[inline]
  pub fn facet(&self) -> &str {
    self.facet.as_str()
  }

  /// Returns the operation name.
  #[inline]
  pub fn operation(&self) -> &str {
    self.operation.as_str()
  }

  /// Returns the idempotency marker of the operation.
  #[inline]
  pub const fn mode(&self) -> OperationMode {
    self.mode
  }

  /// Returns the invocation mode of the submitting proxy.
  #[inline]
  pub const fn proxy_mode(&self) -> InvocationMode {
    self.proxy_mode
  }

  /// Returns the encoding version of the payload.
  #[inline]
  pub const fn encoding(&self) -> EncodingVersion {
    self.encoding
  }

  /// Returns the request context.
  #[inline]
  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Returns the marshalled in-parameter encapsulation.
  #[inline]
  pub fn payload(&self) -> &Bytes {
    &self.payload
  }
}
