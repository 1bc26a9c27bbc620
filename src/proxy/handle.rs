use parking_lot::Mutex;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc as StdArc;
use triomphe::Arc;

use crate::binding::BatchRequestQueue;
use crate::binding::Connection;
use crate::binding::RequestHandler;
use crate::core::Context;
use crate::core::EncodingVersion;
use crate::core::Endpoint;
use crate::core::EndpointSelection;
use crate::core::Identity;
use crate::core::InvocationMode;
use crate::core::Reference;
use crate::error::Error;
use crate::runtime::Runtime;
use crate::wire::OutputStream;

// -----------------------------------------------------------------------------
// Proxy Cell
// -----------------------------------------------------------------------------

#[derive(Default)]
struct ProxySlots {
  handler: Option<StdArc<dyn RequestHandler>>,
  batch_queue: Option<StdArc<BatchRequestQueue>>,
}

struct ProxyCell {
  reference: Reference,
  slots: Mutex<ProxySlots>,
}

// -----------------------------------------------------------------------------
// @api - Proxy
// -----------------------------------------------------------------------------

/// Client handle for a remote object.
///
/// Clones share the underlying cell, including the cached request handler
/// and batch queue. Reads of the reference never lock; only the two cache
/// slots are guarded, and no I/O happens under the lock.
#[derive(Clone)]
pub struct Proxy {
  cell: Arc<ProxyCell>,
}

impl Proxy {
  pub(crate) fn from_reference(reference: Reference) -> Self {
    Self {
      cell: Arc::new(ProxyCell {
        reference,
        slots: Mutex::new(ProxySlots::default()),
      }),
    }
  }

  /// Returns the immutable reference behind this proxy.
  #[inline]
  pub fn reference(&self) -> &Reference {
    &self.cell.reference
  }

  /// Returns the owning runtime.
  #[inline]
  pub fn runtime(&self) -> &Runtime {
    self.cell.reference.runtime()
  }

  /// Returns `true` if `self` and `other` share the same cell.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.cell, &other.cell)
  }

  /// Wraps `reference` in a fresh proxy, or returns `self` when the
  /// reference payload is shared with the current one.
  fn derive(&self, reference: Reference) -> Self {
    if reference.ptr_eq(&self.cell.reference) {
      return self.clone();
    }

    Self::from_reference(reference)
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  /// Returns the identity of the remote object.
  #[inline]
  pub fn identity(&self) -> &Identity {
    self.reference().identity()
  }

  /// Returns the facet selecting one of the object's servants.
  #[inline]
  pub fn facet(&self) -> &str {
    self.reference().facet()
  }

  /// Returns the invocation mode.
  #[inline]
  pub fn mode(&self) -> InvocationMode {
    self.reference().mode()
  }

  /// Returns `true` if invocations await a reply.
  #[inline]
  pub fn is_twoway(&self) -> bool {
    self.mode().is_twoway()
  }

  /// Returns `true` if the proxy is one-way.
  #[inline]
  pub fn is_oneway(&self) -> bool {
    self.mode() == InvocationMode::Oneway
  }

  /// Returns `true` if the proxy queues one-way requests for batching.
  #[inline]
  pub fn is_batch_oneway(&self) -> bool {
    self.mode() == InvocationMode::BatchOneway
  }

  /// Returns `true` if the proxy sends datagrams.
  #[inline]
  pub fn is_datagram(&self) -> bool {
    self.mode() == InvocationMode::Datagram
  }

  /// Returns `true` if the proxy queues datagrams for batching.
  #[inline]
  pub fn is_batch_datagram(&self) -> bool {
    self.mode() == InvocationMode::BatchDatagram
  }

  /// Returns `true` if only secure endpoints may be used.
  #[inline]
  pub fn is_secure(&self) -> bool {
    self.reference().secure()
  }

  /// Returns `true` if secure endpoints are preferred over insecure ones.
  #[inline]
  pub fn is_prefer_secure(&self) -> bool {
    self.reference().prefer_secure()
  }

  /// Returns the wire encoding version.
  #[inline]
  pub fn encoding(&self) -> EncodingVersion {
    self.reference().encoding()
  }

  /// Returns the compression override, if any.
  #[inline]
  pub fn compress(&self) -> Option<bool> {
    self.reference().compress()
  }

  /// Returns the per-proxy request context.
  #[inline]
  pub fn context(&self) -> &Context {
    self.reference().context()
  }

  /// Returns the direct endpoints, empty for an indirect proxy.
  #[inline]
  pub fn endpoints(&self) -> &[Endpoint] {
    self.reference().endpoints()
  }

  /// Returns the adapter id, empty for a direct proxy.
  #[inline]
  pub fn adapter_id(&self) -> &str {
    self.reference().adapter_id()
  }

  /// Returns the bound locator proxy, if any.
  pub fn locator(&self) -> Option<Proxy> {
    self
      .reference()
      .locator_info()
      .map(|info| info.get_locator().clone())
  }

  /// Returns the bound router proxy, if any.
  pub fn router(&self) -> Option<Proxy> {
    self
      .reference()
      .router_info()
      .map(|info| info.get_router().clone())
  }

  /// Returns `true` if the bound request handler is reused across calls.
  #[inline]
  pub fn is_connection_cached(&self) -> bool {
    self.reference().cache_connection()
  }

  /// Returns `true` if collocated dispatch may bypass the wire.
  #[inline]
  pub fn is_collocation_optimized(&self) -> bool {
    self.reference().collocation_optimized()
  }

  /// Returns the endpoint tie-break strategy.
  #[inline]
  pub fn endpoint_selection(&self) -> EndpointSelection {
    self.reference().endpoint_selection()
  }

  /// Returns the locator cache staleness bound in seconds.
  #[inline]
  pub fn locator_cache_timeout(&self) -> i32 {
    self.reference().locator_cache_timeout()
  }

  /// Returns the end-to-end invocation bound in milliseconds.
  #[inline]
  pub fn invocation_timeout(&self) -> i32 {
    self.reference().invocation_timeout()
  }

  /// Returns the tag segregating connection pools.
  #[inline]
  pub fn connection_id(&self) -> &str {
    self.reference().connection_id()
  }

  // ---------------------------------------------------------------------------
  // Derivation
  // ---------------------------------------------------------------------------

  /// Returns a proxy addressing the given identity.
  #[must_use]
  pub fn with_identity(&self, identity: Identity) -> Self {
    self.derive(self.reference().change_identity(identity))
  }

  /// Returns a proxy selecting the given facet.
  #[must_use]
  pub fn with_facet<T>(&self, facet: T) -> Self
  where
    T: Into<String>,
  {
    self.derive(self.reference().change_facet(facet))
  }

  /// Returns a proxy with the given invocation mode.
  #[must_use]
  pub fn with_mode(&self, mode: InvocationMode) -> Self {
    self.derive(self.reference().change_mode(mode))
  }

  /// Returns a two-way proxy.
  #[must_use]
  pub fn as_twoway(&self) -> Self {
    self.with_mode(InvocationMode::Twoway)
  }

  /// Returns a one-way proxy.
  #[must_use]
  pub fn as_oneway(&self) -> Self {
    self.with_mode(InvocationMode::Oneway)
  }

  /// Returns a batch one-way proxy.
  #[must_use]
  pub fn as_batch_oneway(&self) -> Self {
    self.with_mode(InvocationMode::BatchOneway)
  }

  /// Returns a datagram proxy.
  #[must_use]
  pub fn as_datagram(&self) -> Self {
    self.with_mode(InvocationMode::Datagram)
  }

  /// Returns a batch datagram proxy.
  #[must_use]
  pub fn as_batch_datagram(&self) -> Self {
    self.with_mode(InvocationMode::BatchDatagram)
  }

  /// Returns a proxy with the given secure requirement.
  #[must_use]
  pub fn with_secure(&self, secure: bool) -> Self {
    self.derive(self.reference().change_secure(secure))
  }

  /// Returns a proxy with the given secure preference.
  #[must_use]
  pub fn with_prefer_secure(&self, prefer_secure: bool) -> Self {
    self.derive(self.reference().change_prefer_secure(prefer_secure))
  }

  /// Returns a proxy with the given encoding version.
  #[must_use]
  pub fn with_encoding(&self, encoding: EncodingVersion) -> Self {
    self.derive(self.reference().change_encoding(encoding))
  }

  /// Returns a proxy with the given compression override.
  #[must_use]
  pub fn with_compress(&self, compress: bool) -> Self {
    self.derive(self.reference().change_compress(compress))
  }

  /// Returns a proxy with the given request context.
  #[must_use]
  pub fn with_context(&self, context: Context) -> Self {
    self.derive(self.reference().change_context(context))
  }

  /// Returns a proxy addressed by the given endpoints.
  #[must_use]
  pub fn with_endpoints(&self, endpoints: Vec<Endpoint>) -> Self {
    self.derive(self.reference().change_endpoints(endpoints))
  }

  /// Returns a proxy addressed by the given adapter id.
  #[must_use]
  pub fn with_adapter_id<T>(&self, adapter_id: T) -> Self
  where
    T: Into<String>,
  {
    self.derive(self.reference().change_adapter_id(adapter_id))
  }

  /// Returns a proxy bound to the given locator.
  #[must_use]
  pub fn with_locator(&self, locator: Option<&Proxy>) -> Self {
    self.derive(self.reference().change_locator(locator))
  }

  /// Returns a proxy bound to the given router.
  #[must_use]
  pub fn with_router(&self, router: Option<&Proxy>) -> Self {
    self.derive(self.reference().change_router(router))
  }

  /// Returns a proxy with the given connection-caching policy.
  #[must_use]
  pub fn with_connection_cached(&self, cache: bool) -> Self {
    self.derive(self.reference().change_cache_connection(cache))
  }

  /// Returns a proxy with the given collocation policy.
  #[must_use]
  pub fn with_collocation_optimized(&self, optimized: bool) -> Self {
    self.derive(self.reference().change_collocation_optimized(optimized))
  }

  /// Returns a proxy with the given endpoint tie-break strategy.
  #[must_use]
  pub fn with_endpoint_selection(&self, selection: EndpointSelection) -> Self {
    self.derive(self.reference().change_endpoint_selection(selection))
  }

  /// Returns a proxy with the given locator cache staleness bound.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalArgument`][crate::error::UsageError] if
  /// `timeout < -1`.
  pub fn with_locator_cache_timeout(&self, timeout: i32) -> Result<Self, Error> {
    Ok(self.derive(self.reference().change_locator_cache_timeout(timeout)?))
  }

  /// Returns a proxy with the given end-to-end invocation bound.
  ///
  /// A timeout of `-1` disables the bound; `-2` inherits the timeout of
  /// the cached connection when one is bound at invocation start, and
  /// degrades to `-1` otherwise (in particular whenever connection caching
  /// is off).
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalArgument`][crate::error::UsageError]
  /// unless `timeout >= 1` or `timeout` is `-1` or `-2`.
  pub fn with_invocation_timeout(&self, timeout: i32) -> Result<Self, Error> {
    Ok(self.derive(self.reference().change_invocation_timeout(timeout)?))
  }

  /// Returns a proxy whose endpoints carry the given transport-level
  /// timeout.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalArgument`][crate::error::UsageError]
  /// unless `timeout >= 1` or `timeout == -1`.
  pub fn with_timeout(&self, timeout: i32) -> Result<Self, Error> {
    Ok(self.derive(self.reference().change_timeout(timeout)?))
  }

  /// Returns a proxy with the given connection pool tag.
  #[must_use]
  pub fn with_connection_id<T>(&self, connection_id: T) -> Self
  where
    T: Into<String>,
  {
    self.derive(self.reference().change_connection_id(connection_id))
  }

  // ---------------------------------------------------------------------------
  // Request Handler Cache
  // ---------------------------------------------------------------------------

  /// Returns the handler for the next invocation attempt.
  ///
  /// Uses the cached handler when connection caching is on and one is
  /// bound; otherwise obtains a fresh handler from the reference and,
  /// with caching on, installs it first-writer-wins.
  pub(crate) fn request_handler(&self) -> Result<StdArc<dyn RequestHandler>, Error> {
    if self.reference().cache_connection() {
      if let Some(handler) = self.cell.slots.lock().handler.clone() {
        return Ok(handler);
      }
    }

    let handler: StdArc<dyn RequestHandler> = self.reference().get_request_handler(self)?;

    Ok(self.set_handler(handler))
  }

  /// Installs `handler` in the cache slot, first-writer-wins.
  ///
  /// Returns the installed handler: `handler` itself when the slot was
  /// empty or caching is off, the previously installed handler otherwise.
  pub fn set_handler(&self, handler: StdArc<dyn RequestHandler>) -> StdArc<dyn RequestHandler> {
    if !self.reference().cache_connection() {
      return handler;
    }

    let mut slots = self.cell.slots.lock();

    match &slots.handler {
      Some(installed) => StdArc::clone(installed),
      None => {
        slots.handler = Some(StdArc::clone(&handler));
        handler
      }
    }
  }

  /// Applies the handler replacement protocol.
  ///
  /// Called by a placeholder *connect* handler once it resolves to a
  /// concrete one. The cached handler is replaced through its own
  /// [`RequestHandler::update`] only when caching is on, the slot is
  /// non-empty, and the slot does not already hold `replacement`; a stale
  /// notification is a no-op.
  pub fn update_handler(
    &self,
    previous: &StdArc<dyn RequestHandler>,
    replacement: &StdArc<dyn RequestHandler>,
  ) {
    if !self.reference().cache_connection() {
      return;
    }

    let mut slots = self.cell.slots.lock();

    if let Some(installed) = slots.handler.clone() {
      if !StdArc::ptr_eq(&installed, replacement) {
        tracing::debug!(identity = %self.identity(), "rebinding cached request handler");
        slots.handler = Some(installed.update(previous, replacement));
      }
    }
  }

  /// Clears the cached handler so the next invocation re-binds.
  pub fn clear_handler(&self) {
    self.cell.slots.lock().handler = None;
  }

  pub(crate) fn cached_handler(&self) -> Option<StdArc<dyn RequestHandler>> {
    self.cell.slots.lock().handler.clone()
  }

  /// Returns the connection of the cached handler, if one is bound.
  ///
  /// Never triggers connection establishment; any binding failure yields
  /// `None`.
  pub fn cached_connection(&self) -> Option<StdArc<Connection>> {
    self.cached_handler()?.connection().ok()
  }

  /// Returns the batch request queue, creating and caching it on first
  /// use.
  pub(crate) fn batch_request_queue(&self) -> StdArc<BatchRequestQueue> {
    let mut slots = self.cell.slots.lock();

    match &slots.batch_queue {
      Some(queue) => StdArc::clone(queue),
      None => {
        let queue: StdArc<BatchRequestQueue> = self.reference().get_batch_request_queue();
        slots.batch_queue = Some(StdArc::clone(&queue));
        queue
      }
    }
  }

  // ---------------------------------------------------------------------------
  // String & Wire Forms
  // ---------------------------------------------------------------------------

  /// Returns a stable integer derived from the reference attributes.
  #[inline]
  pub fn hash_value(&self) -> u64 {
    self.reference().hash_value()
  }

  /// Writes the wire form: the identity first, then the remaining
  /// reference attributes.
  #[inline]
  pub fn stream_write(&self, out: &mut OutputStream) {
    self.reference().stream_write(out);
  }
}

impl PartialEq for Proxy {
  fn eq(&self, other: &Self) -> bool {
    self.reference() == other.reference()
  }
}

impl Eq for Proxy {}

impl PartialOrd for Proxy {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Proxy {
  fn cmp(&self, other: &Self) -> Ordering {
    self.reference().cmp(other.reference())
  }
}

impl Hash for Proxy {
  fn hash<H>(&self, state: &mut H)
  where
    H: Hasher,
  {
    self.reference().hash(state);
  }
}

impl Display for Proxy {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self.reference(), f)
  }
}

impl Debug for Proxy {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "Proxy({self})")
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
