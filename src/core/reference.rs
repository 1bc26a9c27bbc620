use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::hash::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc as StdArc;
use triomphe::Arc;

use crate::binding::BatchRequestQueue;
use crate::binding::LocatorInfo;
use crate::binding::RequestHandler;
use crate::binding::RouterInfo;
use crate::consts;
use crate::core::Context;
use crate::core::EncodingVersion;
use crate::core::Endpoint;
use crate::core::EndpointSelection;
use crate::core::Identity;
use crate::core::InvocationMode;
use crate::core::parse;
use crate::error::Error;
use crate::error::UsageError;
use crate::proxy::Proxy;
use crate::runtime::Runtime;
use crate::wire::OutputStream;

// -----------------------------------------------------------------------------
// Reference Data
// -----------------------------------------------------------------------------

#[derive(Clone)]
pub(crate) struct ReferenceData {
  pub(crate) runtime: Runtime,
  pub(crate) identity: Identity,
  pub(crate) facet: String,
  pub(crate) mode: InvocationMode,
  pub(crate) secure: bool,
  pub(crate) prefer_secure: bool,
  pub(crate) encoding: EncodingVersion,
  pub(crate) compress: Option<bool>,
  pub(crate) context: Context,
  pub(crate) endpoints: Vec<Endpoint>,
  pub(crate) adapter_id: String,
  pub(crate) locator_info: Option<StdArc<LocatorInfo>>,
  pub(crate) router_info: Option<StdArc<RouterInfo>>,
  pub(crate) cache_connection: bool,
  pub(crate) collocation_optimized: bool,
  pub(crate) endpoint_selection: EndpointSelection,
  pub(crate) locator_cache_timeout: i32,
  pub(crate) invocation_timeout: i32,
  pub(crate) connection_id: String,
}

// -----------------------------------------------------------------------------
// @type - Reference
// -----------------------------------------------------------------------------

/// Immutable descriptor of a remote object and its invocation policy.
///
/// A reference is a cheaply clonable shared handle; every mutator returns a
/// new reference and leaves the original untouched. A mutator whose new
/// value equals the current one returns a handle to the SAME payload, which
/// callers may observe through [`Reference::ptr_eq`]; proxy derivation
/// relies on this to share handles.
///
/// Equality, ordering, and hashing are structural over every attribute
/// except the owning runtime. Locator and router bindings compare by their
/// canonical handle address.
#[derive(Clone)]
pub struct Reference {
  data: Arc<ReferenceData>,
}

impl Reference {
  pub(crate) fn create(runtime: Runtime, identity: Identity) -> Self {
    Self {
      data: Arc::new(ReferenceData {
        runtime,
        identity,
        facet: String::new(),
        mode: InvocationMode::Twoway,
        secure: false,
        prefer_secure: false,
        encoding: consts::DEFAULT_ENCODING,
        compress: None,
        context: Context::new(),
        endpoints: Vec::new(),
        adapter_id: String::new(),
        locator_info: None,
        router_info: None,
        cache_connection: consts::DEFAULT_CACHE_CONNECTION,
        collocation_optimized: consts::DEFAULT_COLLOCATION_OPTIMIZED,
        endpoint_selection: EndpointSelection::Random,
        locator_cache_timeout: consts::LOCATOR_CACHE_NEVER_EXPIRE,
        invocation_timeout: consts::INVOCATION_TIMEOUT_INFINITE,
        connection_id: String::new(),
      }),
    }
  }

  fn derive<F>(&self, mutate: F) -> Self
  where
    F: FnOnce(&mut ReferenceData),
  {
    let mut data: ReferenceData = ReferenceData::clone(&self.data);
    mutate(&mut data);

    Self {
      data: Arc::new(data),
    }
  }

  /// Returns `true` if `self` and `other` share the same payload.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.data, &other.data)
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  /// Returns the owning runtime.
  #[inline]
  pub fn runtime(&self) -> &Runtime {
    &self.data.runtime
  }

  /// Returns the identity of the remote object.
  #[inline]
  pub fn identity(&self) -> &Identity {
    &self.data.identity
  }

  /// Returns the facet selecting one of the object's servants.
  #[inline]
  pub fn facet(&self) -> &str {
    self.data.facet.as_str()
  }

  /// Returns the invocation mode.
  #[inline]
  pub fn mode(&self) -> InvocationMode {
    self.data.mode
  }

  /// Returns `true` if only secure endpoints may be used.
  #[inline]
  pub fn secure(&self) -> bool {
    self.data.secure
  }

  /// Returns `true` if secure endpoints are preferred over insecure ones.
  #[inline]
  pub fn prefer_secure(&self) -> bool {
    self.data.prefer_secure
  }

  /// Returns the wire encoding version.
  #[inline]
  pub fn encoding(&self) -> EncodingVersion {
    self.data.encoding
  }

  /// Returns the compression override, if any.
  #[inline]
  pub fn compress(&self) -> Option<bool> {
    self.data.compress
  }

  /// Returns the per-proxy request context.
  #[inline]
  pub fn context(&self) -> &Context {
    &self.data.context
  }

  /// Returns the direct endpoints, empty for an indirect reference.
  #[inline]
  pub fn endpoints(&self) -> &[Endpoint] {
    self.data.endpoints.as_slice()
  }

  /// Returns the adapter id, empty for a direct reference.
  #[inline]
  pub fn adapter_id(&self) -> &str {
    self.data.adapter_id.as_str()
  }

  /// Returns the canonical locator binding, if any.
  #[inline]
  pub fn locator_info(&self) -> Option<&StdArc<LocatorInfo>> {
    self.data.locator_info.as_ref()
  }

  /// Returns the canonical router binding, if any.
  #[inline]
  pub fn router_info(&self) -> Option<&StdArc<RouterInfo>> {
    self.data.router_info.as_ref()
  }

  /// Returns `true` if the bound request handler is reused across calls.
  #[inline]
  pub fn cache_connection(&self) -> bool {
    self.data.cache_connection
  }

  /// Returns `true` if collocated dispatch may bypass the wire.
  #[inline]
  pub fn collocation_optimized(&self) -> bool {
    self.data.collocation_optimized
  }

  /// Returns the endpoint tie-break strategy.
  #[inline]
  pub fn endpoint_selection(&self) -> EndpointSelection {
    self.data.endpoint_selection
  }

  /// Returns the locator cache staleness bound in seconds, `-1` if entries
  /// never expire.
  #[inline]
  pub fn locator_cache_timeout(&self) -> i32 {
    self.data.locator_cache_timeout
  }

  /// Returns the end-to-end invocation bound in milliseconds, `-1` if
  /// unbounded, `-2` if inherited from the connection.
  #[inline]
  pub fn invocation_timeout(&self) -> i32 {
    self.data.invocation_timeout
  }

  /// Returns the tag segregating connection pools.
  #[inline]
  pub fn connection_id(&self) -> &str {
    self.data.connection_id.as_str()
  }

  /// Returns `true` if the reference addresses its target through a
  /// locator rather than direct endpoints.
  #[inline]
  pub fn is_indirect(&self) -> bool {
    self.data.endpoints.is_empty()
  }

  /// Returns `true` if the reference is indirect and carries no adapter id.
  #[inline]
  pub fn is_well_known(&self) -> bool {
    self.is_indirect() && self.data.adapter_id.is_empty()
  }

  // ---------------------------------------------------------------------------
  // Derivation
  // ---------------------------------------------------------------------------

  /// Returns a reference with the given identity.
  #[must_use]
  pub fn change_identity(&self, identity: Identity) -> Self {
    if identity == self.data.identity {
      return self.clone();
    }

    self.derive(|data| data.identity = identity)
  }

  /// Returns a reference with the given facet.
  #[must_use]
  pub fn change_facet<T>(&self, facet: T) -> Self
  where
    T: Into<String>,
  {
    let facet: String = facet.into();

    if facet == self.data.facet {
      return self.clone();
    }

    self.derive(|data| data.facet = facet)
  }

  /// Returns a reference with the given invocation mode.
  #[must_use]
  pub fn change_mode(&self, mode: InvocationMode) -> Self {
    if mode == self.data.mode {
      return self.clone();
    }

    self.derive(|data| data.mode = mode)
  }

  /// Returns a reference with the given secure requirement.
  #[must_use]
  pub fn change_secure(&self, secure: bool) -> Self {
    if secure == self.data.secure {
      return self.clone();
    }

    self.derive(|data| data.secure = secure)
  }

  /// Returns a reference with the given secure preference.
  #[must_use]
  pub fn change_prefer_secure(&self, prefer_secure: bool) -> Self {
    if prefer_secure == self.data.prefer_secure {
      return self.clone();
    }

    self.derive(|data| data.prefer_secure = prefer_secure)
  }

  /// Returns a reference with the given encoding version.
  #[must_use]
  pub fn change_encoding(&self, encoding: EncodingVersion) -> Self {
    if encoding == self.data.encoding {
      return self.clone();
    }

    self.derive(|data| data.encoding = encoding)
  }

  /// Returns a reference with the given compression override.
  #[must_use]
  pub fn change_compress(&self, compress: bool) -> Self {
    if Some(compress) == self.data.compress {
      return self.clone();
    }

    self.derive(|data| data.compress = Some(compress))
  }

  /// Returns a reference with the given request context.
  #[must_use]
  pub fn change_context(&self, context: Context) -> Self {
    if context == self.data.context {
      return self.clone();
    }

    self.derive(|data| data.context = context)
  }

  /// Returns a reference addressed by the given endpoints.
  ///
  /// A non-empty endpoint sequence clears the adapter id.
  #[must_use]
  pub fn change_endpoints(&self, endpoints: Vec<Endpoint>) -> Self {
    if endpoints == self.data.endpoints && self.data.adapter_id.is_empty() {
      return self.clone();
    }

    self.derive(|data| {
      data.endpoints = endpoints;
      data.adapter_id.clear();
    })
  }

  /// Returns a reference addressed by the given adapter id.
  ///
  /// A non-empty adapter id clears the endpoint sequence.
  #[must_use]
  pub fn change_adapter_id<T>(&self, adapter_id: T) -> Self
  where
    T: Into<String>,
  {
    let adapter_id: String = adapter_id.into();

    if adapter_id == self.data.adapter_id && self.data.endpoints.is_empty() {
      return self.clone();
    }

    self.derive(|data| {
      data.adapter_id = adapter_id;
      data.endpoints.clear();
    })
  }

  /// Returns a reference bound to the given locator, resolved to its
  /// canonical handle through the runtime.
  #[must_use]
  pub fn change_locator(&self, locator: Option<&Proxy>) -> Self {
    let info: Option<StdArc<LocatorInfo>> =
      locator.map(|proxy| self.data.runtime.locator_info(proxy));

    if info_ptr(&info) == info_ptr(&self.data.locator_info) {
      return self.clone();
    }

    self.derive(|data| data.locator_info = info)
  }

  /// Returns a reference bound to the given router, resolved to its
  /// canonical handle through the runtime.
  #[must_use]
  pub fn change_router(&self, router: Option<&Proxy>) -> Self {
    let info: Option<StdArc<RouterInfo>> =
      router.map(|proxy| self.data.runtime.router_info(proxy));

    if info_ptr(&info) == info_ptr(&self.data.router_info) {
      return self.clone();
    }

    self.derive(|data| data.router_info = info)
  }

  /// Returns a reference with the given connection-caching policy.
  #[must_use]
  pub fn change_cache_connection(&self, cache_connection: bool) -> Self {
    if cache_connection == self.data.cache_connection {
      return self.clone();
    }

    self.derive(|data| data.cache_connection = cache_connection)
  }

  /// Returns a reference with the given collocation policy.
  #[must_use]
  pub fn change_collocation_optimized(&self, collocation_optimized: bool) -> Self {
    if collocation_optimized == self.data.collocation_optimized {
      return self.clone();
    }

    self.derive(|data| data.collocation_optimized = collocation_optimized)
  }

  /// Returns a reference with the given endpoint tie-break strategy.
  #[must_use]
  pub fn change_endpoint_selection(&self, selection: EndpointSelection) -> Self {
    if selection == self.data.endpoint_selection {
      return self.clone();
    }

    self.derive(|data| data.endpoint_selection = selection)
  }

  /// Returns a reference with the given locator cache staleness bound.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalArgument`] if `timeout < -1`.
  pub fn change_locator_cache_timeout(&self, timeout: i32) -> Result<Self, UsageError> {
    if timeout < consts::LOCATOR_CACHE_NEVER_EXPIRE {
      return Err(UsageError::illegal_argument(format!(
        "invalid locator cache timeout: {timeout}",
      )));
    }

    if timeout == self.data.locator_cache_timeout {
      return Ok(self.clone());
    }

    Ok(self.derive(|data| data.locator_cache_timeout = timeout))
  }

  /// Returns a reference with the given end-to-end invocation bound.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalArgument`] unless `timeout >= 1` or
  /// `timeout` is one of the `-1`/`-2` sentinels.
  pub fn change_invocation_timeout(&self, timeout: i32) -> Result<Self, UsageError> {
    if timeout < 1
      && timeout != consts::INVOCATION_TIMEOUT_INFINITE
      && timeout != consts::INVOCATION_TIMEOUT_CONNECTION
    {
      return Err(UsageError::illegal_argument(format!(
        "invalid invocation timeout: {timeout}",
      )));
    }

    if timeout == self.data.invocation_timeout {
      return Ok(self.clone());
    }

    Ok(self.derive(|data| data.invocation_timeout = timeout))
  }

  /// Returns a reference whose endpoints carry the given transport-level
  /// timeout.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalArgument`] unless `timeout >= 1` or
  /// `timeout == -1`.
  pub fn change_timeout(&self, timeout: i32) -> Result<Self, UsageError> {
    if timeout < 1 && timeout != consts::CONNECTION_TIMEOUT_INFINITE {
      return Err(UsageError::illegal_argument(format!(
        "invalid connection timeout: {timeout}",
      )));
    }

    let endpoints: Vec<Endpoint> = self
      .data
      .endpoints
      .iter()
      .map(|endpoint| endpoint.with_timeout(timeout))
      .collect();

    if endpoints == self.data.endpoints {
      return Ok(self.clone());
    }

    Ok(self.derive(|data| data.endpoints = endpoints))
  }

  /// Returns a reference with the given connection pool tag.
  #[must_use]
  pub fn change_connection_id<T>(&self, connection_id: T) -> Self
  where
    T: Into<String>,
  {
    let connection_id: String = connection_id.into();

    if connection_id == self.data.connection_id {
      return self.clone();
    }

    self.derive(|data| data.connection_id = connection_id)
  }

  // ---------------------------------------------------------------------------
  // Dispatch Collaborators
  // ---------------------------------------------------------------------------

  /// Returns a request handler bound to this reference.
  ///
  /// # Errors
  ///
  /// Propagates the binding failure from the installed factory.
  pub fn get_request_handler(&self, proxy: &Proxy) -> Result<StdArc<dyn RequestHandler>, Error> {
    self.data.runtime.request_handler(self, proxy)
  }

  /// Returns a fresh batch request queue for this reference.
  pub fn get_batch_request_queue(&self) -> StdArc<BatchRequestQueue> {
    StdArc::new(BatchRequestQueue::new())
  }

  // ---------------------------------------------------------------------------
  // String & Wire Forms
  // ---------------------------------------------------------------------------

  /// Returns a stable integer derived from the attributes participating in
  /// equality.
  pub fn hash_value(&self) -> u64 {
    let mut hasher: DefaultHasher = DefaultHasher::new();
    self.hash(&mut hasher);
    hasher.finish()
  }

  /// Writes the wire form: the identity first, then the remaining
  /// attributes in a fixed order.
  pub fn stream_write(&self, out: &mut OutputStream) {
    let data: &ReferenceData = &self.data;

    out.write_string(data.identity.name());
    out.write_string(data.identity.category());
    out.write_string(data.facet.as_str());
    out.write_byte(data.mode.to_wire());
    out.write_bool(data.secure);
    out.write_bool(data.prefer_secure);
    out.write_byte(data.encoding.major());
    out.write_byte(data.encoding.minor());
    out.write_byte(match data.compress {
      None => 0,
      Some(false) => 1,
      Some(true) => 2,
    });
    out.write_bool(data.cache_connection);
    out.write_bool(data.collocation_optimized);
    out.write_byte(match data.endpoint_selection {
      EndpointSelection::Random => 0,
      EndpointSelection::Ordered => 1,
    });
    out.write_i32(data.locator_cache_timeout);
    out.write_i32(data.invocation_timeout);
    out.write_string(data.connection_id.as_str());

    out.write_size(data.context.len());
    for (key, value) in data.context.iter() {
      out.write_string(key.as_str());
      out.write_string(value.as_str());
    }

    out.write_size(data.endpoints.len());
    for endpoint in &data.endpoints {
      endpoint.stream_write(out);
    }

    out.write_string(data.adapter_id.as_str());

    write_optional_proxy(out, data.locator_info.as_deref().map(LocatorInfo::get_locator));
    write_optional_proxy(out, data.router_info.as_deref().map(RouterInfo::get_router));
  }
}

fn write_optional_proxy(out: &mut OutputStream, proxy: Option<&Proxy>) {
  match proxy {
    Some(proxy) => proxy.reference().stream_write(out),
    None => {
      out.write_string("");
      out.write_string("");
    }
  }
}

fn info_ptr<T>(info: &Option<StdArc<T>>) -> usize {
  info
    .as_ref()
    .map_or(0, |info| StdArc::as_ptr(info) as usize)
}

// -----------------------------------------------------------------------------
// Equality & Ordering
// -----------------------------------------------------------------------------

impl PartialEq for Reference {
  fn eq(&self, other: &Self) -> bool {
    if self.ptr_eq(other) {
      return true;
    }

    let lhs: &ReferenceData = &self.data;
    let rhs: &ReferenceData = &other.data;

    lhs.identity == rhs.identity
      && lhs.facet == rhs.facet
      && lhs.mode == rhs.mode
      && lhs.secure == rhs.secure
      && lhs.prefer_secure == rhs.prefer_secure
      && lhs.encoding == rhs.encoding
      && lhs.compress == rhs.compress
      && lhs.context == rhs.context
      && lhs.endpoints == rhs.endpoints
      && lhs.adapter_id == rhs.adapter_id
      && info_ptr(&lhs.locator_info) == info_ptr(&rhs.locator_info)
      && info_ptr(&lhs.router_info) == info_ptr(&rhs.router_info)
      && lhs.cache_connection == rhs.cache_connection
      && lhs.collocation_optimized == rhs.collocation_optimized
      && lhs.endpoint_selection == rhs.endpoint_selection
      && lhs.locator_cache_timeout == rhs.locator_cache_timeout
      && lhs.invocation_timeout == rhs.invocation_timeout
      && lhs.connection_id == rhs.connection_id
  }
}

impl Eq for Reference {}

impl PartialOrd for Reference {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Reference {
  fn cmp(&self, other: &Self) -> Ordering {
    if self.ptr_eq(other) {
      return Ordering::Equal;
    }

    let lhs: &ReferenceData = &self.data;
    let rhs: &ReferenceData = &other.data;

    lhs
      .identity
      .cmp(&rhs.identity)
      .then_with(|| lhs.facet.cmp(&rhs.facet))
      .then_with(|| lhs.mode.cmp(&rhs.mode))
      .then_with(|| lhs.secure.cmp(&rhs.secure))
      .then_with(|| lhs.prefer_secure.cmp(&rhs.prefer_secure))
      .then_with(|| lhs.encoding.cmp(&rhs.encoding))
      .then_with(|| lhs.compress.cmp(&rhs.compress))
      .then_with(|| lhs.context.cmp(&rhs.context))
      .then_with(|| lhs.endpoints.cmp(&rhs.endpoints))
      .then_with(|| lhs.adapter_id.cmp(&rhs.adapter_id))
      .then_with(|| info_ptr(&lhs.locator_info).cmp(&info_ptr(&rhs.locator_info)))
      .then_with(|| info_ptr(&lhs.router_info).cmp(&info_ptr(&rhs.router_info)))
      .then_with(|| lhs.cache_connection.cmp(&rhs.cache_connection))
      .then_with(|| lhs.collocation_optimized.cmp(&rhs.collocation_optimized))
      .then_with(|| lhs.endpoint_selection.cmp(&rhs.endpoint_selection))
      .then_with(|| lhs.locator_cache_timeout.cmp(&rhs.locator_cache_timeout))
      .then_with(|| lhs.invocation_timeout.cmp(&rhs.invocation_timeout))
      .then_with(|| lhs.connection_id.cmp(&rhs.connection_id))
  }
}

impl Hash for Reference {
  /// Hashes the attributes participating in equality.
  ///
  /// The locator and router handles are omitted: they compare by address,
  /// and omitting them keeps the hash consistent with equality.
  fn hash<H>(&self, state: &mut H)
  where
    H: Hasher,
  {
    let data: &ReferenceData = &self.data;

    data.identity.hash(state);
    data.facet.hash(state);
    data.mode.hash(state);
    data.secure.hash(state);
    data.prefer_secure.hash(state);
    data.encoding.hash(state);
    data.compress.hash(state);
    data.context.hash(state);
    data.endpoints.hash(state);
    data.adapter_id.hash(state);
    data.cache_connection.hash(state);
    data.collocation_optimized.hash(state);
    data.endpoint_selection.hash(state);
    data.locator_cache_timeout.hash(state);
    data.invocation_timeout.hash(state);
    data.connection_id.hash(state);
  }
}

// -----------------------------------------------------------------------------
// String Form
// -----------------------------------------------------------------------------

impl Display for Reference {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let data: &ReferenceData = &self.data;

    parse::write_word(f, &data.identity.to_string())?;

    if !data.facet.is_empty() {
      f.write_str(" -f ")?;
      parse::write_escaped_word(f, data.facet.as_str())?;
    }

    write!(f, " {}", data.mode.flag())?;

    if data.secure {
      f.write_str(" -s")?;
    }

    if data.encoding != consts::DEFAULT_ENCODING {
      write!(f, " -e {}", data.encoding)?;
    }

    if data.prefer_secure {
      f.write_str(" -P")?;
    }

    match data.compress {
      None => {}
      Some(true) => f.write_str(" -z")?,
      Some(false) => f.write_str(" -Z")?,
    }

    if !data.connection_id.is_empty() {
      f.write_str(" -c ")?;
      parse::write_escaped_word(f, data.connection_id.as_str())?;
    }

    if !data.cache_connection {
      f.write_str(" -u")?;
    }

    if !data.collocation_optimized {
      f.write_str(" -n")?;
    }

    if data.endpoint_selection == EndpointSelection::Ordered {
      f.write_str(" -S ordered")?;
    }

    if data.locator_cache_timeout != consts::LOCATOR_CACHE_NEVER_EXPIRE {
      write!(f, " -l {}", data.locator_cache_timeout)?;
    }

    if data.invocation_timeout != consts::INVOCATION_TIMEOUT_INFINITE {
      write!(f, " -i {}", data.invocation_timeout)?;
    }

    for (key, value) in data.context.iter() {
      f.write_str(" -k ")?;
      parse::write_word(f, &format!("{}={}", parse::escape(key), parse::escape(value)))?;
    }

    if let Some(info) = &data.locator_info {
      f.write_str(" -L ")?;
      parse::write_escaped_word(f, &info.get_locator().to_string())?;
    }

    if let Some(info) = &data.router_info {
      f.write_str(" -R ")?;
      parse::write_escaped_word(f, &info.get_router().to_string())?;
    }

    for endpoint in &data.endpoints {
      write!(f, " : {endpoint}")?;
    }

    if !data.adapter_id.is_empty() {
      f.write_str(" @ ")?;
      parse::write_escaped_word(f, data.adapter_id.as_str())?;
    }

    Ok(())
  }
}

impl Debug for Reference {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "Reference({self})")
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::core::EncodingVersion;
  use crate::core::Endpoint;
  use crate::core::Identity;
  use crate::core::InvocationMode;
  use crate::core::Reference;
  use crate::core::Transport;
  use crate::error::UsageError;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;

  fn reference() -> Reference {
    let runtime: Runtime = Runtime::new(RuntimeConfig::default());
    let identity: Identity = Identity::new("account", "").unwrap();

    Reference::create(runtime, identity)
      .change_endpoints(vec![Endpoint::new(Transport::Tcp, "node1", 4061)])
  }

  #[test]
  fn test_equal_value_shares_payload() {
    let source: Reference = reference();

    assert!(source.change_secure(false).ptr_eq(&source));
    assert!(source.change_mode(InvocationMode::Twoway).ptr_eq(&source));
    assert!(source.change_facet("").ptr_eq(&source));
  }

  #[test]
  fn test_changed_value_derives_payload() {
    let source: Reference = reference();
    let derived: Reference = source.change_secure(true);

    assert!(!derived.ptr_eq(&source));
    assert!(derived.secure());
    assert!(!source.secure());
    assert_ne!(derived, source);
  }

  #[test]
  fn test_adapter_id_clears_endpoints() {
    let source: Reference = reference();
    let derived: Reference = source.change_adapter_id("GreeterAdapter");

    assert!(derived.endpoints().is_empty());
    assert_eq!(derived.adapter_id(), "GreeterAdapter");
    assert!(derived.is_indirect());
    assert!(!derived.is_well_known());
  }

  #[test]
  fn test_endpoints_clear_adapter_id() {
    let endpoint: Endpoint = Endpoint::new(Transport::Ssl, "node2", 4062);
    let derived: Reference = reference()
      .change_adapter_id("GreeterAdapter")
      .change_endpoints(vec![endpoint.clone()]);

    assert_eq!(derived.adapter_id(), "");
    assert_eq!(derived.endpoints(), [endpoint]);
  }

  #[test]
  fn test_invocation_timeout_validation() {
    let source: Reference = reference();

    assert!(source.change_invocation_timeout(0).is_err());
    assert!(source.change_invocation_timeout(-3).is_err());
    assert!(source.change_invocation_timeout(-2).is_ok());
    assert!(source.change_invocation_timeout(-1).is_ok());
    assert!(source.change_invocation_timeout(1).is_ok());
  }

  #[test]
  fn test_locator_cache_timeout_validation() {
    let source: Reference = reference();

    assert!(source.change_locator_cache_timeout(-2).is_err());
    assert!(source.change_locator_cache_timeout(-1).is_ok());
    assert!(source.change_locator_cache_timeout(30).is_ok());
  }

  #[test]
  fn test_connection_timeout_rewrites_endpoints() {
    let source: Reference = reference();
    let derived: Reference = source.change_timeout(2500).unwrap();

    assert_eq!(derived.endpoints()[0].timeout(), 2500);

    let shared: Reference = derived.change_timeout(2500).unwrap();

    assert!(shared.ptr_eq(&derived));
  }

  #[test]
  fn test_connection_timeout_validation() {
    let result: Result<Reference, UsageError> = reference().change_timeout(0);

    assert!(result.is_err());
  }

  #[test]
  fn test_hash_consistent_with_equality() {
    let lhs: Reference = reference().change_encoding(EncodingVersion::V_1_0);
    let rhs: Reference = reference().change_encoding(EncodingVersion::V_1_0);

    assert_eq!(lhs, rhs);
    assert_eq!(lhs.hash_value(), rhs.hash_value());
  }

  #[test]
  fn test_ordering_consistent_with_equality() {
    let lhs: Reference = reference();
    let rhs: Reference = reference().change_facet("admin");

    assert_eq!(lhs.cmp(&reference()), std::cmp::Ordering::Equal);
    assert_ne!(lhs.cmp(&rhs), std::cmp::Ordering::Equal);
  }
}
