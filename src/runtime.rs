//! The runtime instance owning proxy bootstrap and shared policy.
//!
//! A [`Runtime`] is a cheaply clonable handle shared by every reference it
//! creates. It owns the retry policy, the canonicalization tables for
//! locator and router bindings, the installed request-handler factory, and
//! the teardown flag consulted during retry evaluation.
//!
//! ```
//! use mizar::proxy::Proxy;
//! use mizar::runtime::Runtime;
//! use mizar::runtime::RuntimeConfig;
//!
//! let runtime: Runtime = Runtime::new(RuntimeConfig::default());
//! let proxy: Proxy = runtime
//!   .proxy_from_string("billing/account -o : tcp -h node1 -p 4061")
//!   .unwrap();
//!
//! assert_eq!(proxy.identity().name(), "account");
//! assert!(proxy.is_oneway());
//! ```

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc as StdArc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use triomphe::Arc;

use crate::binding::LocatorInfo;
use crate::binding::RequestHandler;
use crate::binding::RequestHandlerFactory;
use crate::binding::RouterInfo;
use crate::consts;
use crate::core::Context;
use crate::core::EncodingVersion;
use crate::core::Endpoint;
use crate::core::EndpointSelection;
use crate::core::Identity;
use crate::core::InvocationMode;
use crate::core::Reference;
use crate::core::parse;
use crate::error::Error;
use crate::error::LocalException;
use crate::error::SystemException;
use crate::invoke::RetryPolicy;
use crate::proxy::Proxy;
use crate::wire::InputStream;

// -----------------------------------------------------------------------------
// @type - RuntimeConfig
// -----------------------------------------------------------------------------

/// Tuning parameters of a runtime instance.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
  /// Delays applied between invocation attempts, one entry per permitted
  /// retry. An empty table disables retries entirely.
  pub retry_intervals: Vec<Duration>,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      retry_intervals: consts::DEFAULT_RETRY_INTERVALS.to_vec(),
    }
  }
}

// -----------------------------------------------------------------------------
// @api - Runtime
// -----------------------------------------------------------------------------

struct RuntimeInner {
  retry: RetryPolicy,
  destroyed: AtomicBool,
  factory: OnceLock<StdArc<dyn RequestHandlerFactory>>,
  locators: Mutex<HashMap<Proxy, StdArc<LocatorInfo>>>,
  routers: Mutex<HashMap<Proxy, StdArc<RouterInfo>>>,
}

/// Shared runtime state behind every proxy.
#[derive(Clone)]
pub struct Runtime {
  inner: Arc<RuntimeInner>,
}

impl Runtime {
  /// Creates a new runtime.
  pub fn new(config: RuntimeConfig) -> Self {
    Self {
      inner: Arc::new(RuntimeInner {
        retry: RetryPolicy::new(config.retry_intervals),
        destroyed: AtomicBool::new(false),
        factory: OnceLock::new(),
        locators: Mutex::new(HashMap::with_capacity(consts::CAP_INFO_TABLE)),
        routers: Mutex::new(HashMap::with_capacity(consts::CAP_INFO_TABLE)),
      }),
    }
  }

  /// Installs the request-handler factory, first writer wins.
  ///
  /// Returns `false` if a factory was already installed; the existing one
  /// is kept.
  pub fn install_handler_factory(&self, factory: StdArc<dyn RequestHandlerFactory>) -> bool {
    self.inner.factory.set(factory).is_ok()
  }

  /// Marks the runtime as destroyed.
  ///
  /// Pending retry evaluations observe the flag and propagate their
  /// original exception instead of scheduling another attempt.
  pub fn destroy(&self) {
    if !self.inner.destroyed.swap(true, Ordering::SeqCst) {
      tracing::info!("runtime destroyed");
    }
  }

  /// Returns `true` once [`destroy`][Runtime::destroy] has been called.
  #[inline]
  pub fn is_destroyed(&self) -> bool {
    self.inner.destroyed.load(Ordering::SeqCst)
  }

  /// Returns `true` if `self` and `other` are the same instance.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  // ---------------------------------------------------------------------------
  // Bootstrap
  // ---------------------------------------------------------------------------

  /// Parses a stringified proxy.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::ProxyParse`][crate::error::UsageError] on
  /// malformed input and [`UsageError::IllegalIdentity`]
  /// [crate::error::UsageError] on an empty identity name.
  pub fn proxy_from_string(&self, input: &str) -> Result<Proxy, Error> {
    parse::proxy_string(self, input).map(Proxy::from_reference)
  }

  /// Reads a proxy from its wire form.
  ///
  /// Returns `None` for a null proxy (an identity with an empty name).
  ///
  /// # Errors
  ///
  /// Returns [`LocalException::Marshal`][crate::error::LocalException] on
  /// malformed input.
  pub fn proxy_from_stream(&self, input: &mut InputStream) -> Result<Option<Proxy>, Error> {
    Ok(self.reference_from_stream(input)?.map(Proxy::from_reference))
  }

  fn reference_from_stream(&self, input: &mut InputStream) -> Result<Option<Reference>, Error> {
    let name: String = input.read_string()?;
    let category: String = input.read_string()?;

    if name.is_empty() {
      return Ok(None);
    }

    let identity: Identity = Identity::new(name, category)?;
    let facet: String = input.read_string()?;
    let mode: InvocationMode = InvocationMode::from_wire(input.read_byte()?)?;
    let secure: bool = input.read_bool()?;
    let prefer_secure: bool = input.read_bool()?;
    let encoding: EncodingVersion = EncodingVersion::new(input.read_byte()?, input.read_byte()?);

    let compress: Option<bool> = match input.read_byte()? {
      0 => None,
      1 => Some(false),
      2 => Some(true),
      other => {
        return Err(
          LocalException::marshal(format!("invalid compression discriminator {other}")).into(),
        );
      }
    };

    let cache_connection: bool = input.read_bool()?;
    let collocation_optimized: bool = input.read_bool()?;

    let endpoint_selection: EndpointSelection = match input.read_byte()? {
      0 => EndpointSelection::Random,
      1 => EndpointSelection::Ordered,
      other => {
        return Err(
          LocalException::marshal(format!("invalid endpoint selection discriminator {other}"))
            .into(),
        );
      }
    };

    let locator_cache_timeout: i32 = input.read_i32()?;
    let invocation_timeout: i32 = input.read_i32()?;
    let connection_id: String = input.read_string()?;

    let mut context: Context = Context::new();
    for _ in 0..input.read_size()? {
      let key: String = input.read_string()?;
      let entry: String = input.read_string()?;
      context.set(key, entry);
    }

    let mut endpoints: Vec<Endpoint> = Vec::new();
    for _ in 0..input.read_size()? {
      endpoints.push(Endpoint::stream_read(input)?);
    }

    let adapter_id: String = input.read_string()?;

    if !endpoints.is_empty() && !adapter_id.is_empty() {
      return Err(
        LocalException::marshal("reference carries both endpoints and an adapter id").into(),
      );
    }

    let locator: Option<Reference> = self.reference_from_stream(input)?;
    let router: Option<Reference> = self.reference_from_stream(input)?;

    let mut reference: Reference = Reference::create(self.clone(), identity)
      .change_facet(facet)
      .change_mode(mode)
      .change_secure(secure)
      .change_prefer_secure(prefer_secure)
      .change_encoding(encoding)
      .change_context(context)
      .change_cache_connection(cache_connection)
      .change_collocation_optimized(collocation_optimized)
      .change_endpoint_selection(endpoint_selection)
      .change_connection_id(connection_id)
      .change_locator_cache_timeout(locator_cache_timeout)?
      .change_invocation_timeout(invocation_timeout)?;

    if let Some(compress) = compress {
      reference = reference.change_compress(compress);
    }

    if !endpoints.is_empty() {
      reference = reference.change_endpoints(endpoints);
    } else if !adapter_id.is_empty() {
      reference = reference.change_adapter_id(adapter_id);
    }

    if let Some(locator) = locator {
      reference = reference.change_locator(Some(&Proxy::from_reference(locator)));
    }

    if let Some(router) = router {
      reference = reference.change_router(Some(&Proxy::from_reference(router)));
    }

    Ok(Some(reference))
  }

  // ---------------------------------------------------------------------------
  // Dispatch Collaborators
  // ---------------------------------------------------------------------------

  pub(crate) fn request_handler(
    &self,
    reference: &Reference,
    proxy: &Proxy,
  ) -> Result<StdArc<dyn RequestHandler>, Error> {
    match self.inner.factory.get() {
      Some(factory) => factory.request_handler(reference, proxy),
      None => Err(SystemException::new("no request handler factory installed").into()),
    }
  }

  pub(crate) fn locator_info(&self, locator: &Proxy) -> StdArc<LocatorInfo> {
    let mut table = self.inner.locators.lock();

    let info: &StdArc<LocatorInfo> = table
      .entry(locator.clone())
      .or_insert_with(|| StdArc::new(LocatorInfo::new(locator.clone())));

    StdArc::clone(info)
  }

  pub(crate) fn router_info(&self, router: &Proxy) -> StdArc<RouterInfo> {
    let mut table = self.inner.routers.lock();

    let info: &StdArc<RouterInfo> = table
      .entry(router.clone())
      .or_insert_with(|| StdArc::new(RouterInfo::new(router.clone())));

    StdArc::clone(info)
  }

  pub(crate) fn check_retry(
    &self,
    exception: &LocalException,
    reference: &Reference,
    cnt: &mut u32,
  ) -> Result<Duration, LocalException> {
    if self.is_destroyed() {
      return Err(exception.clone());
    }

    self.inner.retry.check_retry(exception, reference, cnt)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::proxy::Proxy;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;
  use crate::wire::InputStream;
  use crate::wire::OutputStream;

  fn runtime() -> Runtime {
    Runtime::new(RuntimeConfig::default())
  }

  #[test]
  fn test_destroy_is_sticky() {
    let runtime: Runtime = runtime();

    assert!(!runtime.is_destroyed());
    runtime.destroy();
    runtime.destroy();
    assert!(runtime.is_destroyed());
  }

  #[test]
  fn test_locator_info_is_canonical() {
    let runtime: Runtime = runtime();
    let locator: Proxy = runtime.proxy_from_string("locator : tcp -h ns1 -p 4061").unwrap();
    let equal: Proxy = runtime.proxy_from_string("locator : tcp -h ns1 -p 4061").unwrap();

    let lhs = runtime.locator_info(&locator);
    let rhs = runtime.locator_info(&equal);

    assert!(std::sync::Arc::ptr_eq(&lhs, &rhs));
  }

  #[test]
  fn test_stream_round_trip() {
    let runtime: Runtime = runtime();
    let source: Proxy = runtime
      .proxy_from_string(
        "billing/account -o -s -e 1.0 -P -z -c pool7 -u -S ordered -l 30 -i 5000 \
         -k trace=1 : tcp -h node1 -p 4061 -t 2500 : ssl -h node2 -p 4062",
      )
      .unwrap();

    let mut out: OutputStream = OutputStream::new();
    source.stream_write(&mut out);

    let mut input: InputStream = InputStream::new(out.finish());
    let decoded: Proxy = runtime.proxy_from_stream(&mut input).unwrap().expect("non-null");

    assert_eq!(decoded, source);
    assert_eq!(input.remaining(), 0);
  }

  #[test]
  fn test_stream_round_trip_with_locator() {
    let runtime: Runtime = runtime();
    let source: Proxy = runtime
      .proxy_from_string("account -L \"locator : tcp -h ns1 -p 4061 -t 60000\" @ Adapter")
      .unwrap();

    let mut out: OutputStream = OutputStream::new();
    source.stream_write(&mut out);

    let mut input: InputStream = InputStream::new(out.finish());
    let decoded: Proxy = runtime.proxy_from_stream(&mut input).unwrap().expect("non-null");

    assert_eq!(decoded, source);
  }

  #[test]
  fn test_null_proxy_reads_back_as_none() {
    let runtime: Runtime = runtime();

    let mut out: OutputStream = OutputStream::new();
    out.write_string("");
    out.write_string("");

    let mut input: InputStream = InputStream::new(out.finish());

    assert!(runtime.proxy_from_stream(&mut input).unwrap().is_none());
  }
}
