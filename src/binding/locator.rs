use hashbrown::HashMap;
use parking_lot::Mutex;
use std::time::Duration;
use std::time::Instant;

use crate::core::Endpoint;
use crate::core::Identity;
use crate::proxy::Proxy;
use crate::types::Reference;

// -----------------------------------------------------------------------------
// Cache Key
// -----------------------------------------------------------------------------

/// Resolution cache key: an adapter id, or the identity for a well-known
/// reference.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
enum CacheKey {
  Adapter(String),
  WellKnown(Identity),
}

impl CacheKey {
  fn of(reference: &Reference) -> Self {
    if reference.adapter_id().is_empty() {
      Self::WellKnown(reference.identity().clone())
    } else {
      Self::Adapter(reference.adapter_id().to_owned())
    }
  }
}

#[derive(Debug)]
struct CacheEntry {
  endpoints: Vec<Endpoint>,
  resolved: Instant,
}

// -----------------------------------------------------------------------------
// @api - LocatorInfo
// -----------------------------------------------------------------------------

/// Canonical handle to a locator binding.
///
/// The runtime hands out one `LocatorInfo` per distinct locator proxy, so
/// references bound to the same locator share a pointer-identical handle
/// and reference equality can compare handles by address.
///
/// The handle owns the resolution cache: resolution collaborators store
/// the endpoints they obtained for an adapter id (or well-known identity)
/// with [`insert_endpoints`][LocatorInfo::insert_endpoints] and consult
/// [`get_endpoints`][LocatorInfo::get_endpoints], which honors the
/// reference's locator cache timeout. Retry classification invalidates an
/// entry through [`clear_cache`][LocatorInfo::clear_cache] once a failure
/// proves the binding stale. The resolution protocol itself is out of
/// scope for the proxy core.
#[derive(Debug)]
pub struct LocatorInfo {
  locator: Proxy,
  cache: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl LocatorInfo {
  pub(crate) fn new(locator: Proxy) -> Self {
    Self {
      locator,
      cache: Mutex::new(HashMap::new()),
    }
  }

  /// Returns the locator proxy behind this handle.
  #[inline]
  pub fn get_locator(&self) -> &Proxy {
    &self.locator
  }

  /// Returns the cached endpoints resolved for `reference`, if still
  /// fresh.
  ///
  /// Freshness follows the reference's locator cache timeout: `-1` never
  /// expires, `0` bypasses the cache entirely, and a positive value bounds
  /// the entry age in seconds.
  pub fn get_endpoints(&self, reference: &Reference) -> Option<Vec<Endpoint>> {
    let timeout: i32 = reference.locator_cache_timeout();

    if timeout == 0 {
      return None;
    }

    let cache = self.cache.lock();
    let entry: &CacheEntry = cache.get(&CacheKey::of(reference))?;

    if timeout > 0 && entry.resolved.elapsed() >= Duration::from_secs(timeout as u64) {
      return None;
    }

    Some(entry.endpoints.clone())
  }

  /// Stores the endpoints a resolution collaborator obtained for
  /// `reference`, replacing any previous entry.
  pub fn insert_endpoints(&self, reference: &Reference, endpoints: Vec<Endpoint>) {
    let entry: CacheEntry = CacheEntry {
      endpoints,
      resolved: Instant::now(),
    };

    self.cache.lock().insert(CacheKey::of(reference), entry);
  }

  /// Drops the cached resolution of `reference`, forcing the next
  /// invocation to resolve again.
  pub fn clear_cache(&self, reference: &Reference) {
    if self.cache.lock().remove(&CacheKey::of(reference)).is_some() {
      tracing::debug!(
        adapter_id = reference.adapter_id(),
        identity = %reference.identity(),
        "cleared locator cache entry",
      );
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::binding::LocatorInfo;
  use crate::core::Endpoint;
  use crate::core::Reference;
  use crate::core::Transport;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;

  fn reference(input: &str) -> Reference {
    Runtime::new(RuntimeConfig::default())
      .proxy_from_string(input)
      .unwrap()
      .reference()
      .clone()
  }

  fn info() -> LocatorInfo {
    let locator: Reference = reference("locator : tcp -h ns1 -p 4061");

    LocatorInfo::new(crate::proxy::Proxy::from_reference(locator))
  }

  fn endpoints() -> Vec<Endpoint> {
    vec![Endpoint::new(Transport::Tcp, "node1", 4061)]
  }

  #[test]
  fn test_insert_and_get() {
    let info: LocatorInfo = info();
    let indirect: Reference = reference("account @ GreeterAdapter");

    assert!(info.get_endpoints(&indirect).is_none());

    info.insert_endpoints(&indirect, endpoints());

    assert_eq!(info.get_endpoints(&indirect), Some(endpoints()));
  }

  #[test]
  fn test_zero_timeout_bypasses_cache() {
    let info: LocatorInfo = info();
    let indirect: Reference = reference("account -l 0 @ GreeterAdapter");

    info.insert_endpoints(&indirect, endpoints());

    assert!(info.get_endpoints(&indirect).is_none());
  }

  #[test]
  fn test_positive_timeout_serves_fresh_entry() {
    let info: LocatorInfo = info();
    let indirect: Reference = reference("account -l 30 @ GreeterAdapter");

    info.insert_endpoints(&indirect, endpoints());

    assert_eq!(info.get_endpoints(&indirect), Some(endpoints()));
  }

  #[test]
  fn test_clear_cache_removes_entry() {
    let info: LocatorInfo = info();
    let indirect: Reference = reference("account @ GreeterAdapter");

    info.insert_endpoints(&indirect, endpoints());
    info.clear_cache(&indirect);

    assert!(info.get_endpoints(&indirect).is_none());
  }

  #[test]
  fn test_adapter_and_well_known_keys_are_distinct() {
    let info: LocatorInfo = info();
    let adapter: Reference = reference("account @ GreeterAdapter");
    let well_known: Reference = reference("account");

    info.insert_endpoints(&adapter, endpoints());

    assert!(info.get_endpoints(&well_known).is_none());
    assert!(info.get_endpoints(&adapter).is_some());
  }
}
