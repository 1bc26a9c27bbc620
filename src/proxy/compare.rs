use std::cmp::Ordering;

use crate::proxy::Proxy;

/// Compares two optional proxies by identity alone.
///
/// Absent handles order before present ones and compare equal to each
/// other. Facets, modes, and every other attribute are ignored; caches
/// keyed by target object use this order.
pub fn identity_cmp(lhs: Option<&Proxy>, rhs: Option<&Proxy>) -> Ordering {
  let lhs = lhs.map(Proxy::identity);
  let rhs = rhs.map(Proxy::identity);

  lhs.cmp(&rhs)
}

/// Returns `true` if two optional proxies share an identity.
#[inline]
pub fn identity_eq(lhs: Option<&Proxy>, rhs: Option<&Proxy>) -> bool {
  identity_cmp(lhs, rhs) == Ordering::Equal
}

/// Compares two optional proxies by identity, then facet.
pub fn identity_facet_cmp(lhs: Option<&Proxy>, rhs: Option<&Proxy>) -> Ordering {
  let lhs = lhs.map(|proxy| (proxy.identity(), proxy.facet()));
  let rhs = rhs.map(|proxy| (proxy.identity(), proxy.facet()));

  lhs.cmp(&rhs)
}

/// Returns `true` if two optional proxies share an identity and facet.
#[inline]
pub fn identity_facet_eq(lhs: Option<&Proxy>, rhs: Option<&Proxy>) -> bool {
  identity_facet_cmp(lhs, rhs) == Ordering::Equal
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
