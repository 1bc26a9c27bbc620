use crate::proxy::Proxy;

/// Canonical handle to a router binding.
///
/// As with [`LocatorInfo`][crate::binding::LocatorInfo], the runtime hands
/// out one `RouterInfo` per distinct router proxy so reference equality can
/// compare handles by address. Routed connection establishment is out of
/// scope for the proxy core.
#[derive(Debug)]
pub struct RouterInfo {
  router: Proxy,
}

impl RouterInfo {
  pub(crate) fn new(router: Proxy) -> Self {
    Self { router }
  }

  /// Returns the router proxy behind this handle.
  #[inline]
  pub fn get_router(&self) -> &Proxy {
    &self.router
  }
}
