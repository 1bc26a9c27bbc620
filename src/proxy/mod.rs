//! The client-side proxy handle.
//!
//! A [`Proxy`] wraps an immutable [`Reference`][crate::types::Reference]
//! together with two lazily bound, mutex-guarded cache slots: the request
//! handler and the batch request queue. Cloning a proxy shares the slots;
//! deriving a proxy (any `with_*` method) produces a fresh handle with
//! empty slots, or returns `self` when the derived reference equals the
//! current one.
//!
//! ```
//! use mizar::proxy::Proxy;
//! use mizar::runtime::Runtime;
//! use mizar::runtime::RuntimeConfig;
//!
//! let runtime: Runtime = Runtime::new(RuntimeConfig::default());
//! let proxy: Proxy = runtime
//!   .proxy_from_string("account : tcp -h node1 -p 4061")
//!   .unwrap();
//!
//! // Deriving with the current value shares the handle.
//! assert!(proxy.with_secure(proxy.is_secure()).ptr_eq(&proxy));
//!
//! // Deriving with a new value leaves the original untouched.
//! let secure: Proxy = proxy.with_secure(true);
//! assert!(secure.is_secure());
//! assert!(!proxy.is_secure());
//! ```

mod builtin;
mod compare;
mod handle;

pub use self::compare::identity_cmp;
pub use self::compare::identity_eq;
pub use self::compare::identity_facet_cmp;
pub use self::compare::identity_facet_eq;
pub use self::handle::Proxy;
