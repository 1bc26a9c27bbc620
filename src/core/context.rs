use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

/// Ordered per-proxy request context propagated to the server.
///
/// A context travels with every request derived from the owning proxy. An
/// invocation may override it by passing an explicit context to the
/// operation; absence of an override is expressed by the caller passing
/// `None`, not by a shared sentinel value.
///
/// ```
/// use mizar::types::Context;
///
/// let mut context: Context = Context::new();
/// context.set("trace", "1");
///
/// assert_eq!(context.get("trace"), Some("1"));
/// assert_eq!(context.len(), 1);
/// ```
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Context {
  entries: BTreeMap<String, String>,
}

impl Context {
  /// Creates an empty context.
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the value stored under `key`, if any.
  #[inline]
  pub fn get(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }

  /// Stores `value` under `key`, returning the previous value.
  #[inline]
  pub fn set<K, V>(&mut self, key: K, value: V) -> Option<String>
  where
    K: Into<String>,
    V: Into<String>,
  {
    self.entries.insert(key.into(), value.into())
  }

  /// Returns the number of entries.
  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` if the context has no entries.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Returns an iterator over the entries in key order.
  #[inline]
  pub fn iter(&self) -> Iter<'_, String, String> {
    self.entries.iter()
  }
}

impl From<BTreeMap<String, String>> for Context {
  #[inline]
  fn from(entries: BTreeMap<String, String>) -> Self {
    Self { entries }
  }
}

impl<K, V> FromIterator<(K, V)> for Context
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<T>(iterator: T) -> Self
  where
    T: IntoIterator<Item = (K, V)>,
  {
    Self {
      entries: iterator
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect(),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
