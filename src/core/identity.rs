use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

use crate::error::UsageError;

/// Identity of a remote object: a non-empty name qualified by a category.
///
/// The category groups objects for locator resolution and defaults to the
/// empty string. The name is never empty in a constructed identity.
///
/// # String Form
///
/// Identities display as `name` or `category/name`, with `/` and `\`
/// escaped by a backslash inside either part:
///
/// ```
/// use mizar::types::Identity;
///
/// let plain: Identity = Identity::new("account", "").unwrap();
/// let scoped: Identity = Identity::new("a/b", "billing").unwrap();
///
/// assert_eq!(plain.to_string(), "account");
/// assert_eq!(scoped.to_string(), "billing/a\\/b");
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Identity {
  name: String,
  category: String,
}

impl Identity {
  /// Creates a new identity.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalIdentity`] if `name` is empty.
  pub fn new<N, C>(name: N, category: C) -> Result<Self, UsageError>
  where
    N: Into<String>,
    C: Into<String>,
  {
    let name: String = name.into();

    if name.is_empty() {
      return Err(UsageError::IllegalIdentity);
    }

    Ok(Self {
      name,
      category: category.into(),
    })
  }

  /// Returns the object name.
  #[inline]
  pub fn name(&self) -> &str {
    self.name.as_str()
  }

  /// Returns the object category.
  #[inline]
  pub fn category(&self) -> &str {
    self.category.as_str()
  }
}

impl Display for Identity {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    if !self.category.is_empty() {
      write_escaped(f, self.category.as_str())?;
      f.write_str("/")?;
    }

    write_escaped(f, self.name.as_str())
  }
}

impl FromStr for Identity {
  type Err = UsageError;

  /// Parses an identity from its escaped `category/name` form.
  ///
  /// # Errors
  ///
  /// Returns [`UsageError::IllegalIdentity`] for an empty name and
  /// [`UsageError::ProxyParse`] for malformed escapes or multiple
  /// unescaped separators.
  fn from_str(input: &str) -> Result<Self, Self::Err> {
    let mut separator: Option<usize> = None;
    let mut escaped: bool = false;

    for (index, point) in input.char_indices() {
      if escaped {
        escaped = false;
      } else if point == '\\' {
        escaped = true;
      } else if point == '/' {
        if separator.is_some() {
          return Err(UsageError::proxy_parse(format!(
            "unescaped `/' appears twice in identity `{input}'",
          )));
        }

        separator = Some(index);
      }
    }

    if escaped {
      return Err(UsageError::proxy_parse(format!(
        "trailing escape in identity `{input}'",
      )));
    }

    match separator {
      Some(index) => {
        let category: String = unescape(&input[..index])?;
        let name: String = unescape(&input[index + 1..])?;

        Self::new(name, category)
      }
      None => Self::new(unescape(input)?, ""),
    }
  }
}

// -----------------------------------------------------------------------------
// Escaping
// -----------------------------------------------------------------------------

fn write_escaped(f: &mut Formatter<'_>, part: &str) -> FmtResult {
  for point in part.chars() {
    if matches!(point, '/' | '\\' | '"') {
      f.write_str("\\")?;
    }

    std::fmt::Write::write_char(f, point)?;
  }

  Ok(())
}

pub(crate) fn unescape(part: &str) -> Result<String, UsageError> {
  let mut output: String = String::with_capacity(part.len());
  let mut escaped: bool = false;

  for point in part.chars() {
    if escaped {
      output.push(point);
      escaped = false;
    } else if point == '\\' {
      escaped = true;
    } else {
      output.push(point);
    }
  }

  if escaped {
    return Err(UsageError::proxy_parse(format!("trailing escape in `{part}'")));
  }

  Ok(output)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
