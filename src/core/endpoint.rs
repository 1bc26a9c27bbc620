use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::consts;
use crate::error::LocalException;
use crate::error::UsageError;
use crate::wire::InputStream;
use crate::wire::OutputStream;

// -----------------------------------------------------------------------------
// @type - Transport
// -----------------------------------------------------------------------------

/// Transport protocol of an endpoint.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Transport {
  /// Plain TCP.
  Tcp,
  /// TLS over TCP.
  Ssl,
  /// UDP datagrams.
  Udp,
}

impl Transport {
  /// Returns the stringified-endpoint keyword of this transport.
  #[inline]
  pub const fn keyword(&self) -> &'static str {
    match self {
      Self::Tcp => "tcp",
      Self::Ssl => "ssl",
      Self::Udp => "udp",
    }
  }

  /// Returns `true` if the transport is encrypted.
  #[inline]
  pub const fn is_secure(&self) -> bool {
    matches!(self, Self::Ssl)
  }

  /// Returns `true` if the transport is unreliable.
  #[inline]
  pub const fn is_datagram(&self) -> bool {
    matches!(self, Self::Udp)
  }

  fn from_keyword(keyword: &str) -> Result<Self, UsageError> {
    match keyword {
      "tcp" => Ok(Self::Tcp),
      "ssl" => Ok(Self::Ssl),
      "udp" => Ok(Self::Udp),
      _ => Err(UsageError::proxy_parse(format!(
        "unknown endpoint transport `{keyword}'",
      ))),
    }
  }

  const fn to_wire(self) -> u8 {
    match self {
      Self::Tcp => 0,
      Self::Ssl => 1,
      Self::Udp => 2,
    }
  }

  fn from_wire(value: u8) -> Result<Self, LocalException> {
    match value {
      0 => Ok(Self::Tcp),
      1 => Ok(Self::Ssl),
      2 => Ok(Self::Udp),
      _ => Err(LocalException::marshal(format!(
        "invalid transport discriminator {value}",
      ))),
    }
  }
}

impl Display for Transport {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str(self.keyword())
  }
}

// -----------------------------------------------------------------------------
// @type - EndpointSelection
// -----------------------------------------------------------------------------

/// Tie-break strategy applied when several endpoints are viable.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum EndpointSelection {
  /// Pick a viable endpoint at random.
  Random,
  /// Try viable endpoints in declaration order.
  Ordered,
}

// -----------------------------------------------------------------------------
// @type - Endpoint
// -----------------------------------------------------------------------------

/// A directly addressable transport endpoint.
///
/// # String Form
///
/// Endpoints display as `tcp -h HOST -p PORT -t MS [-z]`, with `infinite`
/// replacing a disabled timeout and the host quoted when it contains
/// characters significant to the proxy grammar (an IPv6 literal, for
/// instance).
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Endpoint {
  transport: Transport,
  host: String,
  port: u16,
  timeout: i32,
  compress: bool,
}

impl Endpoint {
  /// Creates a new endpoint with the default timeout and no compression.
  pub fn new<T>(transport: Transport, host: T, port: u16) -> Self
  where
    T: Into<String>,
  {
    Self {
      transport,
      host: host.into(),
      port,
      timeout: consts::DEFAULT_ENDPOINT_TIMEOUT,
      compress: false,
    }
  }

  /// Returns the transport protocol.
  #[inline]
  pub const fn transport(&self) -> Transport {
    self.transport
  }

  /// Returns the host name or address.
  #[inline]
  pub fn host(&self) -> &str {
    self.host.as_str()
  }

  /// Returns the port number.
  #[inline]
  pub const fn port(&self) -> u16 {
    self.port
  }

  /// Returns the transport-level timeout in milliseconds, `-1` if disabled.
  #[inline]
  pub const fn timeout(&self) -> i32 {
    self.timeout
  }

  /// Returns `true` if payload compression is requested.
  #[inline]
  pub const fn compress(&self) -> bool {
    self.compress
  }

  /// Returns `true` if the endpoint uses an encrypted transport.
  #[inline]
  pub const fn is_secure(&self) -> bool {
    self.transport.is_secure()
  }

  /// Returns `true` if the endpoint uses an unreliable transport.
  #[inline]
  pub const fn is_datagram(&self) -> bool {
    self.transport.is_datagram()
  }

  /// Returns a copy of this endpoint with the given timeout.
  #[must_use]
  pub fn with_timeout(&self, timeout: i32) -> Self {
    Self {
      timeout,
      ..self.clone()
    }
  }

  /// Returns a copy of this endpoint with the given compression flag.
  #[must_use]
  pub fn with_compress(&self, compress: bool) -> Self {
    Self {
      compress,
      ..self.clone()
    }
  }

  // ---------------------------------------------------------------------------
  // String Form
  // ---------------------------------------------------------------------------

  /// Parses an endpoint from pre-tokenized words of a proxy string.
  pub(crate) fn from_tokens(tokens: &[String]) -> Result<Self, UsageError> {
    let Some((keyword, options)) = tokens.split_first() else {
      return Err(UsageError::proxy_parse("empty endpoint section"));
    };

    let transport: Transport = Transport::from_keyword(keyword)?;
    let mut host: Option<String> = None;
    let mut port: Option<u16> = None;
    let mut timeout: i32 = consts::DEFAULT_ENDPOINT_TIMEOUT;
    let mut compress: bool = false;

    let mut cursor = options.iter();

    while let Some(option) = cursor.next() {
      let mut value = |flag: &str| -> Result<String, UsageError> {
        cursor
          .next()
          .cloned()
          .ok_or_else(|| UsageError::proxy_parse(format!("missing value after `{flag}'")))
      };

      match option.as_str() {
        "-h" => host = Some(value("-h")?),
        "-p" => {
          let word: String = value("-p")?;

          port = Some(word.parse().map_err(|_| {
            UsageError::proxy_parse(format!("invalid port number `{word}'"))
          })?);
        }
        "-t" => {
          let word: String = value("-t")?;

          timeout = if word == "infinite" {
            consts::CONNECTION_TIMEOUT_INFINITE
          } else {
            word.parse().map_err(|_| {
              UsageError::proxy_parse(format!("invalid endpoint timeout `{word}'"))
            })?
          };
        }
        "-z" => compress = true,
        other => {
          return Err(UsageError::proxy_parse(format!(
            "unknown endpoint option `{other}'",
          )));
        }
      }
    }

    let host: String =
      host.ok_or_else(|| UsageError::proxy_parse("endpoint is missing `-h'"))?;
    let port: u16 = port.ok_or_else(|| UsageError::proxy_parse("endpoint is missing `-p'"))?;

    Ok(Self {
      transport,
      host,
      port,
      timeout,
      compress,
    })
  }

  // ---------------------------------------------------------------------------
  // Wire Form
  // ---------------------------------------------------------------------------

  pub(crate) fn stream_write(&self, out: &mut OutputStream) {
    out.write_byte(self.transport.to_wire());
    out.write_string(self.host.as_str());
    out.write_i32(i32::from(self.port));
    out.write_i32(self.timeout);
    out.write_bool(self.compress);
  }

  pub(crate) fn stream_read(input: &mut InputStream) -> Result<Self, LocalException> {
    let transport: Transport = Transport::from_wire(input.read_byte()?)?;
    let host: String = input.read_string()?;
    let port: i32 = input.read_i32()?;
    let timeout: i32 = input.read_i32()?;
    let compress: bool = input.read_bool()?;

    let port: u16 = u16::try_from(port)
      .map_err(|_| LocalException::marshal(format!("invalid port number {port}")))?;

    Ok(Self {
      transport,
      host,
      port,
      timeout,
      compress,
    })
  }
}

impl Display for Endpoint {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{} -h ", self.transport)?;
    crate::core::parse::write_escaped_word(f, self.host.as_str())?;
    write!(f, " -p {}", self.port)?;

    if self.timeout == consts::CONNECTION_TIMEOUT_INFINITE {
      f.write_str(" -t infinite")?;
    } else {
      write!(f, " -t {}", self.timeout)?;
    }

    if self.compress {
      f.write_str(" -z")?;
    }

    Ok(())
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::core::Endpoint;
  use crate::core::Transport;
  use crate::error::UsageError;
  use crate::wire::InputStream;
  use crate::wire::OutputStream;

  fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| (*word).to_owned()).collect()
  }

  #[test]
  fn test_from_tokens() {
    let endpoint: Endpoint =
      Endpoint::from_tokens(&tokens(&["tcp", "-h", "node1", "-p", "4061", "-t", "2500", "-z"]))
        .unwrap();

    assert_eq!(endpoint.transport(), Transport::Tcp);
    assert_eq!(endpoint.host(), "node1");
    assert_eq!(endpoint.port(), 4061);
    assert_eq!(endpoint.timeout(), 2500);
    assert!(endpoint.compress());
  }

  #[test]
  fn test_from_tokens_rejects_missing_host() {
    let result: Result<Endpoint, UsageError> =
      Endpoint::from_tokens(&tokens(&["tcp", "-p", "4061"]));

    assert!(matches!(result, Err(UsageError::ProxyParse { .. })));
  }

  #[test]
  fn test_display() {
    let endpoint: Endpoint = Endpoint::new(Transport::Ssl, "node1", 4062).with_timeout(-1);

    assert_eq!(endpoint.to_string(), "ssl -h node1 -p 4062 -t infinite");
  }

  #[test]
  fn test_display_quotes_ipv6_host() {
    let endpoint: Endpoint = Endpoint::new(Transport::Udp, "::1", 4063);

    assert_eq!(endpoint.to_string(), "udp -h \"::1\" -p 4063 -t 60000");
  }

  #[test]
  fn test_stream_round_trip() {
    let source: Endpoint = Endpoint::new(Transport::Tcp, "node1", 4061).with_compress(true);

    let mut out: OutputStream = OutputStream::new();
    source.stream_write(&mut out);

    let mut input: InputStream = InputStream::new(out.finish());
    let decoded: Endpoint = Endpoint::stream_read(&mut input).unwrap();

    assert_eq!(decoded, source);
  }

  #[test]
  fn test_secure_discriminator() {
    assert!(Endpoint::new(Transport::Ssl, "a", 1).is_secure());
    assert!(!Endpoint::new(Transport::Tcp, "a", 1).is_secure());
    assert!(Endpoint::new(Transport::Udp, "a", 1).is_datagram());
  }
}
