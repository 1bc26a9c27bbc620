//! Stringified proxy grammar.
//!
//! A stringified proxy is an identity followed by option flags and an
//! optional addressing section:
//!
//! ```text
//! identity [-f facet] [-t|-o|-O|-d|-D] [-s] [-e M.m] [-P] [-z|-Z]
//!          [-c connection-id] [-u] [-n] [-S random|ordered] [-l seconds]
//!          [-i milliseconds] [-k key=value]... [-L locator] [-R router]
//!          [ : endpoint [ : endpoint]... | @ adapter-id ]
//! ```
//!
//! Words may be double-quoted; a backslash escapes the next character both
//! inside and outside quotes. Attributes equal to their defaults are
//! omitted when printing, so printing and re-parsing a proxy yields an
//! equal reference.

use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::fmt::Write;

use crate::core::Context;
use crate::core::EncodingVersion;
use crate::core::Endpoint;
use crate::core::EndpointSelection;
use crate::core::Identity;
use crate::core::InvocationMode;
use crate::core::Reference;
use crate::core::identity::unescape;
use crate::error::Error;
use crate::error::UsageError;
use crate::proxy::Proxy;
use crate::runtime::Runtime;

// -----------------------------------------------------------------------------
// Tokenizer
// -----------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Token {
  /// A word with its escapes preserved and quotes stripped.
  Word(String),
  /// An unquoted `:` introducing an endpoint section.
  Colon,
  /// An unquoted `@` introducing an adapter id.
  At,
}

fn tokenize(input: &str) -> Result<Vec<Token>, UsageError> {
  let mut tokens: Vec<Token> = Vec::new();
  let mut word: String = String::new();
  let mut has_word: bool = false;
  let mut in_quotes: bool = false;

  let mut flush = |word: &mut String, has_word: &mut bool, tokens: &mut Vec<Token>| {
    if *has_word {
      tokens.push(Token::Word(std::mem::take(word)));
      *has_word = false;
    }
  };

  let mut points = input.chars();

  while let Some(point) = points.next() {
    match point {
      '\\' => {
        let Some(escaped) = points.next() else {
          return Err(UsageError::proxy_parse("trailing escape"));
        };

        word.push('\\');
        word.push(escaped);
        has_word = true;
      }
      '"' => {
        in_quotes = !in_quotes;
        has_word = true;
      }
      ':' if !in_quotes => {
        flush(&mut word, &mut has_word, &mut tokens);
        tokens.push(Token::Colon);
      }
      '@' if !in_quotes => {
        flush(&mut word, &mut has_word, &mut tokens);
        tokens.push(Token::At);
      }
      point if !in_quotes && point.is_whitespace() => {
        flush(&mut word, &mut has_word, &mut tokens);
      }
      point => {
        word.push(point);
        has_word = true;
      }
    }
  }

  if in_quotes {
    return Err(UsageError::proxy_parse("unterminated quote"));
  }

  flush(&mut word, &mut has_word, &mut tokens);

  Ok(tokens)
}

// -----------------------------------------------------------------------------
// Word Printing
// -----------------------------------------------------------------------------

/// Escapes the characters significant inside a word.
pub(crate) fn escape(raw: &str) -> String {
  let mut output: String = String::with_capacity(raw.len());

  for point in raw.chars() {
    if matches!(point, '\\' | '"' | '=') {
      output.push('\\');
    }

    output.push(point);
  }

  output
}

/// Writes a pre-escaped word, quoting it when it contains characters
/// significant to the tokenizer.
pub(crate) fn write_word(f: &mut Formatter<'_>, escaped: &str) -> FmtResult {
  let quote: bool = escaped.is_empty()
    || escaped
      .chars()
      .any(|point| point.is_whitespace() || matches!(point, ':' | '@'));

  if quote {
    f.write_char('"')?;
    f.write_str(escaped)?;
    f.write_char('"')
  } else {
    f.write_str(escaped)
  }
}

/// Escapes and writes a raw word.
pub(crate) fn write_escaped_word(f: &mut Formatter<'_>, raw: &str) -> FmtResult {
  write_word(f, &escape(raw))
}

/// Splits a raw word at the first unescaped occurrence of `separator`.
fn split_unescaped(word: &str, separator: char) -> Option<(&str, &str)> {
  let mut escaped: bool = false;

  for (index, point) in word.char_indices() {
    if escaped {
      escaped = false;
    } else if point == '\\' {
      escaped = true;
    } else if point == separator {
      return Some((&word[..index], &word[index + separator.len_utf8()..]));
    }
  }

  None
}

// -----------------------------------------------------------------------------
// Proxy Grammar
// -----------------------------------------------------------------------------

pub(crate) fn proxy_string(runtime: &Runtime, input: &str) -> Result<Reference, Error> {
  let tokens: Vec<Token> = tokenize(input)?;
  let mut cursor = tokens.into_iter().peekable();

  let Some(Token::Word(identity)) = cursor.next() else {
    return Err(UsageError::proxy_parse("expected an identity").into());
  };

  let identity: Identity = identity.parse()?;
  let mut reference: Reference = Reference::create(runtime.clone(), identity);

  while let Some(Token::Word(_)) = cursor.peek() {
    let Some(Token::Word(option)) = cursor.next() else {
      unreachable!("peeked a word");
    };

    let mut value = |flag: &str| -> Result<String, UsageError> {
      match cursor.next() {
        Some(Token::Word(word)) => Ok(word),
        _ => Err(UsageError::proxy_parse(format!("missing value after `{flag}'"))),
      }
    };

    match option.as_str() {
      "-f" => reference = reference.change_facet(unescape(&value("-f")?)?),
      "-t" => reference = reference.change_mode(InvocationMode::Twoway),
      "-o" => reference = reference.change_mode(InvocationMode::Oneway),
      "-O" => reference = reference.change_mode(InvocationMode::BatchOneway),
      "-d" => reference = reference.change_mode(InvocationMode::Datagram),
      "-D" => reference = reference.change_mode(InvocationMode::BatchDatagram),
      "-s" => reference = reference.change_secure(true),
      "-e" => reference = reference.change_encoding(value("-e")?.parse::<EncodingVersion>()?),
      "-P" => reference = reference.change_prefer_secure(true),
      "-z" => reference = reference.change_compress(true),
      "-Z" => reference = reference.change_compress(false),
      "-c" => reference = reference.change_connection_id(unescape(&value("-c")?)?),
      "-u" => reference = reference.change_cache_connection(false),
      "-n" => reference = reference.change_collocation_optimized(false),
      "-S" => {
        let word: String = value("-S")?;

        let selection: EndpointSelection = match word.as_str() {
          "random" => EndpointSelection::Random,
          "ordered" => EndpointSelection::Ordered,
          _ => {
            return Err(
              UsageError::proxy_parse(format!("invalid endpoint selection `{word}'")).into(),
            );
          }
        };

        reference = reference.change_endpoint_selection(selection);
      }
      "-l" => {
        let word: String = value("-l")?;
        let timeout: i32 = word.parse().map_err(|_| {
          UsageError::proxy_parse(format!("invalid locator cache timeout `{word}'"))
        })?;

        reference = reference.change_locator_cache_timeout(timeout)?;
      }
      "-i" => {
        let word: String = value("-i")?;
        let timeout: i32 = word.parse().map_err(|_| {
          UsageError::proxy_parse(format!("invalid invocation timeout `{word}'"))
        })?;

        reference = reference.change_invocation_timeout(timeout)?;
      }
      "-k" => {
        let word: String = value("-k")?;

        let Some((key, entry)) = split_unescaped(&word, '=') else {
          return Err(
            UsageError::proxy_parse(format!("context entry `{word}' is missing `='")).into(),
          );
        };

        let mut context: Context = reference.context().clone();
        context.set(unescape(key)?, unescape(entry)?);
        reference = reference.change_context(context);
      }
      "-L" => {
        let nested: Reference = proxy_string(runtime, &unescape(&value("-L")?)?)?;
        reference = reference.change_locator(Some(&Proxy::from_reference(nested)));
      }
      "-R" => {
        let nested: Reference = proxy_string(runtime, &unescape(&value("-R")?)?)?;
        reference = reference.change_router(Some(&Proxy::from_reference(nested)));
      }
      other => {
        return Err(UsageError::proxy_parse(format!("unknown option `{other}'")).into());
      }
    }
  }

  match cursor.next() {
    None => Ok(reference),
    Some(Token::Colon) => {
      let mut endpoints: Vec<Endpoint> = Vec::new();
      let mut section: Vec<String> = Vec::new();

      for token in cursor {
        match token {
          Token::Word(word) => section.push(unescape(&word)?),
          Token::Colon => {
            endpoints.push(Endpoint::from_tokens(&section)?);
            section.clear();
          }
          Token::At => {
            return Err(
              UsageError::proxy_parse("`@' cannot follow an endpoint section").into(),
            );
          }
        }
      }

      endpoints.push(Endpoint::from_tokens(&section)?);

      Ok(reference.change_endpoints(endpoints))
    }
    Some(Token::At) => {
      let Some(Token::Word(adapter)) = cursor.next() else {
        return Err(UsageError::proxy_parse("expected an adapter id after `@'").into());
      };

      if cursor.next().is_some() {
        return Err(UsageError::proxy_parse("trailing input after adapter id").into());
      }

      Ok(reference.change_adapter_id(unescape(&adapter)?))
    }
    Some(Token::Word(_)) => unreachable!("option loop consumes all words"),
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::core::EncodingVersion;
  use crate::core::EndpointSelection;
  use crate::core::InvocationMode;
  use crate::core::Reference;
  use crate::core::Transport;
  use crate::error::Error;
  use crate::error::UsageError;
  use crate::runtime::Runtime;
  use crate::runtime::RuntimeConfig;

  fn parse(input: &str) -> Result<Reference, Error> {
    let runtime: Runtime = Runtime::new(RuntimeConfig::default());

    super::proxy_string(&runtime, input)
  }

  #[test]
  fn test_parse_direct_proxy() {
    let reference: Reference =
      parse("account -o -s : tcp -h node1 -p 4061 -t 2500 : ssl -h node2 -p 4062").unwrap();

    assert_eq!(reference.identity().name(), "account");
    assert_eq!(reference.mode(), InvocationMode::Oneway);
    assert!(reference.secure());
    assert_eq!(reference.endpoints().len(), 2);
    assert_eq!(reference.endpoints()[0].host(), "node1");
    assert_eq!(reference.endpoints()[1].transport(), Transport::Ssl);
  }

  #[test]
  fn test_parse_indirect_proxy() {
    let reference: Reference = parse("billing/account -t @ GreeterAdapter").unwrap();

    assert_eq!(reference.identity().category(), "billing");
    assert_eq!(reference.adapter_id(), "GreeterAdapter");
    assert!(reference.is_indirect());
  }

  #[test]
  fn test_parse_extended_options() {
    let reference: Reference =
      parse("account -t -e 1.0 -P -Z -c pool7 -u -n -S ordered -l 30 -i 5000 -k trace=1")
        .unwrap();

    assert_eq!(reference.encoding(), EncodingVersion::V_1_0);
    assert!(reference.prefer_secure());
    assert_eq!(reference.compress(), Some(false));
    assert_eq!(reference.connection_id(), "pool7");
    assert!(!reference.cache_connection());
    assert!(!reference.collocation_optimized());
    assert_eq!(reference.endpoint_selection(), EndpointSelection::Ordered);
    assert_eq!(reference.locator_cache_timeout(), 30);
    assert_eq!(reference.invocation_timeout(), 5000);
    assert_eq!(reference.context().get("trace"), Some("1"));
  }

  #[test]
  fn test_parse_quoted_ipv6_host() {
    let reference: Reference = parse("account : udp -h \"::1\" -p 4063").unwrap();

    assert_eq!(reference.endpoints()[0].host(), "::1");
  }

  #[test]
  fn test_parse_nested_locator() {
    let reference: Reference =
      parse("account -L \"locator -t : tcp -h ns1 -p 4061 -t 60000\" @ GreeterAdapter").unwrap();

    let info = reference.locator_info().expect("locator info");

    assert_eq!(info.get_locator().identity().name(), "locator");
  }

  #[test]
  fn test_parse_rejects_empty_input() {
    assert!(matches!(
      parse(""),
      Err(Error::Usage(UsageError::ProxyParse { .. })),
    ));
  }

  #[test]
  fn test_parse_rejects_unknown_option() {
    assert!(parse("account -q").is_err());
  }

  #[test]
  fn test_parse_rejects_adapter_after_endpoints() {
    assert!(parse("account : tcp -h node1 -p 4061 @ A").is_err());
  }

  #[test]
  fn test_round_trip_through_display() {
    let inputs: [&str; 4] = [
      "account -t : tcp -h node1 -p 4061 -t 2500 -z",
      "billing/account -o -s -e 1.0 @ GreeterAdapter",
      "\"my object\" -t -c pool7 -k trace=1 -k tenant=acme : ssl -h node2 -p 4062 -t infinite",
      "account -D -u -S ordered -i 250 : udp -h \"::1\" -p 4063 -t 60000",
    ];

    for input in inputs {
      let source: Reference = parse(input).unwrap();
      let reparsed: Reference = parse(&source.to_string()).unwrap();

      assert_eq!(reparsed, source, "round trip failed for `{input}'");
    }
  }
}
