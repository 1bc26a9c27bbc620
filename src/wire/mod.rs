//! Little-endian primitive codec shared by built-in operation marshalling,
//! the reference wire form, and transport collaborators.
//!
//! Parameters travel inside *encapsulations*: a self-inclusive 32-bit byte
//! count, the encoding version, and the marshalled body. The codec knows
//! nothing about application types; generated stubs and collaborators
//! compose the primitives below.

mod input;
mod output;

pub use self::input::InputStream;
pub use self::output::OutputStream;

use bytes::Bytes;

use crate::core::EncodingVersion;

/// Byte count of an encapsulation header (size + encoding version).
pub const ENCAPS_HEADER_LEN: usize = 6;

/// Marshals an encapsulation whose body is produced by `write`.
pub fn encaps<F>(encoding: EncodingVersion, write: F) -> Bytes
where
  F: FnOnce(&mut OutputStream),
{
  let mut body: OutputStream = OutputStream::new();
  write(&mut body);

  let body: Bytes = body.finish();
  let mut out: OutputStream = OutputStream::with_capacity(ENCAPS_HEADER_LEN + body.len());
  out.write_encaps(encoding, &body);
  out.finish()
}

/// Marshals an encapsulation with an empty body.
#[inline]
pub fn empty_encaps(encoding: EncodingVersion) -> Bytes {
  encaps(encoding, |_| {})
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use bytes::Bytes;

  use crate::core::EncodingVersion;
  use crate::wire;
  use crate::wire::InputStream;

  #[test]
  fn test_empty_encaps() {
    let bytes: Bytes = wire::empty_encaps(EncodingVersion::V_1_1);

    assert_eq!(bytes.len(), wire::ENCAPS_HEADER_LEN);

    let mut input: InputStream = InputStream::new(bytes);
    let (encoding, inner) = input.read_encaps().unwrap();

    assert_eq!(encoding, EncodingVersion::V_1_1);
    assert_eq!(inner.remaining(), 0);
  }
}
