use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::core::EncodingVersion;

/// Growable little-endian marshalling buffer.
#[derive(Debug, Default)]
pub struct OutputStream {
  buffer: BytesMut,
}

impl OutputStream {
  /// Creates an empty stream.
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an empty stream with at least `capacity` bytes reserved.
  #[inline]
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      buffer: BytesMut::with_capacity(capacity),
    }
  }

  /// Returns the number of bytes written so far.
  #[inline]
  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  /// Returns `true` if nothing has been written.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  /// Consumes the stream and returns the marshalled bytes.
  #[inline]
  pub fn finish(self) -> Bytes {
    self.buffer.freeze()
  }

  // ---------------------------------------------------------------------------
  // Primitives
  // ---------------------------------------------------------------------------

  /// Writes a single byte.
  #[inline]
  pub fn write_byte(&mut self, value: u8) {
    self.buffer.put_u8(value);
  }

  /// Writes a boolean as a single byte.
  #[inline]
  pub fn write_bool(&mut self, value: bool) {
    self.buffer.put_u8(u8::from(value));
  }

  /// Writes a 32-bit integer.
  #[inline]
  pub fn write_i32(&mut self, value: i32) {
    self.buffer.put_i32_le(value);
  }

  /// Writes a compact size.
  ///
  /// Sizes below 255 occupy one byte; larger sizes occupy five.
  pub fn write_size(&mut self, value: usize) {
    if value < 255 {
      self.buffer.put_u8(value as u8);
    } else {
      self.buffer.put_u8(255);
      self.buffer.put_i32_le(value as i32);
    }
  }

  /// Writes raw bytes without a length prefix.
  #[inline]
  pub fn write_raw(&mut self, value: &[u8]) {
    self.buffer.put_slice(value);
  }

  /// Writes a size-prefixed UTF-8 string.
  pub fn write_string(&mut self, value: &str) {
    self.write_size(value.len());
    self.buffer.put_slice(value.as_bytes());
  }

  /// Writes a size-prefixed sequence of strings.
  pub fn write_string_seq(&mut self, values: &[String]) {
    self.write_size(values.len());

    for value in values {
      self.write_string(value.as_str());
    }
  }

  /// Writes an encapsulation: a self-inclusive byte count, the encoding
  /// version, and the pre-marshalled body.
  pub fn write_encaps(&mut self, encoding: EncodingVersion, body: &[u8]) {
    self.write_i32((super::ENCAPS_HEADER_LEN + body.len()) as i32);
    self.write_byte(encoding.major());
    self.write_byte(encoding.minor());
    self.write_raw(body);
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use bytes::Bytes;

  use crate::wire::OutputStream;

  #[test]
  fn test_write_size_compact() {
    let mut out: OutputStream = OutputStream::new();
    out.write_size(7);

    assert_eq!(out.finish(), Bytes::from_static(&[7]));
  }

  #[test]
  fn test_write_size_extended() {
    let mut out: OutputStream = OutputStream::new();
    out.write_size(300);

    assert_eq!(out.finish(), Bytes::from_static(&[255, 44, 1, 0, 0]));
  }

  #[test]
  fn test_write_string() {
    let mut out: OutputStream = OutputStream::new();
    out.write_string("ok");

    assert_eq!(out.finish(), Bytes::from_static(&[2, b'o', b'k']));
  }
}
