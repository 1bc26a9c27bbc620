use bytes::Buf;
use bytes::Bytes;

use crate::core::EncodingVersion;
use crate::error::LocalException;

/// Little-endian demarshalling cursor over received bytes.
#[derive(Clone, Debug)]
pub struct InputStream {
  buffer: Bytes,
}

impl InputStream {
  /// Creates a stream reading from `buffer`.
  #[inline]
  pub fn new(buffer: Bytes) -> Self {
    Self { buffer }
  }

  /// Returns the number of unread bytes.
  #[inline]
  pub fn remaining(&self) -> usize {
    self.buffer.len()
  }

  fn require(&self, count: usize) -> Result<(), LocalException> {
    if self.buffer.len() < count {
      return Err(LocalException::marshal(format!(
        "unexpected end of input: need {count} bytes, have {}",
        self.buffer.len(),
      )));
    }

    Ok(())
  }

  // ---------------------------------------------------------------------------
  // Primitives
  // ---------------------------------------------------------------------------

  /// Reads a single byte.
  pub fn read_byte(&mut self) -> Result<u8, LocalException> {
    self.require(1)?;

    Ok(self.buffer.get_u8())
  }

  /// Reads a boolean.
  pub fn read_bool(&mut self) -> Result<bool, LocalException> {
    match self.read_byte()? {
      0 => Ok(false),
      1 => Ok(true),
      other => Err(LocalException::marshal(format!("invalid boolean byte {other}"))),
    }
  }

  /// Reads a 32-bit integer.
  pub fn read_i32(&mut self) -> Result<i32, LocalException> {
    self.require(4)?;

    Ok(self.buffer.get_i32_le())
  }

  /// Reads a compact size.
  pub fn read_size(&mut self) -> Result<usize, LocalException> {
    let marker: u8 = self.read_byte()?;

    if marker < 255 {
      return Ok(usize::from(marker));
    }

    let extended: i32 = self.read_i32()?;

    usize::try_from(extended)
      .map_err(|_| LocalException::marshal(format!("negative size {extended}")))
  }

  /// Reads `count` raw bytes.
  pub fn read_raw(&mut self, count: usize) -> Result<Bytes, LocalException> {
    self.require(count)?;

    Ok(self.buffer.split_to(count))
  }

  /// Reads a size-prefixed UTF-8 string.
  pub fn read_string(&mut self) -> Result<String, LocalException> {
    let length: usize = self.read_size()?;
    let raw: Bytes = self.read_raw(length)?;

    String::from_utf8(raw.to_vec())
      .map_err(|error| LocalException::marshal(format!("invalid UTF-8 string: {error}")))
  }

  /// Reads a size-prefixed sequence of strings.
  pub fn read_string_seq(&mut self) -> Result<Vec<String>, LocalException> {
    let count: usize = self.read_size()?;
    let mut values: Vec<String> = Vec::with_capacity(count.min(64));

    for _ in 0..count {
      values.push(self.read_string()?);
    }

    Ok(values)
  }

  /// Reads an encapsulation, returning its encoding and a cursor over its
  /// body.
  pub fn read_encaps(&mut self) -> Result<(EncodingVersion, InputStream), LocalException> {
    let total: i32 = self.read_i32()?;
    let total: usize = usize::try_from(total)
      .ok()
      .filter(|total| *total >= super::ENCAPS_HEADER_LEN)
      .ok_or_else(|| LocalException::marshal(format!("invalid encapsulation size {total}")))?;

    let major: u8 = self.read_byte()?;
    let minor: u8 = self.read_byte()?;
    let body: Bytes = self.read_raw(total - super::ENCAPS_HEADER_LEN)?;

    Ok((EncodingVersion::new(major, minor), InputStream::new(body)))
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
