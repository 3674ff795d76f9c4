use crate::error::{Error, Result};
use std::fmt;

/// A conversation identifier: 64-bit, opaque, unique per user. Zero is the null conversation.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cid(u64);

impl Cid {
  pub const NULL: Cid = Cid(0);

  pub fn new(value: u64) -> Self {
    Cid(value)
  }

  pub fn value(&self) -> u64 {
    self.0
  }

  pub fn is_null(&self) -> bool {
    self.0 == 0
  }

  /// Lowercase 16-hex-digit text, or the literal `NIL` when null.
  pub fn encode(&self) -> String {
    match self.0 {
      0 => "NIL".to_string(),
      value => format!("{value:016x}"),
    }
  }

  /// Accepts either `NIL` or 16-hex-digit text (decoding is lenient on digit count; encoding
  /// always emits exactly 16).
  pub fn decode(text: &str) -> Result<Cid> {
    if text == "NIL" {
      return Ok(Cid(0));
    }
    u64::from_str_radix(text, 16)
      .map(Cid)
      .map_err(|_| Error::bad_format("cid", format!("{text:?} isn't NIL or hex")))
  }
}

impl fmt::Debug for Cid {
  fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(formatter, "Cid({})", self.encode())
  }
}

impl fmt::Display for Cid {
  fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(formatter, "{}", self.encode())
  }
}
