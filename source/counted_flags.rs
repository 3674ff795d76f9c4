// The list of flags whose per-conversation occurrence counts are tracked (see the conversation
// aggregate section of the spec). Stored as a plain whitespace-separated string rather than the
// list format the other records use, since it's a flat, rarely-changed list of barewords.

use crate::codec::records;

#[derive(Debug, Default)]
pub struct CountedFlags {
  flags: Vec<String>,
  dirty: bool,
}

impl CountedFlags {
  pub fn decode(raw: &str) -> Self {
    CountedFlags { flags: records::decode_counted_flags(raw), dirty: false }
  }

  /// Used the first time a database is opened: there's no stored record yet, so the configured
  /// list becomes the initial one and needs to be written back.
  pub fn from_config(flags: &[String]) -> Self {
    CountedFlags { flags: flags.to_vec(), dirty: true }
  }

  pub fn flags(&self) -> &[String] {
    &self.flags
  }

  pub fn len(&self) -> usize {
    self.flags.len()
  }

  pub fn is_empty(&self) -> bool {
    self.flags.is_empty()
  }

  pub fn index_of(&self, flag: &str) -> Option<usize> {
    self.flags.iter().position(|f| f == flag)
  }

  pub fn reset(&mut self, flags: &[String]) {
    self.flags = flags.to_vec();
    self.dirty = true;
  }

  pub fn take_if_dirty(&mut self) -> Option<String> {
    if !self.dirty {
      return None;
    }
    self.dirty = false;
    Some(records::encode_counted_flags(&self.flags))
  }
}
