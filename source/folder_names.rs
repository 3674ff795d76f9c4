// The folder-number indirection described in the data-model section of the spec: every mailbox
// name used anywhere in the database is interned into a small integer so that `F` and folder
// entries inside `B` records never repeat full names. Deleted slots are tombstoned rather than
// shifted, so existing folder-numbers embedded in conversation records stay valid.

use crate::codec::records::{self};
use crate::error::{Error, Result};

pub const FOLDER_NAMES_KEY: &str = "$FOLDER_NAMES";

#[derive(Debug, Default)]
pub struct FolderNameTable {
  names: Vec<Option<String>>,
  dirty: bool,
}

impl FolderNameTable {
  pub fn empty() -> Self {
    FolderNameTable { names: Vec::new(), dirty: false }
  }

  pub fn decode(raw: &str) -> Result<Self> {
    let names = records::decode_folder_names(FOLDER_NAMES_KEY, raw)?;
    Ok(FolderNameTable { names, dirty: false })
  }

  pub fn number_of(&self, name: &str) -> Option<u32> {
    self
      .names
      .iter()
      .position(|slot| slot.as_deref() == Some(name))
      .map(|i| i as u32)
  }

  pub fn name_of(&self, number: u32) -> Option<&str> {
    self.names.get(number as usize).and_then(|slot| slot.as_deref())
  }

  /// Returns the existing number for `name`, or interns it, reusing the lowest-numbered
  /// tombstoned slot so folder numbers stay as small and stable as possible.
  pub fn create(&mut self, name: &str) -> u32 {
    if let Some(number) = self.number_of(name) {
      return number;
    }
    self.dirty = true;
    if let Some(slot) = self.names.iter().position(Option::is_none) {
      self.names[slot] = Some(name.to_string());
      return slot as u32;
    }
    self.names.push(Some(name.to_string()));
    (self.names.len() - 1) as u32
  }

  pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
    let number = self
      .number_of(from)
      .ok_or_else(|| Error::InvalidIdentifier(from.to_string()))?;
    self.names[number as usize] = Some(to.to_string());
    self.dirty = true;
    Ok(())
  }

  pub fn delete(&mut self, name: &str) -> Result<()> {
    let number = self
      .number_of(name)
      .ok_or_else(|| Error::InvalidIdentifier(name.to_string()))?;
    self.names[number as usize] = None;
    self.dirty = true;
    Ok(())
  }

  pub fn clear(&mut self) {
    self.names.clear();
    self.dirty = true;
  }

  pub fn take_if_dirty(&mut self) -> Option<String> {
    if !self.dirty {
      return None;
    }
    self.dirty = false;
    Some(records::encode_folder_names(&self.names))
  }
}
