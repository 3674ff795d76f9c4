// The transactional key-value facade every other module is built on (see the store-facade
// section of the spec): one shared redb table, disambiguated purely by key prefix, wrapped in a
// single long-lived write transaction per open session. Grounded on the teacher's
// `notmuch::Database<S>` (source/notmuch/mod.rs), which wraps begin_atomic/end_atomic the same
// way this wraps redb's begin_write/commit, and on the redb usage pattern in
// hunterclarke-cosmos's `RedbMailStore` (examples/other_examples) for the table/transaction API
// itself, since the teacher's own database is notmuch/Xapian over FFI rather than an embedded
// pure-Rust store.

use std::path::{Path, PathBuf};

use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::config::Config;
use crate::counted_flags::CountedFlags;
use crate::error::{Error, Result};
use crate::folder_names::FolderNameTable;

use super::registry;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

pub(crate) const FOLDER_NAMES_KEY: &str = "$FOLDER_NAMES";
pub(crate) const COUNTED_FLAGS_KEY: &str = "$COUNTED_FLAGS";

pub struct Session {
  path: PathBuf,
  #[allow(dead_code)]
  database: redb::Database,
  txn: Option<redb::WriteTransaction>,
  open: bool,
  pub(crate) folder_names: FolderNameTable,
  pub(crate) counted_flags: CountedFlags,
}

fn read_utf8<'a>(key: &str, bytes: &'a [u8]) -> Result<&'a str> {
  std::str::from_utf8(bytes).map_err(|_| Error::bad_format(key, "not valid utf-8"))
}

impl Session {
  /// Opens (creating if absent) the database at `path`, failing with `AlreadyOpen` if another
  /// session in this process already holds it.
  pub fn open_path(path: impl AsRef<Path>, config: &Config) -> Result<Session> {
    let path = path.as_ref();
    registry::acquire(path)?;
    let result = Self::open_locked(path, config);
    if result.is_err() {
      registry::release(path);
    }
    result
  }

  fn open_locked(path: &Path, config: &Config) -> Result<Session> {
    let database = redb::Database::create(path)?;
    let txn = database.begin_write()?;
    txn.open_table(TABLE)?;

    let folder_names = match txn.open_table(TABLE)?.get(FOLDER_NAMES_KEY)? {
      Some(value) => FolderNameTable::decode(read_utf8(FOLDER_NAMES_KEY, value.value())?)?,
      None => FolderNameTable::empty(),
    };
    let counted_flags = match txn.open_table(TABLE)?.get(COUNTED_FLAGS_KEY)? {
      Some(value) => CountedFlags::decode(read_utf8(COUNTED_FLAGS_KEY, value.value())?),
      None => CountedFlags::from_config(&config.counted_flags),
    };

    Ok(Session {
      path: path.to_path_buf(),
      database,
      txn: Some(txn),
      open: true,
      folder_names,
      counted_flags,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// The interned folder-name table loaded from `$FOLDER_NAMES`. Callers updating conversation
  /// folder membership (via `conversation::Conversation::apply_delta`) mutate this copy; it's
  /// flushed back automatically on `commit`.
  pub fn folder_names(&self) -> &FolderNameTable {
    &self.folder_names
  }

  pub fn folder_names_mut(&mut self) -> &mut FolderNameTable {
    &mut self.folder_names
  }

  pub fn counted_flags(&self) -> &CountedFlags {
    &self.counted_flags
  }

  pub fn counted_flags_mut(&mut self) -> &mut CountedFlags {
    &mut self.counted_flags
  }

  fn txn(&self) -> Result<&redb::WriteTransaction> {
    self
      .txn
      .as_ref()
      .ok_or_else(|| Error::internal("session has no active transaction"))
  }

  pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let table = self.txn()?.open_table(TABLE)?;
    Ok(table.get(key)?.map(|value| value.value().to_vec()))
  }

  pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
    let mut table = self.txn()?.open_table(TABLE)?;
    table.insert(key, value)?;
    Ok(())
  }

  pub fn delete(&self, key: &str) -> Result<()> {
    let mut table = self.txn()?.open_table(TABLE)?;
    table.remove(key)?;
    Ok(())
  }

  /// Visits every record whose key starts with `prefix`, in key order, stopping early if `f`
  /// returns a nonzero value (matching the teacher's notmuch foreach-with-stop convention).
  pub fn foreach<F>(&self, prefix: char, mut f: F) -> Result<()>
  where
    F: FnMut(&str, &[u8]) -> Result<i32>,
  {
    let table = self.txn()?.open_table(TABLE)?;
    let start = prefix.to_string();
    for entry in table.range(start.as_str()..)? {
      let (key, value) = entry?;
      let key = key.value();
      if !key.starts_with(prefix) {
        break;
      }
      if f(key, value.value())? != 0 {
        break;
      }
    }
    Ok(())
  }

  /// Visits every record in the table, in key order, regardless of prefix. Used by dump/undump
  /// and by `wipe_counts`'s teardown.
  pub fn for_each<F>(&self, mut f: F) -> Result<()>
  where
    F: FnMut(&str, &[u8]) -> Result<()>,
  {
    let table = self.txn()?.open_table(TABLE)?;
    for entry in table.iter()? {
      let (key, value) = entry?;
      f(key.value(), value.value())?;
    }
    Ok(())
  }

  fn save_caches(&mut self) -> Result<()> {
    if let Some(encoded) = self.folder_names.take_if_dirty() {
      self.put(FOLDER_NAMES_KEY, encoded.as_bytes())?;
    }
    if let Some(encoded) = self.counted_flags.take_if_dirty() {
      self.put(COUNTED_FLAGS_KEY, encoded.as_bytes())?;
    }
    Ok(())
  }

  /// Commits every write made since `open_path`. The only other way to end a session is
  /// `abort`, or dropping it, which aborts implicitly.
  pub fn commit(mut self) -> Result<()> {
    self.save_caches()?;
    if let Some(txn) = self.txn.take() {
      txn.commit()?;
    }
    self.open = false;
    registry::release(&self.path);
    Ok(())
  }

  /// Discards every write made since `open_path`.
  pub fn abort(mut self) {
    if let Some(txn) = self.txn.take() {
      let _ = txn.abort();
    }
    self.open = false;
    registry::release(&self.path);
  }
}

impl Drop for Session {
  fn drop(&mut self) {
    if self.open {
      log::warn!("session for {:?} dropped without commit or abort, discarding writes", self.path);
      if let Some(txn) = self.txn.take() {
        let _ = txn.abort();
      }
      registry::release(&self.path);
    }
  }
}
