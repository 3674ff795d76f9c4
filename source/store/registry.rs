// Enforces "one open session per database path at a time" (see the concurrency-model section of
// the spec). redb itself would happily let two `Database` handles fight over the same file from
// one process; this registry is the in-process half of that guarantee, the same way the teacher's
// `Interruption` map in lib.rs uses a process-wide `Lazy<Mutex<...>>` to coordinate state that
// doesn't belong to any one `Database` value.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

static OPEN_PATHS: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

pub fn acquire(path: &Path) -> Result<()> {
  let canonical = path.to_path_buf();
  let mut open = OPEN_PATHS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
  if !open.insert(canonical) {
    return Err(Error::AlreadyOpen(path.to_path_buf()));
  }
  Ok(())
}

pub fn release(path: &Path) {
  let mut open = OPEN_PATHS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
  open.remove(path);
}
