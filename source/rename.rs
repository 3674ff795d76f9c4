// Renaming operations (see the cid-rename and folder-rename sections of the spec): conversation-id
// merges, used when two previously separate conversations turn out to be the same thread and need
// to be merged under the lower-numbered id; and folder renames/deletes, which only ever touch the
// `$FOLDER_NAMES` slot and the folder's own `F` status record, never the conversations that
// reference the folder by number.

use crate::cid::Cid;
use crate::codec::records;
use crate::conversation::{folder_status_key, record_key};
use crate::error::{Error, Result};
use crate::folder_names::FolderNameTable;
use crate::store::session::Session;

/// Rewrites every `<` record pointing at `from` to point at `to` and invokes `callback` once per
/// folder the conversation appears in, in ascending folder-number order, for determinism. Returns
/// the number of msgid records rewritten.
pub fn rename_cid<F>(
  session: &Session,
  folder_table: &FolderNameTable,
  from: Cid,
  to: Cid,
  now: u64,
  mut callback: F,
) -> Result<u64>
where
  F: FnMut(&str, Cid, Cid) -> Result<()>,
{
  if from.is_null() || to.is_null() {
    return Err(Error::InvalidIdentifier(
      "cid rename requires two non-null cids".to_string(),
    ));
  }
  if from >= to {
    return Err(Error::InvalidIdentifier(format!(
      "rename requires from ({from}) < to ({to})"
    )));
  }

  let mut to_update = Vec::new();
  session.foreach('<', |key, value| {
    let text = std::str::from_utf8(value).map_err(|_| Error::bad_format(key, "not valid utf-8"))?;
    let (cid, _stamp) = records::decode_msgid(key, text)?;
    if cid == from {
      to_update.push(key.to_string());
    }
    Ok(0)
  })?;
  for key in &to_update {
    session.put(key, records::encode_msgid(to, now).as_bytes())?;
  }

  let key = record_key(from);
  if let Some(bytes) = session.get(&key)? {
    let text = std::str::from_utf8(&bytes).map_err(|_| Error::bad_format(&key, "not valid utf-8"))?;
    let fields = records::decode_conversation(&key, text)?;
    let mut numbers: Vec<u32> = fields.folders.iter().map(|f| f.number).collect();
    numbers.sort_unstable();
    for number in numbers {
      if let Some(name) = folder_table.name_of(number) {
        callback(name, from, to)?;
      }
    }
  }

  Ok(to_update.len() as u64)
}

/// Renames folder `from` to `to` (when `to` is `Some`) or deletes it (when `to` is `None`),
/// migrating its `F` status record along with it. Conversation records referencing the folder by
/// number are untouched — the folder-number indirection is the whole point. Takes `&mut Session`
/// (rather than a separately borrowed `&mut FolderNameTable`) so the name-table edit and the `F`
/// key's read/write can each reborrow `session` in turn instead of needing to hold both a shared
/// and an exclusive borrow of it at once.
pub fn rename_folder(session: &mut Session, from: &str, to: Option<&str>) -> Result<()> {
  let status = session.get(&folder_status_key(from))?;
  match to {
    Some(to) => {
      session.folder_names_mut().rename(from, to)?;
      session.delete(&folder_status_key(from))?;
      if let Some(bytes) = status {
        session.put(&folder_status_key(to), &bytes)?;
      }
    }
    None => {
      session.folder_names_mut().delete(from)?;
      session.delete(&folder_status_key(from))?;
    }
  }
  Ok(())
}
