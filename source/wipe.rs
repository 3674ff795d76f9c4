// Resets the conversation/folder/sender state of a database while leaving the msgid index alone
// (see the wipe-counts section of the spec) — used when a mailbox's counters need to be rebuilt
// from scratch without losing the message-id-to-conversation mapping that drove the rebuild.

use crate::counted_flags::CountedFlags;
use crate::error::Result;
use crate::folder_names::FolderNameTable;
use crate::store::session::Session;

/// Deletes every conversation (`B`), folder-status (`F`), and sender-index (`S`) record;
/// optionally clears the folder-name table; and reinitializes counted-flags from `config_flags`.
pub fn wipe_counts(
  session: &Session,
  folder_table: &mut FolderNameTable,
  counted_flags: &mut CountedFlags,
  config_flags: &[String],
  keep_names: bool,
) -> Result<()> {
  for prefix in ['B', 'F', 'S'] {
    let mut to_delete = Vec::new();
    session.foreach(prefix, |key, _| {
      to_delete.push(key.to_string());
      Ok(0)
    })?;
    for key in &to_delete {
      session.delete(key)?;
    }
  }
  if !keep_names {
    folder_table.clear();
  }
  counted_flags.reset(config_flags);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cid::Cid;
  use crate::config::Config;
  use crate::conversation::record_key;

  fn config() -> Config {
    Config { counted_flags: vec!["\\Flagged".to_string()] }
  }

  #[test]
  fn wipe_clears_conversation_and_folder_records_but_keeps_msgid() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open_path(dir.path().join("c.db"), &config()).unwrap();
    let mut folders = FolderNameTable::empty();
    folders.create("INBOX");
    let mut flags = CountedFlags::from_config(&config().counted_flags);

    session.put(&record_key(Cid::new(1)), b"irrelevant").unwrap();
    session.put("FINBOX", b"irrelevant").unwrap();
    session.put("<a@x>", b"0 0000000000000001 1").unwrap();

    wipe_counts(&session, &mut folders, &mut flags, &["\\Seen".to_string()], true).unwrap();

    assert_eq!(None, session.get(&record_key(Cid::new(1))).unwrap());
    assert_eq!(None, session.get("FINBOX").unwrap());
    assert!(session.get("<a@x>").unwrap().is_some());
    assert_eq!(Some(0), folders.number_of("INBOX"));
    assert_eq!(vec!["\\Seen".to_string()], flags.flags());
    session.abort();
  }

  #[test]
  fn wipe_can_also_clear_folder_names() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open_path(dir.path().join("c.db"), &config()).unwrap();
    let mut folders = FolderNameTable::empty();
    folders.create("INBOX");
    let mut flags = CountedFlags::from_config(&config().counted_flags);

    wipe_counts(&session, &mut folders, &mut flags, &config().counted_flags, false).unwrap();

    assert_eq!(None, folders.number_of("INBOX"));
    session.abort();
  }
}
