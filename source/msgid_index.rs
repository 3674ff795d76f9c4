// The `<` message-id index (see the data-model section of the spec): maps a `Message-Id` header
// value to the conversation it belongs to, with a timestamp used by `prune` to age out entries
// for messages that have since been fully expunged.

use crate::cid::Cid;
use crate::codec::records;
use crate::error::{Error, Result};
use crate::message_id;
use crate::store::session::Session;

pub fn set_msgid(session: &Session, msgid: &str, cid: Cid, now: u64) -> Result<()> {
  message_id::validate(msgid)?;
  session.put(msgid, records::encode_msgid(cid, now).as_bytes())
}

/// Returns `Cid::NULL` if `msgid` has no entry; a missing entry isn't an error condition.
pub fn get_msgid(session: &Session, msgid: &str) -> Result<Cid> {
  message_id::validate(msgid)?;
  match session.get(msgid)? {
    Some(bytes) => {
      let text = std::str::from_utf8(&bytes).map_err(|_| Error::bad_format(msgid, "not valid utf-8"))?;
      let (cid, _stamp) = records::decode_msgid(msgid, text)?;
      Ok(cid)
    }
    None => Ok(Cid::NULL),
  }
}

pub fn delete_msgid(session: &Session, msgid: &str) -> Result<()> {
  message_id::validate(msgid)?;
  session.delete(msgid)
}

/// Deletes every msgid entry stamped before `threshold` (a unix timestamp). Returns
/// `(records_seen, records_deleted)`.
pub fn prune(session: &Session, threshold: u64) -> Result<(u64, u64)> {
  let mut seen = 0u64;
  let mut to_delete = Vec::new();
  session.foreach('<', |key, value| {
    seen += 1;
    let text = std::str::from_utf8(value).map_err(|_| Error::bad_format(key, "not valid utf-8"))?;
    let (_, stamp) = records::decode_msgid(key, text)?;
    if stamp < threshold {
      to_delete.push(key.to_string());
    }
    Ok(0)
  })?;
  for key in &to_delete {
    session.delete(key)?;
  }
  Ok((seen, to_delete.len() as u64))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;

  fn config() -> Config {
    Config { counted_flags: vec![] }
  }

  #[test]
  fn set_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open_path(dir.path().join("c.db"), &config()).unwrap();
    set_msgid(&session, "<a@x>", Cid::new(42), 1000).unwrap();
    assert_eq!(Cid::new(42), get_msgid(&session, "<a@x>").unwrap());
    session.abort();
  }

  #[test]
  fn get_unknown_msgid_returns_null() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open_path(dir.path().join("c.db"), &config()).unwrap();
    assert_eq!(Cid::NULL, get_msgid(&session, "<missing@x>").unwrap());
    session.abort();
  }

  #[test]
  fn get_rejects_malformed_msgid() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open_path(dir.path().join("c.db"), &config()).unwrap();
    assert!(get_msgid(&session, "not-a-msgid").is_err());
    session.abort();
  }

  #[test]
  fn prune_deletes_only_entries_older_than_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open_path(dir.path().join("c.db"), &config()).unwrap();
    set_msgid(&session, "<old@x>", Cid::new(1), 100).unwrap();
    set_msgid(&session, "<new@x>", Cid::new(2), 9_000).unwrap();
    let (seen, deleted) = prune(&session, 5_000).unwrap();
    assert_eq!(2, seen);
    assert_eq!(1, deleted);
    assert_eq!(Cid::NULL, get_msgid(&session, "<old@x>").unwrap());
    assert_eq!(Cid::new(2), get_msgid(&session, "<new@x>").unwrap());
    session.abort();
  }
}
