// The conversation aggregate itself (see the conversation-aggregate section of the spec): the
// per-thread counters, folder membership, and sender history that make up a `B` record, plus the
// status-propagation that keeps each folder's own `F` record in sync as conversations change.

use crate::cid::Cid;
use crate::codec::records::{self, ConversationFields, FolderFields};
use crate::error::{Error, Result};
use crate::folder_names::FolderNameTable;
use crate::sender::{self, SenderRecord};
use crate::store::session::Session;
use crate::subject;

pub fn record_key(cid: Cid) -> String {
  format!("B{}", cid.encode())
}

pub fn folder_status_key(folder_name: &str) -> String {
  format!("F{folder_name}")
}

fn sender_index_key(cid: Cid) -> String {
  format!("S{}", cid.encode())
}

/// The per-folder unseen-delta transition table (see the conversation-aggregate section of the
/// spec): which way a folder's own `F`-record unseen count should move when this conversation's
/// `exists` and `unseen` change, bucketed on whether the folder itself gained or lost its last
/// message rather than on the conversation's raw unseen delta.
fn folder_unseen_delta(prev_exists: u32, exists: u32, conv_unseen: u32, conv_prev_unseen: u32) -> i64 {
  let sign = |n: u32| if n > 0 { 1i64 } else { 0i64 };
  match (prev_exists == 0, exists == 0) {
    (true, true) => 0,
    (true, false) => {
      if conv_unseen > 0 {
        1
      } else {
        0
      }
    }
    (false, true) => {
      if conv_prev_unseen > 0 {
        -1
      } else {
        0
      }
    }
    (false, false) => sign(conv_unseen) - sign(conv_prev_unseen),
  }
}

/// Clamps `current + delta` at zero instead of wrapping or panicking, logging when a delta would
/// otherwise have gone negative (see the error-handling section of the spec).
fn saturating_apply(current: u32, delta: i64, field: &str) -> u32 {
  let result = current as i64 + delta;
  if result < 0 {
    log::warn!("clamping {field}: {current} + {delta} would go negative, using 0");
    0
  } else {
    result.min(u32::MAX as i64) as u32
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderEntry {
  pub folder_number: u32,
  pub modseq: u64,
  pub num_records: u32,
  pub exists: u32,
  prev_exists: u32,
  touched: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
  pub cid: Cid,
  pub modseq: u64,
  pub num_records: u32,
  pub exists: u32,
  pub unseen: u32,
  prev_unseen: u32,
  pub size: u32,
  pub counts: Vec<u32>,
  pub subject: String,
  pub folders: Vec<FolderEntry>,
  pub senders: Vec<SenderRecord>,
  dirty: bool,
}

impl Conversation {
  pub fn new(cid: Cid, counted_flags_len: usize) -> Self {
    Conversation {
      cid,
      modseq: 0,
      num_records: 0,
      exists: 0,
      unseen: 0,
      prev_unseen: 0,
      size: 0,
      counts: vec![0; counted_flags_len],
      subject: String::new(),
      folders: Vec::new(),
      senders: Vec::new(),
      dirty: false,
    }
  }

  fn from_fields(cid: Cid, fields: ConversationFields) -> Self {
    let folders = fields
      .folders
      .into_iter()
      .map(|f| FolderEntry {
        folder_number: f.number,
        modseq: f.modseq,
        num_records: f.num_records,
        exists: f.exists,
        prev_exists: f.exists,
        touched: false,
      })
      .collect();
    Conversation {
      cid,
      modseq: fields.modseq,
      num_records: fields.num_records,
      exists: fields.exists,
      unseen: fields.unseen,
      prev_unseen: fields.unseen,
      size: fields.size,
      counts: fields.counts,
      subject: fields.subject,
      folders,
      senders: fields.senders.into_iter().map(SenderRecord::from_fields).collect(),
      dirty: false,
    }
  }

  fn to_fields(&self) -> ConversationFields {
    ConversationFields {
      modseq: self.modseq,
      num_records: self.num_records,
      exists: self.exists,
      unseen: self.unseen,
      counts: self.counts.clone(),
      folders: self
        .folders
        .iter()
        .map(|f| FolderFields {
          number: f.folder_number,
          modseq: f.modseq,
          num_records: f.num_records,
          exists: f.exists,
        })
        .collect(),
      senders: self.senders.iter().map(SenderRecord::to_fields).collect(),
      subject: self.subject.clone(),
      size: self.size,
    }
  }

  pub fn load(session: &Session, cid: Cid, counted_flags_len: usize) -> Result<Option<Conversation>> {
    let key = record_key(cid);
    let raw = match session.get(&key)? {
      Some(bytes) => bytes,
      None => return Ok(None),
    };
    let text = std::str::from_utf8(&raw).map_err(|_| Error::bad_format(&key, "not valid utf-8"))?;
    let fields = records::decode_conversation(&key, text)?;
    let mut conv = Conversation::from_fields(cid, fields);
    // $COUNTED_FLAGS may have grown or shrunk since this record was written; zero-extend or
    // truncate rather than attempt a migration.
    conv.counts.resize(counted_flags_len, 0);
    Ok(Some(conv))
  }

  fn folder_mut(&mut self, folder_number: u32) -> &mut FolderEntry {
    if let Some(pos) = self.folders.iter().position(|f| f.folder_number == folder_number) {
      return &mut self.folders[pos];
    }
    let pos = self.folders.partition_point(|f| f.folder_number < folder_number);
    self.folders.insert(
      pos,
      FolderEntry {
        folder_number,
        modseq: 0,
        num_records: 0,
        exists: 0,
        prev_exists: 0,
        touched: false,
      },
    );
    &mut self.folders[pos]
  }

  /// Applies one message event in `mailbox` to both the conversation-level aggregate and that
  /// folder's membership entry. Deltas are signed so a single call can express either a message
  /// arriving (positive) or being expunged (negative).
  #[allow(clippy::too_many_arguments)]
  pub fn apply_delta(
    &mut self,
    folder_table: &mut FolderNameTable,
    mailbox: &str,
    modseq: u64,
    delta_num_records: i64,
    delta_exists: i64,
    delta_unseen: i64,
    delta_size: i64,
    delta_counts: &[i64],
  ) {
    self.modseq = self.modseq.max(modseq);
    self.num_records = saturating_apply(self.num_records, delta_num_records, "num_records");
    self.exists = saturating_apply(self.exists, delta_exists, "exists");
    self.unseen = saturating_apply(self.unseen, delta_unseen, "unseen");
    self.size = saturating_apply(self.size, delta_size, "size");
    for (i, delta) in delta_counts.iter().enumerate() {
      if let Some(count) = self.counts.get_mut(i) {
        *count = saturating_apply(*count, *delta, "counts");
      }
    }

    let folder_number = folder_table.create(mailbox);
    let folder = self.folder_mut(folder_number);
    folder.modseq = folder.modseq.max(modseq);
    folder.num_records = saturating_apply(folder.num_records, delta_num_records, "folder.num_records");
    folder.exists = saturating_apply(folder.exists, delta_exists, "folder.exists");
    folder.touched = true;
    self.dirty = true;
  }

  /// The first non-empty subject a conversation sees becomes its subject; later messages don't
  /// override it even if their own subject normalizes differently.
  pub fn set_subject(&mut self, subject: &str) {
    if !self.subject.is_empty() {
      return;
    }
    let normalized = subject::normalize(subject);
    if !normalized.is_empty() {
      self.subject = normalized;
      self.dirty = true;
    }
  }

  pub fn update_sender(
    &mut self,
    name: &str,
    route: Option<&str>,
    mailbox: &str,
    domain: &str,
    lastseen: u64,
    exists_delta: i64,
  ) {
    if let Some(pos) = self.senders.iter().position(|s| s.identity_matches(mailbox, domain)) {
      let existing = &mut self.senders[pos];
      if sender::prefer_name(&existing.name, name) {
        existing.name = name.to_string();
      }
      match (existing.route.as_deref(), route) {
        (Some(cur), Some(cand)) if sender::prefer_text(cur, cand) => {
          existing.route = Some(cand.to_string())
        }
        (None, Some(cand)) => existing.route = Some(cand.to_string()),
        _ => {}
      }
      if sender::prefer_text(&existing.mailbox, mailbox) {
        existing.mailbox = mailbox.to_string();
      }
      if sender::prefer_text(&existing.domain, domain) {
        existing.domain = domain.to_string();
      }
      existing.lastseen = existing.lastseen.max(lastseen);
      // saturating_apply clamps a result that would go negative to 0, so checking for 0 here
      // is exactly the spec's "resulting exists <= 0" removal condition.
      let updated_exists = saturating_apply(existing.exists, exists_delta, "sender.exists");
      if updated_exists == 0 {
        self.senders.remove(pos);
      } else {
        existing.exists = updated_exists;
      }
    } else if exists_delta > 0 {
      self.senders.push(SenderRecord {
        name: name.to_string(),
        route: route.map(str::to_string),
        mailbox: mailbox.to_string(),
        domain: domain.to_string(),
        lastseen,
        exists: saturating_apply(0, exists_delta, "sender.exists"),
      });
    }
    sender::sort_and_truncate(&mut self.senders);
    self.dirty = true;
  }

  fn verify_invariants(&self) {
    if self.unseen > self.exists {
      log::warn!("conversation {}: unseen {} exceeds exists {}", self.cid, self.unseen, self.exists);
    }
    if self.exists > self.num_records {
      log::warn!(
        "conversation {}: exists {} exceeds num_records {}",
        self.cid,
        self.exists,
        self.num_records
      );
    }
    let folder_total: u64 = self.folders.iter().map(|f| f.num_records as u64).sum();
    if folder_total != self.num_records as u64 {
      log::warn!(
        "conversation {}: folder totals ({}) don't match num_records ({})",
        self.cid,
        folder_total,
        self.num_records
      );
    }
  }

  /// Writes the `B` record (or deletes it, once every folder's dropped to zero records) and
  /// propagates this update to every `F` record for a folder touched since the last save.
  pub fn save(&mut self, session: &Session, folder_table: &FolderNameTable) -> Result<()> {
    if !self.dirty {
      return Ok(());
    }
    self.verify_invariants();

    for folder in &mut self.folders {
      if !folder.touched {
        continue;
      }
      let name = folder_table
        .name_of(folder.folder_number)
        .ok_or_else(|| Error::internal(format!("folder {} has no name", folder.folder_number)))?;
      let key = folder_status_key(name);
      let existing = match session.get(&key)? {
        Some(bytes) => {
          let text = std::str::from_utf8(&bytes).map_err(|_| Error::bad_format(&key, "not valid utf-8"))?;
          records::decode_folder_status(&key, text)?
        }
        None => records::FolderStatusFields::default(),
      };
      let exists_delta = folder.exists as i64 - folder.prev_exists as i64;
      let unseen_delta = folder_unseen_delta(folder.prev_exists, folder.exists, self.unseen, self.prev_unseen);
      let updated = records::FolderStatusFields {
        modseq: existing.modseq.max(folder.modseq),
        exists: saturating_apply(existing.exists, exists_delta, "folder_status.exists"),
        unseen: saturating_apply(existing.unseen, unseen_delta, "folder_status.unseen"),
      };
      session.put(&key, records::encode_folder_status(&updated).as_bytes())?;
      folder.prev_exists = folder.exists;
      folder.touched = false;
    }
    self.prev_unseen = self.unseen;

    let key = record_key(self.cid);
    if self.num_records == 0 {
      session.delete(&key)?;
      session.delete(&sender_index_key(self.cid))?;
    } else {
      let fields = self.to_fields();
      session.put(&key, records::encode_conversation(&fields).as_bytes())?;
    }
    self.dirty = false;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;

  fn config() -> Config {
    Config { counted_flags: vec!["\\Flagged".to_string()] }
  }

  #[test]
  fn new_conversation_sizes_counts_to_configured_flags() {
    let conv = Conversation::new(Cid::new(1), 2);
    assert_eq!(vec![0, 0], conv.counts);
  }

  #[test]
  fn apply_delta_tracks_folder_membership() {
    let mut conv = Conversation::new(Cid::new(1), 1);
    let mut folders = FolderNameTable::empty();
    conv.apply_delta(&mut folders, "INBOX", 1, 1, 1, 1, 100, &[1]);
    assert_eq!(1, conv.num_records);
    assert_eq!(1, conv.exists);
    assert_eq!(1, conv.unseen);
    assert_eq!(100, conv.size);
    assert_eq!(vec![1], conv.counts);
    assert_eq!(1, conv.folders.len());
    assert_eq!(0, conv.folders[0].folder_number);
  }

  #[test]
  fn apply_delta_clamps_negative_results_to_zero() {
    let mut conv = Conversation::new(Cid::new(1), 0);
    let mut folders = FolderNameTable::empty();
    conv.apply_delta(&mut folders, "INBOX", 1, -5, 0, 0, 0, &[]);
    assert_eq!(0, conv.num_records);
  }

  #[test]
  fn subject_is_set_once_from_first_nonempty_value() {
    let mut conv = Conversation::new(Cid::new(1), 0);
    conv.set_subject("Re: hello world");
    conv.set_subject("something else entirely");
    assert_eq!("helloworld", conv.subject);
  }

  #[test]
  fn save_persists_and_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.db");
    let cfg = config();
    let session = crate::store::session::Session::open_path(&path, &cfg).unwrap();
    let mut folders = FolderNameTable::empty();
    let mut conv = Conversation::new(Cid::new(42), cfg.counted_flags.len());
    conv.apply_delta(&mut folders, "INBOX", 5, 3, 3, 1, 1000, &[1]);
    conv.update_sender("Alice", None, "alice", "example.com", 10, 1);
    conv.save(&session, &folders).unwrap();
    session.commit().unwrap();

    let session = crate::store::session::Session::open_path(&path, &cfg).unwrap();
    let loaded = Conversation::load(&session, Cid::new(42), cfg.counted_flags.len())
      .unwrap()
      .unwrap();
    assert_eq!(3, loaded.num_records);
    assert_eq!(3, loaded.exists);
    assert_eq!(1, loaded.unseen);
    assert_eq!(1, loaded.senders.len());
    session.abort();
  }

  #[test]
  fn save_deletes_record_once_num_records_reaches_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.db");
    let cfg = config();
    let session = crate::store::session::Session::open_path(&path, &cfg).unwrap();
    let mut folders = FolderNameTable::empty();
    let mut conv = Conversation::new(Cid::new(7), cfg.counted_flags.len());
    conv.apply_delta(&mut folders, "INBOX", 1, 1, 1, 0, 0, &[0]);
    conv.save(&session, &folders).unwrap();
    conv.apply_delta(&mut folders, "INBOX", 2, -1, -1, 0, 0, &[0]);
    conv.save(&session, &folders).unwrap();
    assert_eq!(None, session.get(&record_key(Cid::new(7))).unwrap());
    session.abort();
  }

  #[test]
  fn save_updates_folder_status_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.db");
    let cfg = config();
    let session = crate::store::session::Session::open_path(&path, &cfg).unwrap();
    let mut folders = FolderNameTable::empty();
    let mut conv = Conversation::new(Cid::new(3), cfg.counted_flags.len());
    conv.apply_delta(&mut folders, "INBOX", 9, 1, 1, 1, 0, &[0]);
    conv.save(&session, &folders).unwrap();
    let raw = session.get(&folder_status_key("INBOX")).unwrap().unwrap();
    let status = records::decode_folder_status(
      "FINBOX",
      std::str::from_utf8(&raw).unwrap(),
    )
    .unwrap();
    assert_eq!(1, status.exists);
    assert_eq!(1, status.unseen);
    session.abort();
  }

  #[test]
  fn save_applies_the_per_folder_unseen_transition_table_not_a_shared_batch_delta() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.db");
    let cfg = Config { counted_flags: vec!["\\Flagged".to_string(), "\\Drafts".to_string()] };
    let session = crate::store::session::Session::open_path(&path, &cfg).unwrap();
    let mut folders = FolderNameTable::empty();
    let mut conv = Conversation::new(Cid::new(0x10abcdef23456789), cfg.counted_flags.len());
    // Three freshly-touched folders (prev_exists == 0 each), conv.unseen ends at 5: each folder
    // should see unseen_delta == +1, not the conversation's raw +5 batch delta.
    conv.apply_delta(&mut folders, "F1", 4, 7, 7, 5, 0, &[1, 0]);
    conv.apply_delta(&mut folders, "F2", 7, 1, 1, 0, 0, &[0, 2]);
    conv.apply_delta(&mut folders, "F3", 55, 10, 10, 0, 0, &[0, 5]);
    conv.save(&session, &folders).unwrap();

    assert_eq!(18, conv.exists);
    assert_eq!(5, conv.unseen);
    assert_eq!(vec![1, 7], conv.counts);
    assert_eq!(55, conv.modseq);

    for name in ["F1", "F2", "F3"] {
      let raw = session.get(&folder_status_key(name)).unwrap().unwrap();
      let status = records::decode_folder_status(name, std::str::from_utf8(&raw).unwrap()).unwrap();
      assert_eq!(1, status.unseen, "{name} should get +1 unseen from the transition table");
    }
    session.abort();
  }

  #[test]
  fn save_gives_an_emptied_folder_minus_one_unseen_only_when_conv_had_unseen_before() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.db");
    let cfg = config();
    let session = crate::store::session::Session::open_path(&path, &cfg).unwrap();
    let mut folders = FolderNameTable::empty();
    let mut conv = Conversation::new(Cid::new(1), cfg.counted_flags.len());
    conv.apply_delta(&mut folders, "INBOX", 1, 1, 1, 1, 0, &[0]);
    conv.save(&session, &folders).unwrap();

    // The folder empties out entirely; conv.prev_unseen was 1 at load time (here, at the start
    // of this save batch), so the folder should lose exactly one unseen.
    conv.apply_delta(&mut folders, "INBOX", 2, -1, -1, -1, 0, &[0]);
    conv.save(&session, &folders).unwrap();

    let raw = session.get(&folder_status_key("INBOX")).unwrap().unwrap();
    let status = records::decode_folder_status("INBOX", std::str::from_utf8(&raw).unwrap()).unwrap();
    assert_eq!(0, status.unseen);
    session.abort();
  }

  #[test]
  fn update_sender_removes_the_sender_once_exists_drops_to_zero() {
    let mut conv = Conversation::new(Cid::new(1), 0);
    conv.update_sender("Alice", None, "alice", "example.com", 10, 2);
    assert_eq!(1, conv.senders.len());
    conv.update_sender("Alice", None, "alice", "example.com", 11, -2);
    assert!(conv.senders.is_empty());
  }

  #[test]
  fn update_sender_does_not_allocate_a_new_sender_for_a_nonpositive_delta() {
    let mut conv = Conversation::new(Cid::new(1), 0);
    conv.update_sender("Alice", None, "alice", "example.com", 10, 0);
    assert!(conv.senders.is_empty());
    conv.update_sender("Alice", None, "alice", "example.com", 10, -3);
    assert!(conv.senders.is_empty());
  }
}
