// The four record families that share the one physical database (see the data-model and
// record-codec sections of the spec). Each codec function is a pure pair of
// `encode(&Fields) -> String` / `decode(key, &str) -> Result<Fields>`; the conversation aggregate
// in `conversation.rs` is the only caller that attaches behaviour on top.

use super::list::{self, Value};
use crate::cid::Cid;
use crate::error::{Error, Result};

pub const CURRENT_VERSION: u32 = 0;

fn as_u64(value: &Value) -> Option<u64> {
  match value {
    Value::Number(n) if *n >= 0 => Some(*n as u64),
    Value::Hex(n) => Some(*n),
    Value::Atom(s) | Value::Str(s) => s.parse().ok(),
    _ => None,
  }
}

fn as_u32(value: &Value) -> Option<u32> {
  as_u64(value).and_then(|n| u32::try_from(n).ok())
}

fn as_text(value: &Value) -> Option<&str> {
  value.as_text()
}

/// Splits `"<version> <rest>"`, the shape every record but counted-flags begins with.
fn split_version(key: &str, raw: &str) -> Result<(u32, &str)> {
  let (version, rest) = raw
    .split_once(' ')
    .ok_or_else(|| Error::bad_format(key, "missing version field"))?;
  let version: u32 = version
    .parse()
    .map_err(|_| Error::bad_format(key, format!("non-numeric version {version:?}")))?;
  if version != CURRENT_VERSION {
    return Err(Error::bad_format(
      key,
      format!("unsupported version {version}"),
    ));
  }
  Ok((version, rest))
}

// --- msgid record: "0 <cid-hex> <stamp>", three fixed tokens, no parentheses. --------------

pub fn encode_msgid(cid: Cid, stamp: u64) -> String {
  format!("{CURRENT_VERSION} {} {stamp}", cid.encode())
}

pub fn decode_msgid(key: &str, raw: &str) -> Result<(Cid, u64)> {
  let mut tokens = raw.split(' ');
  let version = tokens
    .next()
    .ok_or_else(|| Error::bad_format(key, "empty msgid record"))?;
  let version: u32 = version
    .parse()
    .map_err(|_| Error::bad_format(key, format!("non-numeric version {version:?}")))?;
  if version != CURRENT_VERSION {
    return Err(Error::bad_format(
      key,
      format!("unsupported version {version}"),
    ));
  }
  let cid = tokens
    .next()
    .ok_or_else(|| Error::bad_format(key, "msgid record missing cid"))?;
  let cid = Cid::decode(cid)?;
  let stamp = tokens
    .next()
    .ok_or_else(|| Error::bad_format(key, "msgid record missing stamp"))?;
  let stamp: u64 = stamp
    .parse()
    .map_err(|_| Error::bad_format(key, format!("non-numeric stamp {stamp:?}")))?;
  Ok((cid, stamp))
}

// --- conversation record ("B" + cid): 9-element list. ---------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FolderFields {
  pub number: u32,
  pub modseq: u64,
  pub num_records: u32,
  pub exists: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SenderFields {
  pub name: String,
  pub route: Option<String>,
  pub mailbox: String,
  pub domain: String,
  pub lastseen: u64,
  pub exists: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversationFields {
  pub modseq: u64,
  pub num_records: u32,
  pub exists: u32,
  pub unseen: u32,
  pub counts: Vec<u32>,
  pub folders: Vec<FolderFields>,
  pub senders: Vec<SenderFields>,
  pub subject: String,
  pub size: u32,
}

/// Writes plain text fields (name, mailbox, domain, subject), quoting even a safe-looking atom
/// when its text is exactly "NIL" so it can't be misread as some other field's null sentinel.
fn encode_plain_text(text: &str) -> String {
  if text == "NIL" {
    list::quote(text)
  } else {
    list::encode_text(text)
  }
}

fn encode_folder(folder: &FolderFields) -> String {
  list::encode_list(&[
    folder.number.to_string(),
    folder.modseq.to_string(),
    folder.num_records.to_string(),
    folder.exists.to_string(),
  ])
}

fn encode_sender(sender: &SenderFields) -> String {
  list::encode_list(&[
    encode_plain_text(&sender.name),
    // `None` is the bare atom NIL; `Some(_)` is always quoted, even when its text happens to be
    // "NIL", so the two can never be confused on decode (matching on decoded text alone couldn't
    // tell a literal route of "NIL" apart from the sentinel).
    match &sender.route {
      Some(route) => list::quote(route),
      None => "NIL".to_string(),
    },
    encode_plain_text(&sender.mailbox),
    encode_plain_text(&sender.domain),
    sender.lastseen.to_string(),
    sender.exists.to_string(),
  ])
}

pub fn encode_conversation(fields: &ConversationFields) -> String {
  let counts: Vec<String> = fields.counts.iter().map(u32::to_string).collect();
  let folders: Vec<String> = fields
    .folders
    .iter()
    .filter(|f| f.num_records != 0)
    .map(encode_folder)
    .collect();
  let senders: Vec<String> = fields
    .senders
    .iter()
    .filter(|s| s.exists != 0)
    .take(100)
    .map(encode_sender)
    .collect();
  let body = list::encode_list(&[
    fields.modseq.to_string(),
    fields.num_records.to_string(),
    fields.exists.to_string(),
    fields.unseen.to_string(),
    list::encode_list(&counts),
    list::encode_list(&folders),
    list::encode_list(&senders),
    if fields.subject.is_empty() {
      "\"\"".to_string()
    } else {
      encode_plain_text(&fields.subject)
    },
    fields.size.to_string(),
  ]);
  format!("{CURRENT_VERSION} {body}")
}

fn decode_folder(key: &str, value: &Value) -> Result<FolderFields> {
  let items = value
    .as_list()
    .ok_or_else(|| Error::bad_format(key, "folder entry isn't a list"))?;
  let get = |i: usize| items.get(i);
  Ok(FolderFields {
    number: get(0)
      .and_then(as_u32)
      .ok_or_else(|| Error::bad_format(key, "folder entry missing folder-number"))?,
    modseq: get(1).and_then(as_u64).unwrap_or(0),
    num_records: get(2).and_then(as_u32).unwrap_or(0),
    exists: get(3).and_then(as_u32).unwrap_or(0),
  })
}

fn decode_sender(key: &str, value: &Value) -> Result<SenderFields> {
  let items = value
    .as_list()
    .ok_or_else(|| Error::bad_format(key, "sender entry isn't a list"))?;
  let get = |i: usize| items.get(i);
  // Only the bare, unquoted atom NIL means "no route" — a quoted string whose text happens to be
  // "NIL" is a real (if unusual) route value and must round-trip as `Some`.
  let route = match get(1) {
    Some(Value::Atom(text)) if text == "NIL" => None,
    Some(value) => as_text(value).map(str::to_string),
    None => None,
  };
  Ok(SenderFields {
    name: get(0).and_then(as_text).unwrap_or("").to_string(),
    route,
    mailbox: get(2)
      .and_then(as_text)
      .ok_or_else(|| Error::bad_format(key, "sender entry missing mailbox"))?
      .to_string(),
    domain: get(3).and_then(as_text).unwrap_or("").to_string(),
    lastseen: get(4).and_then(as_u64).unwrap_or(0),
    exists: get(5).and_then(as_u32).unwrap_or(0),
  })
}

pub fn decode_conversation(key: &str, raw: &str) -> Result<ConversationFields> {
  let (_, rest) = split_version(key, raw)?;
  let items = list::parse_list(rest.trim())?;
  if items.is_empty() {
    return Err(Error::bad_format(key, "conversation record has no fields"));
  }
  let get = |i: usize| items.get(i);
  let modseq = get(0)
    .and_then(as_u64)
    .ok_or_else(|| Error::bad_format(key, "conversation record missing modseq"))?;
  let counts = match get(4).and_then(Value::as_list) {
    Some(items) => items
      .iter()
      .map(|v| as_u32(v).ok_or_else(|| Error::bad_format(key, "non-numeric count")))
      .collect::<Result<Vec<u32>>>()?,
    None => Vec::new(),
  };
  let folders = match get(5).and_then(Value::as_list) {
    Some(items) => items
      .iter()
      .map(|v| decode_folder(key, v))
      .collect::<Result<Vec<_>>>()?,
    None => Vec::new(),
  };
  let senders = match get(6).and_then(Value::as_list) {
    Some(items) => items
      .iter()
      .map(|v| decode_sender(key, v))
      .collect::<Result<Vec<_>>>()?,
    None => Vec::new(),
  };
  Ok(ConversationFields {
    modseq,
    num_records: get(1).and_then(as_u32).unwrap_or(0),
    exists: get(2).and_then(as_u32).unwrap_or(0),
    unseen: get(3).and_then(as_u32).unwrap_or(0),
    counts,
    folders,
    senders,
    subject: get(7).and_then(as_text).unwrap_or("").to_string(),
    size: get(8).and_then(as_u32).unwrap_or(0),
  })
}

// --- folder-status record ("F" + mailbox): (modseq, exists, unseen). -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderStatusFields {
  pub modseq: u64,
  pub exists: u32,
  pub unseen: u32,
}

pub fn encode_folder_status(fields: &FolderStatusFields) -> String {
  let body = list::encode_list(&[
    fields.modseq.to_string(),
    fields.exists.to_string(),
    fields.unseen.to_string(),
  ]);
  format!("{CURRENT_VERSION} {body}")
}

pub fn decode_folder_status(key: &str, raw: &str) -> Result<FolderStatusFields> {
  let (_, rest) = split_version(key, raw)?;
  let items = list::parse_list(rest.trim())?;
  Ok(FolderStatusFields {
    modseq: items.first().and_then(as_u64).unwrap_or(0),
    exists: items.get(1).and_then(as_u32).unwrap_or(0),
    unseen: items.get(2).and_then(as_u32).unwrap_or(0),
  })
}

// --- $FOLDER_NAMES: flat list of atoms, tombstones as "-". -----------------------------------

pub const TOMBSTONE: &str = "-";

pub fn encode_folder_names(names: &[Option<String>]) -> String {
  // A tombstone is the bare, unquoted atom "-"; a real folder literally named "-" is always
  // quoted instead, so the two can never be confused on decode.
  let items: Vec<String> = names
    .iter()
    .map(|name| match name {
      Some(name) if name == TOMBSTONE => list::quote(name),
      Some(name) => list::encode_text(name),
      None => TOMBSTONE.to_string(),
    })
    .collect();
  format!("{CURRENT_VERSION} {}", list::encode_list(&items))
}

pub fn decode_folder_names(key: &str, raw: &str) -> Result<Vec<Option<String>>> {
  let (_, rest) = split_version(key, raw)?;
  let items = list::parse_list(rest.trim())?;
  items
    .iter()
    .map(|v| match v {
      Value::Atom(text) if text == TOMBSTONE => Ok(None),
      _ => as_text(v)
        .map(|text| Some(text.to_string()))
        .ok_or_else(|| Error::bad_format(key, "non-text folder name")),
    })
    .collect()
}

// --- $COUNTED_FLAGS: whitespace-separated string, not a list, no version tag. ----------------

pub fn encode_counted_flags(flags: &[String]) -> String {
  flags.join(" ")
}

pub fn decode_counted_flags(raw: &str) -> Vec<String> {
  raw.split_whitespace().map(str::to_string).collect()
}
