// Bulk export/import of the whole database (see the dump/undump section of the spec). redb has
// no native dumpfile primitive the way notmuch-dump does; this is a small custom textual format
// (quoted key, space, hex-encoded value, one record per line) good enough to move a database
// between hosts or inspect by eye.

use std::io::{BufRead, Write};

use crate::codec::list;
use crate::error::{Error, Result};

use super::session::Session;

fn hex_encode(bytes: &[u8]) -> String {
  bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(key: &str, text: &str) -> Result<Vec<u8>> {
  if text.len() % 2 != 0 {
    return Err(Error::bad_format(key, "odd-length hex value"));
  }
  let mut out = Vec::with_capacity(text.len() / 2);
  let bytes = text.as_bytes();
  for chunk in bytes.chunks(2) {
    let byte = std::str::from_utf8(chunk)
      .ok()
      .and_then(|s| u8::from_str_radix(s, 16).ok())
      .ok_or_else(|| Error::bad_format(key, "invalid hex value"))?;
    out.push(byte);
  }
  Ok(out)
}

/// Writes every record in key order, one per line.
pub fn dump(session: &Session, writer: &mut impl Write) -> Result<()> {
  let mut rows = Vec::new();
  session.for_each(|key, value| {
    rows.push((key.to_string(), value.to_vec()));
    Ok(())
  })?;
  rows.sort_by(|a, b| a.0.cmp(&b.0));
  for (key, value) in rows {
    writeln!(writer, "{} {}", list::quote(&key), hex_encode(&value)).map_err(Error::Io)?;
  }
  Ok(())
}

/// Deletes every record in the database. `undump` requires this to have been called first.
pub fn truncate(session: &Session) -> Result<()> {
  let mut keys = Vec::new();
  session.for_each(|key, _| {
    keys.push(key.to_string());
    Ok(())
  })?;
  for key in &keys {
    session.delete(key)?;
  }
  Ok(())
}

/// Restores a dump produced by `dump`. A malformed line aborts the whole restore rather than
/// leaving the database partially populated, the same way notmuch-restore refuses a corrupt
/// dumpfile outright instead of applying it partially.
pub fn undump(session: &Session, reader: &mut impl BufRead) -> Result<()> {
  for (lineno, line) in reader.lines().enumerate() {
    let line = line.map_err(Error::Io)?;
    if line.trim().is_empty() {
      continue;
    }
    let where_ = format!("line {}", lineno + 1);
    let (key_text, value_text) = line
      .split_once(' ')
      .ok_or_else(|| Error::bad_format(where_.clone(), "missing key/value separator"))?;
    let key = list::parse_value(key_text)?
      .as_text()
      .ok_or_else(|| Error::bad_format(where_.clone(), "key isn't a quoted string"))?
      .to_string();
    let value = hex_decode(&key, value_text)?;
    session.put(&key, &value)?;
  }
  Ok(())
}
