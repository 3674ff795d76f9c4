use crate::error::{Error, Result};

/// Validates the `<localpart@domain>` shape required of a stored msgid key: angle brackets and
/// exactly one `@` are mandatory. This is a syntax check only, not an RFC 5322 parser: the
/// mailbox storage engine is the one that extracts message-ids from envelopes in the first
/// place, the core only needs to reject obviously malformed keys.
pub fn validate(msgid: &str) -> Result<()> {
  let invalid = || Error::InvalidIdentifier(msgid.to_string());
  let inner = msgid.strip_prefix('<').and_then(|s| s.strip_suffix('>'));
  let inner = inner.ok_or_else(invalid)?;
  if inner.is_empty() || inner.matches('@').count() != 1 {
    return Err(invalid());
  }
  let (local, domain) = inner.split_once('@').ok_or_else(invalid)?;
  if local.is_empty() || domain.is_empty() {
    return Err(invalid());
  }
  if !msgid.is_ascii() {
    return Err(invalid());
  }
  Ok(())
}
