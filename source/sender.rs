// Per-conversation sender tracking (see the conversation-aggregate section of the spec): the
// last-seen, most-prominent senders, capped and ordered so the record never grows unbounded.

use std::cmp::{Ordering, Reverse};

use crate::codec::records::SenderFields;

pub const MAX_SENDERS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SenderRecord {
  pub name: String,
  pub route: Option<String>,
  pub mailbox: String,
  pub domain: String,
  pub lastseen: u64,
  pub exists: u32,
}

impl SenderRecord {
  pub fn identity_matches(&self, mailbox: &str, domain: &str) -> bool {
    self.mailbox.eq_ignore_ascii_case(mailbox) && self.domain.eq_ignore_ascii_case(domain)
  }

  pub(crate) fn from_fields(fields: SenderFields) -> Self {
    SenderRecord {
      name: fields.name,
      route: fields.route,
      mailbox: fields.mailbox,
      domain: fields.domain,
      lastseen: fields.lastseen,
      exists: fields.exists,
    }
  }

  pub(crate) fn to_fields(&self) -> SenderFields {
    SenderFields {
      name: self.name.clone(),
      route: self.route.clone(),
      mailbox: self.mailbox.clone(),
      domain: self.domain.clone(),
      lastseen: self.lastseen,
      exists: self.exists,
    }
  }
}

/// True when `candidate` should replace `current` as the display name kept for a sender: a name
/// carrying non-ASCII beats a plain-ASCII one (a real display name over a bare address fallback),
/// then the longer string wins, then ties break lexicographically for determinism.
pub fn prefer_name(current: &str, candidate: &str) -> bool {
  if candidate.is_empty() {
    return false;
  }
  if current.is_empty() {
    return true;
  }
  let candidate_rich = !candidate.is_ascii();
  let current_rich = !current.is_ascii();
  if candidate_rich != current_rich {
    return candidate_rich;
  }
  match candidate.len().cmp(&current.len()) {
    Ordering::Greater => true,
    Ordering::Less => false,
    Ordering::Equal => candidate < current,
  }
}

/// True when `candidate` should replace `current` for a field where there's no quality signal
/// beyond determinism: the lexicographically earlier value wins so repeated runs converge.
pub fn prefer_text(current: &str, candidate: &str) -> bool {
  candidate < current
}

fn sort_key(sender: &SenderRecord) -> (Reverse<u64>, String, String) {
  (
    Reverse(sender.lastseen),
    sender.domain.to_ascii_lowercase(),
    sender.mailbox.to_ascii_lowercase(),
  )
}

/// Orders senders most-recently-seen first, with `(domain, mailbox)` as a stable tiebreak, and
/// truncates to the cap the record format writes.
pub fn sort_and_truncate(senders: &mut Vec<SenderRecord>) {
  senders.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
  senders.truncate(MAX_SENDERS);
}
