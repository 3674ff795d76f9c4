// Subject normalization used to decide whether two messages share a conversation's subject (see
// the conversation-aggregate section of the spec). Hand-rolled rather than regex-based: the rule
// is a small fixed grammar (strip a reply/forward token or a bracketed tag, repeat, then collapse
// whitespace) and a scanner reads as directly as the rule itself.

/// Strips a leading `word:` or `word[n]:` reply/forward marker (`Re:`, `Fwd:`, `Re[2]:`, ...) and
/// leading `[tag]` annotations, repeatedly, then collapses all remaining whitespace.
pub fn normalize(subject: &str) -> String {
  let mut rest = subject.trim();
  loop {
    if let Some(next) = strip_reply_marker(rest) {
      rest = next.trim_start();
      continue;
    }
    if let Some(next) = strip_bracket_tag(rest) {
      rest = next.trim_start();
      continue;
    }
    break;
  }
  rest.split_whitespace().collect()
}

const REPLY_MARKERS: &[&str] = &["re", "fwd", "fw", "aw", "antw", "res", "sv"];

fn strip_reply_marker(s: &str) -> Option<&str> {
  let colon = s.find(':')?;
  let token = &s[..colon];
  if token.is_empty() || token.len() > 12 {
    return None;
  }
  // Allow an optional bracketed counter after the marker itself, e.g. "Re[2]:".
  let base = token.split(['[', ']']).next().unwrap_or(token);
  if !REPLY_MARKERS.contains(&base.to_ascii_lowercase().as_str()) {
    return None;
  }
  Some(&s[colon + 1..])
}

fn strip_bracket_tag(s: &str) -> Option<&str> {
  if !s.starts_with('[') {
    return None;
  }
  let end = s.find(']')?;
  Some(&s[end + 1..])
}
