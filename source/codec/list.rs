// The record value format (see the codec section of the spec): a small self-describing list
// grammar, not a generic serde mechanism, so that old-format records with fewer trailing fields
// decode without ceremony. A peg grammar is used for the same reason the teacher hand-writes one
// for IMAP responses rather than pulling in a combinator crate: the grammar is tiny, fixed, and
// reads like the BNF it mirrors.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Atom(String),
  Number(i64),
  Hex(u64),
  Str(String),
  List(Vec<Value>),
}

impl Value {
  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<i64> {
    match self {
      Value::Number(n) => Some(*n),
      Value::Hex(n) => i64::try_from(*n).ok(),
      _ => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Atom(s) | Value::Str(s) => Some(s),
      _ => None,
    }
  }
}

fn unescape(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut chars = raw.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      match chars.next() {
        Some(escaped) => out.push(escaped),
        None => out.push('\\'),
      }
    } else {
      out.push(c);
    }
  }
  out
}

pub fn quote(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('"');
  for c in text.chars() {
    if c == '"' || c == '\\' {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('"');
  out
}

/// An atom is safe to write unquoted only when it contains none of the grammar's own delimiters,
/// isn't empty (an empty atom would parse back as nothing at all), and doesn't start with a digit
/// (optionally signed): `value()` tries `hex()`/`number()` before `atom()`, so a leading digit run
/// either gets read back as `Number`/`Hex` (losing its text form) or, if trailing characters don't
/// form a valid number, greedily consumes just the digits and leaves the rest unparsed, breaking
/// the enclosing list.
pub fn atom_is_safe(text: &str) -> bool {
  !text.is_empty()
    && text
      .chars()
      .all(|c| !matches!(c, '(' | ')' | ' ' | '\t' | '"'))
    && !text.strip_prefix('-').unwrap_or(text).starts_with(|c: char| c.is_ascii_digit())
}

/// Writes `text` as a bareword atom when possible, falling back to a quoted string.
pub fn encode_text(text: &str) -> String {
  if atom_is_safe(text) {
    text.to_string()
  } else {
    quote(text)
  }
}

peg::parser! {
  grammar grammar_() for str {
    rule ws() = [' ' | '\t']*
    rule sep() = [' ' | '\t']+
    rule digit() = ['0'..='9']
    rule hexdigit() = ['0'..='9' | 'a'..='f' | 'A'..='F']

    rule number() -> i64
      = n:$("-"? digit()+) {? n.parse().or(Err("number")) }

    rule hex() -> u64
      = "0x" n:$(hexdigit()+) {? u64::from_str_radix(n, 16).or(Err("hex")) }

    rule quoted() -> String
      = "\"" s:$((("\\" ['"' | '\\']) / [^ '"' | '\\'])*) "\"" { unescape(s) }

    rule atom() -> String
      = s:$((!['(' | ')' | ' ' | '\t' | '"'] [_])+) { s.to_string() }

    rule value() -> Value
      = v:hex() { Value::Hex(v) }
      / v:number() { Value::Number(v) }
      / v:quoted() { Value::Str(v) }
      / v:list() { Value::List(v) }
      / v:atom() { Value::Atom(v) }

    pub rule list() -> Vec<Value>
      = "(" ws() vs:(value() ** sep()) ws() ")" { vs }

    pub rule value_pub() -> Value = value()
  }
}

/// Parses a single top-level parenthesised list, e.g. `(1 2 (3 4) "five")`.
pub fn parse_list(text: &str) -> Result<Vec<Value>> {
  grammar_::list(text).map_err(|e| Error::bad_format("list", format!("{text:?}: {e}")))
}

/// Parses a single value, used for the handful of records whose leading field isn't itself a list
/// (e.g. a bare atom or number on its own).
pub fn parse_value(text: &str) -> Result<Value> {
  grammar_::value_pub(text).map_err(|e| Error::bad_format("value", format!("{text:?}: {e}")))
}

pub fn encode_list(items: &[String]) -> String {
  format!("({})", items.join(" "))
}
