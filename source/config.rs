// Ambient configuration, kept deliberately small: the store has exactly one tunable, the set of
// flags whose occurrences are counted per conversation. Uses serde + toml the way
// berker-z-otto and mwmdev-slashmail both configure themselves, rather than a hand-rolled parser.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default = "default_counted_flags")]
  pub counted_flags: Vec<String>,
}

fn default_counted_flags() -> Vec<String> {
  vec!["\\Flagged".to_string()]
}

impl Default for Config {
  fn default() -> Self {
    Config { counted_flags: default_counted_flags() }
  }
}

impl Config {
  pub fn from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| Error::internal(format!("{}: {e}", path.display())))
  }
}
