use std::{io, path};

pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy exposed to callers (see the external-interfaces section of the spec).
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("a session is already open for {0:?}")]
  AlreadyOpen(path::PathBuf),
  #[error("not a usable database path: {0:?}")]
  BadName(path::PathBuf),
  #[error("malformed record for key {key:?}: {reason}")]
  BadFormat { key: String, reason: String },
  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),
  #[error("not found")]
  NotFound,
  #[error("storage I/O error: {0}")]
  Io(#[from] io::Error),
  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  pub(crate) fn bad_format(key: impl Into<String>, reason: impl Into<String>) -> Self {
    Error::BadFormat {
      key: key.into(),
      reason: reason.into(),
    }
  }

  pub(crate) fn internal(reason: impl Into<String>) -> Self {
    Error::Internal(reason.into())
  }
}

// redb's own error types don't implement a single common trait we can blanket-impl From for, so
// each is routed to Io (storage-layer failure) individually, the same way the teacher collapses
// every notmuch_status_t into its own Error::Status.
impl From<redb::DatabaseError> for Error {
  fn from(error: redb::DatabaseError) -> Self {
    Error::Io(io::Error::new(io::ErrorKind::Other, error.to_string()))
  }
}

impl From<redb::TransactionError> for Error {
  fn from(error: redb::TransactionError) -> Self {
    Error::Io(io::Error::new(io::ErrorKind::Other, error.to_string()))
  }
}

impl From<redb::TableError> for Error {
  fn from(error: redb::TableError) -> Self {
    Error::Io(io::Error::new(io::ErrorKind::Other, error.to_string()))
  }
}

impl From<redb::StorageError> for Error {
  fn from(error: redb::StorageError) -> Self {
    Error::Io(io::Error::new(io::ErrorKind::Other, error.to_string()))
  }
}

impl From<redb::CommitError> for Error {
  fn from(error: redb::CommitError) -> Self {
    Error::Io(io::Error::new(io::ErrorKind::Other, error.to_string()))
  }
}
