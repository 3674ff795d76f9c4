//! A transactional, ordered key-value store that groups email messages into conversations and
//! tracks per-folder and per-conversation aggregate counters, modeled on Cyrus IMAP's
//! conversations.db thread index. A `Session` is a single open transaction over one database
//! file; callers read and write conversation, folder-status, and message-id records through it
//! and end it with either `commit` or `abort`.

pub mod cid;
pub mod codec;
pub mod config;
pub mod conversation;
pub mod counted_flags;
pub mod error;
pub mod folder_names;
pub mod message_id;
pub mod msgid_index;
pub mod rename;
pub mod sender;
pub mod store;
pub mod subject;
pub mod wipe;

pub use cid::Cid;
pub use config::Config;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use store::session::Session;
