//! keeper - Local account keeper
//!
//! A single-user store of named accounts (website, email, username,
//! password, notes, tags). Every stored field passes through a reversible
//! character-rotation cipher, so the database never holds field text as typed.
//!
//! The cipher is obfuscation, not encryption: the alphabet is small and fixed
//! and there is no key derivation.
//!
//! Modules:
//! - cipher: alphabet rotation transform
//! - store: SQLite-backed account records
//! - search: substring search and disambiguation
//! - export: CSV backup of every record
//! - gate, profile, session: login plumbing for the CLI

pub mod cipher;
pub mod error;
pub mod export;
pub mod gate;
pub mod passgen;
pub mod profile;
pub mod record;
pub mod search;
pub mod session;
pub mod store;

pub use cipher::Cipher;
pub use error::{KeeperError, Result};
pub use export::export;
pub use gate::{GateOutcome, PasswordGate};
pub use profile::{Profile, ProfileRegistry};
pub use record::{Field, Record, RecordFields, RecordId};
pub use search::{resolve, Candidate, Scope, SearchFlow, SearchOutcome, SearchState};
pub use session::Session;
pub use store::AccountStore;
