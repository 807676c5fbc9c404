//! Session - one logged-in user and their open store
//!
//! Created at login and passed explicitly to everything that needs the
//! store; there is no global "current user".

use crate::cipher::Cipher;
use crate::error::{KeeperError, Result};
use crate::export::export;
use crate::gate::PasswordGate;
use crate::profile::{Profile, ProfileRegistry};
use crate::search::{resolve, Scope, SearchOutcome};
use crate::store::AccountStore;
use std::path::{Path, PathBuf};
use tracing::info;

/// Answers to the username prompt that leave instead of logging in
pub const QUIT_WORDS: [&str; 4] = ["", "exit", "quit", "leave"];

pub fn is_quit_word(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    QUIT_WORDS.contains(&input.as_str())
}

pub struct Session {
    user: String,
    store: AccountStore,
    backup_file: PathBuf,
}

impl Session {
    /// Open the profile's store. Its database directory must exist.
    pub fn open(profile: &Profile, cipher: Cipher) -> Result<Self> {
        if !profile.database_dir.is_dir() {
            return Err(KeeperError::InvalidDirectory(profile.database_dir.clone()));
        }

        let store = AccountStore::open(&profile.database_file(), cipher)?;
        Ok(Self {
            user: profile.username.clone(),
            store,
            backup_file: profile.backup_file(),
        })
    }

    /// Look up `username`, check the master password through `gate` and
    /// open the session. `Ok(None)` means the gate denied access.
    pub fn login<F>(
        registry: &ProfileRegistry,
        username: &str,
        gate: &PasswordGate,
        cipher: &Cipher,
        read_attempt: F,
    ) -> Result<Option<Self>>
    where
        F: FnMut(u32) -> std::io::Result<String>,
    {
        let profile = registry
            .find(username)?
            .ok_or_else(|| KeeperError::UnknownUser(username.trim().to_lowercase()))?;

        if !gate.admit(&profile.password, read_attempt)?.is_granted() {
            return Ok(None);
        }

        let session = Self::open(&profile, cipher.clone())?;
        info!(user = %session.user, "session opened");
        Ok(Some(session))
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AccountStore {
        &mut self.store
    }

    pub fn backup_file(&self) -> &Path {
        &self.backup_file
    }

    /// One search step over this session's store
    pub fn search(&self, query: &str, scope: &Scope) -> Result<SearchOutcome> {
        resolve(&self.store, query, scope)
    }

    /// Export every account to the profile's backup file
    pub fn backup(&self) -> Result<usize> {
        export(&self.store, &self.backup_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordFields;
    use keeper_core::config::DEFAULT_ALPHABET;
    use tempfile::TempDir;

    fn cipher() -> Cipher {
        Cipher::new(DEFAULT_ALPHABET, 10, "")
    }

    fn registry_with_alice(tmp: &TempDir) -> ProfileRegistry {
        let mut registry = ProfileRegistry::open_in_memory(&cipher()).unwrap();
        let dir = tmp.path().to_string_lossy().to_string();
        registry
            .register(&Profile::new("alice", "open sesame", &dir, &dir))
            .unwrap();
        registry
    }

    #[test]
    fn test_login_granted() -> Result<()> {
        let tmp = TempDir::new()?;
        let registry = registry_with_alice(&tmp);

        let session = Session::login(&registry, "Alice", &PasswordGate::new(3), &cipher(), |_| {
            Ok("open sesame".to_string())
        })?
        .expect("granted");

        assert_eq!(session.user(), "alice");
        assert_eq!(session.backup_file(), tmp.path().join("aliceAccountBackup.csv"));
        assert!(tmp.path().join("alice.db").exists());
        Ok(())
    }

    #[test]
    fn test_login_denied() -> Result<()> {
        let tmp = TempDir::new()?;
        let registry = registry_with_alice(&tmp);

        let session = Session::login(&registry, "alice", &PasswordGate::new(3), &cipher(), |_| {
            Ok("guess".to_string())
        })?;
        assert!(session.is_none());
        assert!(!tmp.path().join("alice.db").exists());
        Ok(())
    }

    #[test]
    fn test_login_unknown_user() -> Result<()> {
        let tmp = TempDir::new()?;
        let registry = registry_with_alice(&tmp);

        let result = Session::login(&registry, "mallory", &PasswordGate::new(3), &cipher(), |_| {
            Ok(String::new())
        });
        assert!(matches!(result, Err(KeeperError::UnknownUser(ref u)) if u == "mallory"));
        Ok(())
    }

    #[test]
    fn test_session_search_and_backup() -> Result<()> {
        let tmp = TempDir::new()?;
        let dir = tmp.path().to_string_lossy().to_string();
        let profile = Profile::new("bob", "pw", &dir, &dir);
        let mut session = Session::open(&profile, cipher())?;

        let id = session.store_mut().insert(&RecordFields::named("GitHub"))?;
        assert_eq!(session.search("Hub", &Scope::default())?, SearchOutcome::Resolved(id));

        assert_eq!(session.backup()?, 1);
        assert!(tmp.path().join("bobAccountBackup.csv").is_file());
        Ok(())
    }

    #[test]
    fn test_open_requires_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone").to_string_lossy().to_string();
        let profile = Profile::new("bob", "pw", &missing, &missing);
        assert!(matches!(
            Session::open(&profile, cipher()),
            Err(KeeperError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn test_quit_words() {
        for word in ["", "exit", "QUIT", " leave "] {
            assert!(is_quit_word(word));
        }
        assert!(!is_quit_word("alice"));
    }
}
