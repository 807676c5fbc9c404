//! User registry - who may log in and where their accounts live
//!
//! Each user has a master password, a directory holding their account
//! database and a directory receiving CSV backups. Every column is stored
//! through the cipher with no reserved characters.

use crate::cipher::Cipher;
use crate::error::{KeeperError, Result};
use keeper_core::normalize_path;
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A registered user
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub password: String,
    pub database_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database_dir", &self.database_dir)
            .field("backup_dir", &self.backup_dir)
            .finish()
    }
}

impl Profile {
    /// Build a profile from typed values; the username is lowercased and
    /// both directories are normalized.
    pub fn new(username: &str, password: &str, database_dir: &str, backup_dir: &str) -> Self {
        Self {
            username: username.trim().to_lowercase(),
            password: password.to_string(),
            database_dir: normalize_path(database_dir),
            backup_dir: normalize_path(backup_dir),
        }
    }

    /// `<database_dir>/<username>.db`
    pub fn database_file(&self) -> PathBuf {
        self.database_dir.join(format!("{}.db", self.username))
    }

    /// `<backup_dir>/<username>AccountBackup.csv`
    pub fn backup_file(&self) -> PathBuf {
        self.backup_dir
            .join(format!("{}AccountBackup.csv", self.username))
    }
}

/// SQLite registry of users
pub struct ProfileRegistry {
    conn: Connection,
    cipher: Cipher,
}

impl ProfileRegistry {
    /// Open or create the registry, creating its directory if needed
    pub fn open(path: &Path, cipher: &Cipher) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| KeeperError::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, cipher)
    }

    pub fn open_in_memory(cipher: &Cipher) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, cipher)
    }

    fn with_connection(conn: Connection, cipher: &Cipher) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                database_dir TEXT NOT NULL,
                backup_dir TEXT NOT NULL
            );
            "#,
        )?;

        Ok(Self {
            conn,
            cipher: cipher.without_reserved(),
        })
    }

    /// Look up a user by name (case-insensitive)
    pub fn find(&self, username: &str) -> Result<Option<Profile>> {
        let encoded = self.cipher.encode(&username.trim().to_lowercase());
        let row = self
            .conn
            .query_row(
                "SELECT username, password, database_dir, backup_dir FROM users WHERE username = ?",
                params![encoded],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(username, password, database_dir, backup_dir)| Profile {
            username: self.cipher.decode(&username),
            password: self.cipher.decode(&password),
            database_dir: PathBuf::from(self.cipher.decode(&database_dir)),
            backup_dir: PathBuf::from(self.cipher.decode(&backup_dir)),
        }))
    }

    /// Add a user. Both directories must already exist.
    pub fn register(&mut self, profile: &Profile) -> Result<()> {
        let username = profile.username.trim().to_lowercase();
        if username.is_empty() {
            return Err(KeeperError::InvalidName);
        }
        for dir in [&profile.database_dir, &profile.backup_dir] {
            if !dir.is_dir() {
                return Err(KeeperError::InvalidDirectory(dir.clone()));
            }
        }
        if self.find(&username)?.is_some() {
            return Err(KeeperError::DuplicateName(username));
        }

        self.conn.execute(
            "INSERT INTO users (username, password, database_dir, backup_dir) VALUES (?, ?, ?, ?)",
            params![
                self.cipher.encode(&username),
                self.cipher.encode(&profile.password),
                self.cipher.encode(&profile.database_dir.to_string_lossy()),
                self.cipher.encode(&profile.backup_dir.to_string_lossy()),
            ],
        )?;

        info!(user = %username, "registered user");
        Ok(())
    }

    /// Registered usernames, sorted
    pub fn usernames(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT username FROM users")?;
        let mut names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|row| row.map(|name| self.cipher.decode(&name)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        names.sort();
        Ok(names)
    }
}
