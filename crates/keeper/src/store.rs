//! SQLite store for account records
//!
//! Every field value is encoded with the session cipher before it is written
//! and decoded after it is read, so the database file only ever holds
//! obscured text. That includes `date_modified`, a "Mon DD, YYYY" stamp
//! refreshed on every create and update.
//!
//! Records are keyed by their encoded name, which is also the [`RecordId`]
//! handed back to callers.

use crate::cipher::Cipher;
use crate::error::{KeeperError, Result};
use crate::record::{Field, Record, RecordFields, RecordId};
use chrono::{Local, NaiveDate};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

/// Format of the `date_modified` stamp
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// Words that mean "keep the current value" when updating a field
pub const KEEP_SENTINELS: [&str; 2] = ["same", "keep"];

/// Is `value` one of the keep sentinels (case-insensitive)?
pub fn is_keep_sentinel(value: &str) -> bool {
    KEEP_SENTINELS.iter().any(|s| value.eq_ignore_ascii_case(s))
}

/// Date stamp for `date`
pub fn date_stamp(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Date stamp for the current local date
pub fn today_stamp() -> String {
    date_stamp(Local::now().date_naive())
}

/// Case-insensitive ordering used wherever names are listed
pub(crate) fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Durable account collection bound to one database file
pub struct AccountStore {
    conn: Connection,
    cipher: Cipher,
}

impl AccountStore {
    /// Open or create the store at `path`.
    ///
    /// The parent directory must already exist.
    pub fn open(path: &Path, cipher: Cipher) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| KeeperError::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut store = Self { conn, cipher };
        store.init_schema().map_err(|e| match e {
            KeeperError::Sqlite(source) => KeeperError::StorageUnavailable {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(store)
    }

    /// Open a throwaway store that lives in memory
    pub fn open_in_memory(cipher: Cipher) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn, cipher };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema; leaves existing data alone
    fn init_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL DEFAULT '',
                access_code TEXT NOT NULL DEFAULT '',
                website TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                phone_number TEXT NOT NULL DEFAULT '',
                miscellaneous_info TEXT NOT NULL DEFAULT '',
                pending_tasks TEXT NOT NULL DEFAULT '',
                search_tags TEXT NOT NULL DEFAULT '',
                date_modified TEXT NOT NULL DEFAULT ''
            );
            "#,
        )?;
        Ok(())
    }

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    /// Add a new account and return its handle
    pub fn insert(&mut self, fields: &RecordFields) -> Result<RecordId> {
        if fields.name.is_empty() {
            return Err(KeeperError::InvalidName);
        }

        let encoded = fields.map_values(|v| self.cipher.encode(v));
        if self.contains_encoded(&encoded.name)? {
            return Err(KeeperError::DuplicateName(fields.name.clone()));
        }

        let mut values: Vec<String> = Field::EDITABLE
            .iter()
            .map(|f| encoded.get(*f).to_string())
            .collect();
        values.push(self.cipher.encode(&today_stamp()));

        let sql = format!(
            "INSERT INTO accounts ({}) VALUES ({})",
            column_list(),
            vec!["?"; Field::ALL.len()].join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| duplicate_or(e, &fields.name))?;

        debug!("inserted account");
        Ok(RecordId::from_encoded(encoded.name))
    }

    /// Replace the fields of an existing account.
    ///
    /// A field whose new value is a keep sentinel ("same"/"keep") retains
    /// its current value. Every other value, including the empty string,
    /// overwrites. The date stamp is always refreshed. Returns the handle
    /// under the (possibly new) name.
    pub fn update(&mut self, id: &RecordId, new_fields: &RecordFields) -> Result<RecordId> {
        let current = self
            .load_encoded(id)?
            .ok_or_else(|| self.not_found(id))?;

        let mut merged = RecordFields::default();
        for field in Field::EDITABLE {
            let value = new_fields.get(field);
            let stored = if is_keep_sentinel(value) {
                current.get(field).to_string()
            } else {
                self.cipher.encode(value)
            };
            merged.set(field, stored);
        }

        if merged.name.is_empty() {
            return Err(KeeperError::InvalidName);
        }
        if merged.name != id.as_encoded() && self.contains_encoded(&merged.name)? {
            return Err(KeeperError::DuplicateName(self.cipher.decode(&merged.name)));
        }

        let assignments: Vec<String> = Field::ALL
            .iter()
            .map(|f| format!("{} = ?", f.column()))
            .collect();
        let sql = format!("UPDATE accounts SET {} WHERE name = ?", assignments.join(", "));

        let mut values: Vec<String> = Field::EDITABLE
            .iter()
            .map(|f| merged.get(*f).to_string())
            .collect();
        values.push(self.cipher.encode(&today_stamp()));
        values.push(id.as_encoded().to_string());

        let new_name = self.cipher.decode(&merged.name);
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| duplicate_or(e, &new_name))?;
        if changed == 0 {
            return Err(self.not_found(id));
        }

        debug!("updated account");
        Ok(RecordId::from_encoded(merged.name))
    }

    /// Delete an account
    pub fn remove(&mut self, id: &RecordId) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM accounts WHERE name = ?",
            params![id.as_encoded()],
        )?;
        if changed == 0 {
            return Err(self.not_found(id));
        }

        debug!("removed account");
        Ok(())
    }

    /// Read and decode one account
    pub fn get(&self, id: &RecordId) -> Result<Record> {
        let sql = format!("SELECT {} FROM accounts WHERE name = ?", column_list());
        let row = self
            .conn
            .query_row(&sql, params![id.as_encoded()], row_to_encoded)
            .optional()?;

        match row {
            Some(encoded) => Ok(self.decode_record(encoded)),
            None => Err(self.not_found(id)),
        }
    }

    /// Does an account with this handle exist?
    pub fn contains(&self, id: &RecordId) -> Result<bool> {
        self.contains_encoded(id.as_encoded())
    }

    /// Decoded name of a handle
    pub fn name_of(&self, id: &RecordId) -> String {
        self.cipher.decode(id.as_encoded())
    }

    /// Number of stored accounts
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// (name, pending tasks) for every account with pending tasks, by name
    pub fn list_tasks(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, pending_tasks FROM accounts WHERE pending_tasks <> ''",
        )?;

        let mut tasks = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .map(|row| {
                row.map(|(name, tasks)| (self.cipher.decode(&name), self.cipher.decode(&tasks)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tasks.sort_by(|a, b| compare_names(&a.0, &b.0));
        Ok(tasks)
    }

    /// Every account, decoded, ordered by name
    pub fn all_records(&self) -> Result<Vec<Record>> {
        let sql = format!("SELECT {} FROM accounts", column_list());
        let mut stmt = self.conn.prepare(&sql)?;

        let mut records = stmt
            .query_map([], row_to_encoded)?
            .map(|row| row.map(|encoded| self.decode_record(encoded)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        records.sort_by(|a, b| compare_names(&a.fields.name, &b.fields.name));
        Ok(records)
    }

    /// Handles of every account
    pub fn ids(&self) -> Result<Vec<RecordId>> {
        let mut stmt = self.conn.prepare("SELECT name FROM accounts")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|row| row.map(RecordId::from_encoded))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Handles of accounts where `encoded_query` occurs in any of `fields`.
    ///
    /// Matching is a case-sensitive substring test on the stored (encoded)
    /// text.
    pub fn ids_matching(&self, encoded_query: &str, fields: &[Field]) -> Result<Vec<RecordId>> {
        if fields.is_empty() {
            return Ok(vec![]);
        }

        let conditions: Vec<String> = fields
            .iter()
            .map(|f| format!("instr({}, ?1) > 0", f.column()))
            .collect();
        let sql = format!("SELECT name FROM accounts WHERE {}", conditions.join(" OR "));

        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![encoded_query], |row| row.get::<_, String>(0))?
            .map(|row| row.map(RecordId::from_encoded))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Write every account to a CSV file, see [`crate::export::export`]
    pub fn export(&self, destination: &Path) -> Result<usize> {
        crate::export::export(self, destination)
    }

    fn contains_encoded(&self, encoded_name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM accounts WHERE name = ?",
                params![encoded_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load_encoded(&self, id: &RecordId) -> Result<Option<RecordFields>> {
        let sql = format!("SELECT {} FROM accounts WHERE name = ?", column_list());
        let row = self
            .conn
            .query_row(&sql, params![id.as_encoded()], row_to_encoded)
            .optional()?;
        Ok(row.map(|(fields, _)| fields))
    }

    fn decode_record(&self, (fields, date_modified): (RecordFields, String)) -> Record {
        Record {
            fields: fields.map_values(|v| self.cipher.decode(v)),
            date_modified: self.cipher.decode(&date_modified),
        }
    }

    fn not_found(&self, id: &RecordId) -> KeeperError {
        KeeperError::NotFound(self.name_of(id))
    }
}

/// Columns in declared order, for SELECT and INSERT
fn column_list() -> String {
    Field::ALL
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a row selected with [`column_list`] without decoding it
fn row_to_encoded(row: &Row<'_>) -> rusqlite::Result<(RecordFields, String)> {
    let mut fields = RecordFields::default();
    for (i, field) in Field::EDITABLE.iter().enumerate() {
        fields.set(*field, row.get(i)?);
    }
    let date_modified: String = row.get(Field::EDITABLE.len())?;
    Ok((fields, date_modified))
}

/// Map a UNIQUE violation on `name` to a duplicate-name error
fn duplicate_or(err: rusqlite::Error, name: &str) -> KeeperError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            KeeperError::DuplicateName(name.to_string())
        }
        _ => KeeperError::Sqlite(err),
    }
}
