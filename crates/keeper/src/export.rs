//! CSV backup of every account
//!
//! One header row naming each field in declared order, then one row per
//! account ordered by name. Values are decoded before they are written.

use crate::error::Result;
use crate::record::Field;
use crate::store::AccountStore;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write every account in `store` to `destination`, replacing any existing
/// file there. Returns the number of accounts written.
pub fn export(store: &AccountStore, destination: &Path) -> Result<usize> {
    if destination.is_file() {
        fs::remove_file(destination)?;
    }

    let records = store.all_records()?;

    let mut writer = csv::Writer::from_path(destination)?;
    writer.write_record(Field::ALL.iter().map(|f| f.header()))?;
    for record in &records {
        writer.write_record(Field::ALL.iter().map(|f| record.value(*f)))?;
    }
    writer.flush()?;

    info!(rows = records.len(), path = %destination.display(), "exported accounts");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::Cipher;
    use crate::record::RecordFields;
    use keeper_core::config::DEFAULT_ALPHABET;
    use tempfile::TempDir;

    fn store() -> AccountStore {
        AccountStore::open_in_memory(Cipher::new(DEFAULT_ALPHABET, 10, "")).unwrap()
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_export_header_and_rows() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("backup.csv");
        let mut store = store();

        let mut github = RecordFields::named("GitHub");
        github.password = "s3cret".to_string();
        store.insert(&github)?;
        store.insert(&RecordFields::named("bank"))?;

        let written = export(&store, &path)?;
        assert_eq!(written, 2);

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "NAME");
        assert_eq!(rows[0][4], "PASSWORD");
        assert_eq!(rows[0].len(), 13);

        // Name order, decoded values
        assert_eq!(rows[1][0], "bank");
        assert_eq!(rows[2][0], "GitHub");
        assert_eq!(rows[2][4], "s3cret");
        assert!(!rows[2][12].is_empty());
        Ok(())
    }

    #[test]
    fn test_export_empty_store_writes_header() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("backup.csv");
        assert_eq!(export(&store(), &path)?, 0);
        assert_eq!(read_rows(&path).len(), 1);
        Ok(())
    }

    #[test]
    fn test_export_escapes_separators() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("backup.csv");
        let mut store = store();

        let mut fields = RecordFields::named("Home, \"main\"");
        fields.address = "1 Main St\nApt 2".to_string();
        store.insert(&fields)?;
        export(&store, &path)?;

        let rows = read_rows(&path);
        assert_eq!(rows[1][0], "Home, \"main\"");
        assert_eq!(rows[1][7], "1 Main St\nApt 2");
        Ok(())
    }

    #[test]
    fn test_reexport_overwrites_and_adds_one_row() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("backup.csv");
        fs::write(&path, "stale,content\nthat,should,vanish\n")?;

        let mut store = store();
        store.insert(&RecordFields::named("alpha"))?;
        store.insert(&RecordFields::named("gamma"))?;
        export(&store, &path)?;
        let first = read_rows(&path);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0][0], "NAME");

        store.insert(&RecordFields::named("beta"))?;
        export(&store, &path)?;
        let second = read_rows(&path);
        assert_eq!(second.len(), first.len() + 1);

        let before: Vec<&Vec<String>> = first.iter().skip(1).collect();
        let after: Vec<&Vec<String>> = second
            .iter()
            .skip(1)
            .filter(|row| row[0] != "beta")
            .collect();
        assert_eq!(before, after);
        Ok(())
    }

    #[test]
    fn test_export_into_directory_fails() -> Result<()> {
        let tmp = TempDir::new()?;
        assert!(export(&store(), tmp.path()).is_err());
        assert!(tmp.path().is_dir());
        Ok(())
    }
}
