use crate::error::{JournalError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const ENTRIES_KEY: &str = "diaryEntries";
pub const CATEGORIES_KEY: &str = "categories";
pub const THEME_KEY: &str = "theme";
pub const HAS_PASSWORD_KEY: &str = "hasPassword";

/// Key-value store of whole JSON blobs, one `<key>.json` file per key.
///
/// Every `set` rewrites the full value; there are no partial updates.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| JournalError::storage(&dir, e))?;
        Ok(Store { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Returns `Ok(None)` when nothing was ever stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        let serialized = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(JournalError::storage(path, e)),
        };
        serde_json::from_str(&serialized)
            .map(Some)
            .map_err(|source| JournalError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let serialized = serde_json::to_string(value)?;
        fs::write(&tmp, serialized).map_err(|e| JournalError::storage(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| JournalError::storage(&path, e))?;
        tracing::debug!("Stored '{}' at {}", key, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        let value: Option<Vec<String>> = store.get(ENTRIES_KEY).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn set_replaces_the_whole_value() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path().join("nested")).unwrap();
        store.set(CATEGORIES_KEY, &vec!["a", "b"]).unwrap();
        store.set(CATEGORIES_KEY, &vec!["c"]).unwrap();

        let value: Option<Vec<String>> = store.get(CATEGORIES_KEY).unwrap();
        assert_eq!(value, Some(vec!["c".to_string()]));
        assert!(temp.path().join("nested").join("categories.json").exists());
    }

    #[test]
    fn corrupt_blob_is_reported() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        fs::write(temp.path().join("theme.json"), "{not json").unwrap();

        let err = store.get::<String>(THEME_KEY).unwrap_err();
        assert!(matches!(err, JournalError::Corrupt { ref key, .. } if key == THEME_KEY));
    }
}
