use rsvp_contract::{CacheError, CacheStore};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Cache backed by a directory holding one `<key>.json` file per key.
pub struct FileCacheStore {
    base_path: PathBuf,
}

impl FileCacheStore {
    /// Create a file cache rooted at `base_path`. The directory is created on
    /// first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub(crate) fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{key}.json")))
    }

    /// Validate that a key is safe for use as a filename.
    /// Rejects path separators, `..`, and control characters.
    fn validate_key(key: &str) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("cache key cannot be empty".to_string()));
        }
        if key.contains('/') || key.contains('\\') || key.contains("..") || key.contains('\0') {
            return Err(CacheError::InvalidKey(format!(
                "cache key contains invalid characters: {key:?}"
            )));
        }
        if key.chars().any(|c| c.is_control()) {
            return Err(CacheError::InvalidKey(format!(
                "cache key contains control characters: {key:?}"
            )));
        }
        Ok(())
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.base_path)?;

        let tmp_path = self
            .base_path
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));

        let write_result = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.flush()?;
            file.sync_all()?;
            drop(file);
            match fs::rename(&tmp_path, &path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    fs::remove_file(&path)?;
                    fs::rename(&tmp_path, &path)?;
                }
                Err(e) => return Err(e),
            }
            Ok::<(), std::io::Error>(())
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(CacheError::Io(e));
        }
        Ok(())
    }
}
