use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error};

/// Directory-backed key/value store. Each key is one JSON file.
///
/// Failures are logged and swallowed: a broken record reads as absent and a
/// failed write leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{}.json", safe))
    }

    /// Read a value, `None` if missing or unreadable
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.item_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                error!("Error reading {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Error parsing {}: {}", key, e);
                None
            }
        }
    }

    /// Write a value, replacing the previous one atomically
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let path = self.item_path(key);
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!("Error serializing {}: {}", key, e);
                return;
            }
        };

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, json).await {
            error!("Error saving {}: {}", key, e);
            return;
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            error!("Error saving {}: {}", key, e);
            return;
        }
        debug!("Saved {} to {}", key, path.display());
    }

    /// Delete a value; missing keys are not an error
    pub async fn remove_item(&self, key: &str) {
        match fs::remove_file(self.item_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("Error removing {}: {}", key, e),
        }
    }
}
