//! Persistent key-value storage. Values are opaque strings; the store layer
//! decides what goes in them.

use anyhow::Context;
use log::{debug, trace};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
#[cfg(test)]
pub use memory::MemoryStorage;

/// A string store with get/set semantics. Every `set` overwrites the whole
/// value for that key.
pub trait Storage: Send + Sync {
    /// Get the value for a key, or `None` if it was never written
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Storage backed by a directory, with one JSON file per key
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage in the given directory, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| {
            format!("Error creating data directory {}", dir.display())
        })?;
        debug!("Using data directory {}", dir.display());
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| {
                format!("Error reading {}", path.display())
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path(key);
        trace!("Writing {} bytes to {}", value.len(), path.display());
        write_atomic(&path, value)
            .with_context(|| format!("Error writing {}", path.display()))
    }
}

/// Write to a sibling temp file then rename over the target, so a crash
/// mid-write never leaves a truncated file behind
fn write_atomic(path: &Path, value: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod memory {
    use super::Storage;
    use anyhow::anyhow;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    /// In-memory storage. Clones share the same underlying map, so a test can keep
    /// a handle to inspect what was persisted.
    #[derive(Clone, Debug, Default)]
    pub struct MemoryStorage {
        values: Arc<Mutex<HashMap<String, String>>>,
    }

    impl Storage for MemoryStorage {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            let values = self.values.lock().map_err(|err| anyhow!("{err}"))?;
            Ok(values.get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            let mut values =
                self.values.lock().map_err(|err| anyhow!("{err}"))?;
            values.insert(key.to_owned(), value.to_owned());
            Ok(())
        }
    }
}
