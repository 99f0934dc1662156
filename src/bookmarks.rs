use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Named URLs saved by a browser.
pub trait BookmarkStore: Send + Sync {
    /// Saves `url` under `name`; names are never overwritten.
    fn save(&self, name: &str, url: &str) -> Result<()>;

    /// Returns the URL saved under `name`.
    fn read(&self, name: &str) -> Result<String>;

    /// Removes a bookmark, returning whether it existed.
    fn remove(&self, name: &str) -> Result<bool>;

    fn has(&self, name: &str) -> bool;

    fn all(&self) -> BTreeMap<String, String>;
}

fn guard(map: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    match map.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Bookmarks kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryBookmarks {
    bookmarks: Mutex<BTreeMap<String, String>>,
}

impl MemoryBookmarks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookmarkStore for MemoryBookmarks {
    fn save(&self, name: &str, url: &str) -> Result<()> {
        let mut bookmarks = guard(&self.bookmarks);
        if bookmarks.contains_key(name) {
            return Err(Error::BookmarkExists(name.to_string()));
        }
        bookmarks.insert(name.to_string(), url.to_string());
        Ok(())
    }

    fn read(&self, name: &str) -> Result<String> {
        guard(&self.bookmarks)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::BookmarkNotFound(name.to_string()))
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(guard(&self.bookmarks).remove(name).is_some())
    }

    fn has(&self, name: &str) -> bool {
        guard(&self.bookmarks).contains_key(name)
    }

    fn all(&self) -> BTreeMap<String, String> {
        guard(&self.bookmarks).clone()
    }
}

/// Bookmarks persisted as a JSON object in a file.
///
/// The file is read once when the store is opened and rewritten after every
/// change.
#[derive(Debug)]
pub struct FileBookmarks {
    path: PathBuf,
    bookmarks: Mutex<BTreeMap<String, String>>,
}

impl FileBookmarks {
    /// Opens the store, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bookmarks = if path.exists() {
            let mut file = File::open(&path)?;
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };
        ::log::debug!("Loaded {} bookmarks from {}", bookmarks.len(), path.display());

        Ok(Self {
            path,
            bookmarks: Mutex::new(bookmarks),
        })
    }

    /// File the bookmarks are written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, bookmarks: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(bookmarks)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl BookmarkStore for FileBookmarks {
    fn save(&self, name: &str, url: &str) -> Result<()> {
        let mut bookmarks = guard(&self.bookmarks);
        if bookmarks.contains_key(name) {
            return Err(Error::BookmarkExists(name.to_string()));
        }
        bookmarks.insert(name.to_string(), url.to_string());
        if let Err(e) = self.write(&bookmarks) {
            bookmarks.remove(name);
            return Err(e);
        }
        Ok(())
    }

    fn read(&self, name: &str) -> Result<String> {
        guard(&self.bookmarks)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::BookmarkNotFound(name.to_string()))
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let mut bookmarks = guard(&self.bookmarks);
        if bookmarks.remove(name).is_none() {
            return Ok(false);
        }
        self.write(&bookmarks)?;
        Ok(true)
    }

    fn has(&self, name: &str) -> bool {
        guard(&self.bookmarks).contains_key(name)
    }

    fn all(&self) -> BTreeMap<String, String> {
        guard(&self.bookmarks).clone()
    }
}
