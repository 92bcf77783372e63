use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use log::{error, warn};

/// A small persistent string map, like the local storage of a browser.
pub trait KeyValueStore {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&mut self, key: &str, value: String);
  fn remove(&mut self, key: &str);
}

/// Keeps values for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: BTreeMap<String, String>,
}

impl MemoryStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    self.values.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: String) {
    self.values.insert(key.to_string(), value);
  }

  fn remove(&mut self, key: &str) {
    self.values.remove(key);
  }
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
  path: PathBuf,
  values: BTreeMap<String, String>,
}

impl FileStore {
  /// Opens the store at `path`. A missing or unreadable file starts out empty.
  #[must_use]
  pub fn open(path: &Path) -> Self {
    let values = match std::fs::read_to_string(path) {
      Ok(content) => serde_json::from_str(&content)
        .inspect_err(|e| warn!("Ignoring malformed {}: {e}", path.display()))
        .unwrap_or_default(),
      Err(_) => BTreeMap::new(),
    };
    Self {
      path: path.to_path_buf(),
      values,
    }
  }

  fn persist(&self) {
    if let Some(dir) = self.path.parent()
      && !dir.exists()
    {
      let _ = std::fs::create_dir_all(dir).inspect_err(|e| {
        error!("Failed to create {}: {e}", dir.display());
      });
    }
    match serde_json::to_string_pretty(&self.values) {
      Ok(json) => {
        let _ = std::fs::write(&self.path, json).inspect_err(|e| {
          error!("Failed to write {}: {e}", self.path.display());
        });
      }
      Err(e) => error!("Failed to serialize ui state: {e}"),
    }
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Option<String> {
    self.values.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: String) {
    self.values.insert(key.to_string(), value);
    self.persist();
  }

  fn remove(&mut self, key: &str) {
    if self.values.remove(key).is_some() {
      self.persist();
    }
  }
}
