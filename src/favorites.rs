use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Result, ShelfError};

/// String-keyed persistence backing the favorites set
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// XDG-compatible data directory: ~/.local/share/shelf/ (Linux) or
    /// ~/Library/Application Support/shelf/ (macOS)
    pub fn default_location() -> Option<Self> {
        Some(Self::new(dirs::data_dir()?.join("shelf")))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(['/', '\\'], "_")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| ShelfError::Persistence(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Favorite store ids, written through to a `KeyValueStore` on every toggle.
pub struct FavoritesStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
    ids: Vec<String>,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("key", &self.key)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl FavoritesStore {
    /// Read the persisted set once. Missing or corrupt data is an empty set.
    pub fn load(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let ids = match backend.get(&key) {
            None => Vec::new(),
            Some(raw) => match parse_ids(&raw) {
                Ok(ids) => dedup(ids),
                Err(e) => {
                    tracing::warn!(key = %key, "discarding unreadable favorites: {}", e);
                    Vec::new()
                }
            },
        };
        Self { backend, key, ids }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    /// Flip membership and persist the whole set. Returns the new membership.
    /// On a failed write the in-memory set still reflects the toggle.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let now_favorite = if let Some(pos) = self.ids.iter().position(|f| f == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        };
        self.persist()?;
        Ok(now_favorite)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let json =
            serde_json::to_string(&self.ids).map_err(|e| ShelfError::Persistence(e.to_string()))?;
        self.backend.set(&self.key, &json).map_err(|e| {
            tracing::warn!(key = %self.key, "failed to persist favorites: {}", e);
            e
        })
    }
}

/// Ids written by older clients may be bare JSON numbers.
fn parse_ids(raw: &str) -> serde_json::Result<Vec<String>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const KEY: &str = "favoriteStores";

    /// Shares one MemoryStore between the favorites store and the test.
    struct Shared(Arc<MemoryStore>);

    impl KeyValueStore for Shared {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.0.set(key, value)
        }
    }

    fn shared_store() -> (Arc<MemoryStore>, FavoritesStore) {
        let memory = Arc::new(MemoryStore::new());
        let favorites = FavoritesStore::load(Box::new(Shared(Arc::clone(&memory))), KEY);
        (memory, favorites)
    }

    #[test]
    fn toggle_writes_through() {
        let (memory, mut favorites) = shared_store();

        assert!(favorites.toggle("store-7").unwrap());
        assert!(favorites.is_favorite("store-7"));
        assert_eq!(memory.get(KEY).as_deref(), Some(r#"["store-7"]"#));

        assert!(!favorites.toggle("store-7").unwrap());
        assert!(!favorites.is_favorite("store-7"));
        assert_eq!(memory.get(KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn toggle_keeps_insertion_order() {
        let (memory, mut favorites) = shared_store();
        favorites.toggle("b").unwrap();
        favorites.toggle("a").unwrap();
        favorites.toggle("c").unwrap();
        favorites.toggle("a").unwrap();
        assert_eq!(favorites.ids(), &["b".to_string(), "c".to_string()]);
        assert_eq!(memory.get(KEY).as_deref(), Some(r#"["b","c"]"#));
    }

    #[test]
    fn loads_existing_set() {
        let memory = MemoryStore::new();
        memory.set(KEY, r#"["1","2","1"]"#).unwrap();
        let favorites = FavoritesStore::load(Box::new(memory), KEY);
        assert_eq!(favorites.len(), 2);
        assert!(favorites.is_favorite("1"));
        assert!(favorites.is_favorite("2"));
    }

    #[test]
    fn numeric_ids_are_read_as_strings() {
        let memory = MemoryStore::new();
        memory.set(KEY, "[3, 14]").unwrap();
        let favorites = FavoritesStore::load(Box::new(memory), KEY);
        assert!(favorites.is_favorite("3"));
        assert!(favorites.is_favorite("14"));
    }

    #[test]
    fn corrupt_value_is_empty_set() {
        let memory = MemoryStore::new();
        memory.set(KEY, "{not json").unwrap();
        let favorites = FavoritesStore::load(Box::new(memory), KEY);
        assert!(favorites.is_empty());
    }

    #[test]
    fn missing_value_is_empty_set() {
        let favorites = FavoritesStore::load(Box::new(MemoryStore::new()), KEY);
        assert!(favorites.is_empty());
    }

    #[test]
    fn file_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("nested");

        let mut favorites = FavoritesStore::load(Box::new(FileStore::new(store_dir.clone())), KEY);
        favorites.toggle("42").unwrap();
        favorites.toggle("store-7").unwrap();

        let reloaded = FavoritesStore::load(Box::new(FileStore::new(store_dir.clone())), KEY);
        assert_eq!(reloaded.ids(), favorites.ids());

        let raw = std::fs::read_to_string(store_dir.join("favoriteStores.json")).unwrap();
        assert_eq!(raw, r#"["42","store-7"]"#);
    }

    struct ReadOnly;

    impl KeyValueStore for ReadOnly {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ShelfError::Persistence("read-only".to_string()))
        }
    }

    #[test]
    fn failed_write_is_reported() {
        let mut favorites = FavoritesStore::load(Box::new(ReadOnly), KEY);
        assert!(favorites.toggle("x").is_err());
        assert!(favorites.is_favorite("x"));
    }
}
