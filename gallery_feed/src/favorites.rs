//! Favorite photo ids, persisted in a small JSON key-value file
//!
//! The set is loaded once at startup and written through on every toggle.
//! Persistence failures are logged and never interrupt the user.

use gallery_common::Photo;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which favorite ids are stored
pub const FAVORITES_KEY: &str = "favorite_photos";

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String-list values stored by key in one JSON file
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    values: HashMap<String, Vec<String>>,
}

impl JsonStore {
    /// Load the store from disk, or start empty if it is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(values) => values,
                    Err(e) => {
                        log::warn!("Failed to parse store {:?}, starting fresh: {}", path, e);
                        HashMap::new()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read store {:?}, starting fresh: {}", path, e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Replace the value under `key` and write the file
    pub fn set(&mut self, key: &str, values: Vec<String>) -> Result<(), FavoritesError> {
        self.values.insert(key.to_string(), values);
        self.save()
    }

    fn save(&self) -> Result<(), FavoritesError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        log::debug!("Saved store {:?}", self.path);
        Ok(())
    }
}

/// Set of favorite photo ids
#[derive(Debug)]
pub struct FavoriteSet {
    store: JsonStore,
    ids: HashSet<String>,
}

impl FavoriteSet {
    pub fn load(store: JsonStore) -> Self {
        let ids: HashSet<String> = store
            .get(FAVORITES_KEY)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        log::info!("Loaded {} favorites", ids.len());
        Self { store, ids }
    }

    /// Open the store at `path` and load the favorites from it
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::load(JsonStore::open(path))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Flip membership of `id` and persist. Returns the new membership.
    pub fn toggle(&mut self, id: &str) -> bool {
        let now_favorite = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        };

        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        if let Err(e) = self.store.set(FAVORITES_KEY, ids) {
            log::warn!("Failed to save favorites: {}", e);
        }
        now_favorite
    }

    pub fn all_ids(&self) -> HashSet<String> {
        self.ids.clone()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Loaded photos that are favorites, in feed order
pub fn favorite_photos(photos: &[Photo], favorites: &FavoriteSet) -> Vec<Photo> {
    photos
        .iter()
        .filter(|p| favorites.contains(&p.id))
        .cloned()
        .collect()
}
