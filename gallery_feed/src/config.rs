//! Runtime configuration for the gallery feed

use std::path::PathBuf;

/// Environment variable holding the Unsplash access key
pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.unsplash.com";
pub const DEFAULT_PER_PAGE: u32 = 30;
/// Parallel image downloads per loader
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 5;

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub base_url: String,
    /// `None` when no usable key is configured
    pub access_key: Option<String>,
    pub per_page: u32,
    pub max_concurrent_downloads: usize,
    pub favorites_path: PathBuf,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key: None,
            per_page: DEFAULT_PER_PAGE,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            favorites_path: default_favorites_path(),
        }
    }
}

impl GalleryConfig {
    /// Defaults plus the access key from the environment
    pub fn from_env() -> Self {
        let access_key = normalize_access_key(std::env::var(ACCESS_KEY_ENV).ok());
        if access_key.is_none() {
            log::warn!("{} environment variable not set", ACCESS_KEY_ENV);
        } else {
            log::info!("{} environment variable found", ACCESS_KEY_ENV);
        }
        Self {
            access_key,
            ..Self::default()
        }
    }

    pub fn with_access_key(mut self, key: Option<String>) -> Self {
        self.access_key = normalize_access_key(key);
        self
    }
}

/// Treats blank keys as absent and trims surrounding whitespace
pub fn normalize_access_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Returns the default favorites file: ~/.local/share/gallery_feed/favorites.json
pub fn default_favorites_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gallery_feed")
        .join("favorites.json")
}
