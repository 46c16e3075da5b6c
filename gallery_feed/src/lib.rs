//! Gallery Feed - paginated Unsplash browsing
//!
//! Loads the photo listing page by page, caches image bytes in memory with
//! request coalescing, drops image results for slots that moved on, and
//! keeps a persisted set of favorite photos.

pub mod config;
pub mod detail;
pub mod favorites;
pub mod feed;
pub mod image_cache;
pub mod image_loader;
pub mod scroll;
pub mod stale_guard;
pub mod unsplash;

pub use config::GalleryConfig;
pub use detail::{DetailNavigator, PhotoDetail};
pub use favorites::{favorite_photos, FavoriteSet, JsonStore};
pub use feed::{FeedController, FeedEvent, FeedState};
pub use image_cache::{CacheStats, ImageCache, KeyedAsyncCache};
pub use image_loader::{ImageLoader, ImageSlot, LoadedImage, SlotContent};
pub use scroll::ScrollPosition;
pub use stale_guard::{FetchTicket, StaleGuard};
pub use unsplash::{PhotoSource, UnsplashClient};

pub use gallery_common::{ErrorKind, Photo};
