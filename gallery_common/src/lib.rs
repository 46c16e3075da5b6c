//! Shared types for the photo gallery
//!
//! Domain models decoded from the Unsplash photo listing and the closed
//! error taxonomy used by every layer above the HTTP client.

pub mod error;
pub mod models;

pub use error::{ErrorKind, Result};
pub use models::{decode_page, Photo, PhotoAuthor, PhotoDto, PhotoUrls};
