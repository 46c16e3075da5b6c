//! Photo models
//!
//! `PhotoDto` mirrors one record of the `/photos` listing; `Photo` is the
//! immutable domain value the rest of the application works with.

use serde::{Deserialize, Serialize};

/// One photo record as returned by the Unsplash `/photos` endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct PhotoDto {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alt_description: Option<String>,
    pub urls: UrlsDto,
    pub user: UserDto,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UrlsDto {
    pub raw: String,
    pub full: String,
    pub regular: String,
    pub small: String,
    pub thumb: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserDto {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Image URLs of a photo, from smallest to original
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrls {
    pub thumb: String,
    pub small: String,
    pub regular: String,
    pub full: String,
    pub raw: String,
}

/// Author of a photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAuthor {
    pub name: String,
    /// Empty when the service omits it
    pub username: String,
}

/// A photo in the feed. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub urls: PhotoUrls,
    pub author: PhotoAuthor,
    pub description: Option<String>,
    pub alt_description: Option<String>,
    pub created_at: Option<String>,
}

impl Photo {
    /// URL used for grid thumbnails
    pub fn thumbnail_url(&self) -> &str {
        &self.urls.thumb
    }

    /// URL used for the full-screen detail view
    pub fn regular_url(&self) -> &str {
        &self.urls.regular
    }
}

impl From<PhotoDto> for Photo {
    fn from(dto: PhotoDto) -> Self {
        Self {
            id: dto.id,
            urls: PhotoUrls {
                thumb: dto.urls.thumb,
                small: dto.urls.small,
                regular: dto.urls.regular,
                full: dto.urls.full,
                raw: dto.urls.raw,
            },
            author: PhotoAuthor {
                name: dto.user.name,
                username: dto.user.username.unwrap_or_default(),
            },
            description: dto.description,
            alt_description: dto.alt_description,
            created_at: dto.created_at,
        }
    }
}

/// Decode a `/photos` response body into domain photos, keeping order
pub fn decode_page(body: &[u8]) -> serde_json::Result<Vec<Photo>> {
    let records: Vec<PhotoDto> = serde_json::from_slice(body)?;
    Ok(records.into_iter().map(Photo::from).collect())
}
