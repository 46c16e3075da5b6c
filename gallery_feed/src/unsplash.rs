//! Unsplash API client
//!
//! The only place that talks HTTP. Every transport or status failure is
//! mapped into [`ErrorKind`] before it reaches the feed or the cache.

use async_trait::async_trait;
use bytes::Bytes;
use gallery_common::{decode_page, ErrorKind, Photo, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};

use crate::config::{GalleryConfig, DEFAULT_BASE_URL, DEFAULT_PER_PAGE};

/// Remote source of photo pages and image bytes
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fetch one page of the listing. Pages start at 1.
    async fn fetch_page(&self, page: u32) -> Result<Vec<Photo>>;

    /// Fetch raw image bytes from an absolute URL
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;
}

/// Unsplash REST client
pub struct UnsplashClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) access_key: Option<String>,
    pub(crate) per_page: u32,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>) -> Self {
        log::info!("Creating Unsplash API client");
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            per_page: config.per_page,
            ..Self::new(config.access_key.clone())
        }
    }

    /// Points the client at another server (mock servers in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            log::warn!("Invalid base URL {}: {}", self.base_url, e);
            ErrorKind::InvalidUrl
        })?;
        url.path_segments_mut()
            .map_err(|_| ErrorKind::InvalidUrl)?
            .pop_if_empty()
            .push("photos");
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &self.per_page.to_string());
        Ok(url)
    }
}

fn transport_error(err: reqwest::Error) -> ErrorKind {
    log::warn!("Request failed: {}", err);
    ErrorKind::Network
}

#[async_trait]
impl PhotoSource for UnsplashClient {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Photo>> {
        let Some(access_key) = self.access_key.as_deref() else {
            log::warn!("No access key configured, not requesting page {}", page);
            return Err(ErrorKind::MissingAccessKey);
        };
        let url = self.page_url(page)?;

        log::debug!("Fetching photo page: {}", url);

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Client-ID {access_key}"))
            .send()
            .await
            .map_err(transport_error)?;

        if let Some(kind) = ErrorKind::from_status(response.status()) {
            log::warn!("Page {} request returned {}", page, response.status());
            return Err(kind);
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let photos = decode_page(&body).map_err(|e| {
            log::warn!("Failed to decode page {}: {}", page, e);
            ErrorKind::Decoding
        })?;

        log::info!("Fetched page {} with {} photos", page, photos.len());
        Ok(photos)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let url = Url::parse(url).map_err(|e| {
            log::warn!("Invalid image URL {}: {}", url, e);
            ErrorKind::InvalidUrl
        })?;

        log::debug!("Fetching image: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        if let Some(kind) = ErrorKind::from_status(response.status()) {
            log::warn!("Image request returned {}", response.status());
            return Err(kind);
        }

        response.bytes().await.map_err(transport_error)
    }
}

#[cfg(test)]
#[path = "unsplash_tests.rs"]
mod tests;
