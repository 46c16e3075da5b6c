//! Full-size photo detail with swipe navigation

use chrono::DateTime;
use gallery_common::Photo;

use crate::favorites::FavoriteSet;

/// Display texts for the detail screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDetail {
    pub title: String,
    pub description: String,
    pub author: String,
    pub created_at: String,
}

/// Moves through a snapshot of the feed, one photo at a time
#[derive(Debug, Clone)]
pub struct DetailNavigator {
    photos: Vec<Photo>,
    index: usize,
}

impl DetailNavigator {
    /// `None` if `initial_index` does not point at a photo
    pub fn new(photos: Vec<Photo>, initial_index: usize) -> Option<Self> {
        if initial_index >= photos.len() {
            return None;
        }
        Some(Self {
            photos,
            index: initial_index,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Photo {
        &self.photos[self.index]
    }

    /// Swipe to the next photo. False at the end.
    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.photos.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Swipe to the previous photo. False at the start.
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn details(&self) -> PhotoDetail {
        let photo = self.current();
        PhotoDetail {
            title: photo
                .alt_description
                .clone()
                .unwrap_or_else(|| "Untitled".to_string()),
            description: photo
                .description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
            author: photo.author.name.clone(),
            created_at: format_date(photo.created_at.as_deref().unwrap_or_default()),
        }
    }

    pub fn is_favorite(&self, favorites: &FavoriteSet) -> bool {
        favorites.contains(&self.current().id)
    }

    /// Toggle the current photo's favorite state, returning the new state
    pub fn toggle_favorite(&self, favorites: &mut FavoriteSet) -> bool {
        favorites.toggle(&self.current().id)
    }
}

/// Render an RFC 3339 timestamp as e.g. "Feb 17, 2026"
pub fn format_date(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => "Unknown date".to_string(),
    }
}
