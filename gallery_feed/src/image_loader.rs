//! Background image loading for display slots
//!
//! The owner (UI) thread holds the slots and the loader. Requests that miss
//! the cache are fetched on the tokio runtime; results come back over a
//! channel and are applied on the owner thread by [`ImageLoader::poll`],
//! where each slot's [`StaleGuard`] decides whether they still matter.

use bytes::Bytes;
use gallery_common::{ErrorKind, Result};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;

use crate::image_cache::ImageCache;
use crate::stale_guard::{FetchTicket, StaleGuard};
use crate::unsplash::PhotoSource;

pub type SlotId = usize;

/// What a slot currently displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    Empty,
    Loading,
    Ready(Bytes),
    /// Broken-image placeholder
    Failed(ErrorKind),
}

/// Message sent from background image loader tasks
#[derive(Debug)]
pub struct LoadedImage {
    pub slot: SlotId,
    pub ticket: FetchTicket,
    pub result: Result<Bytes>,
}

/// Delivers the result of one background load. Dropped unsent (the task
/// panicked or was shut down), it delivers a network failure instead so
/// the load is never left pending.
struct LoadReport {
    slot: SlotId,
    ticket: FetchTicket,
    sender: UnboundedSender<LoadedImage>,
    sent: bool,
}

impl LoadReport {
    fn send(mut self, result: Result<Bytes>) {
        self.sent = true;
        // Receiver gone means the owner shut down
        let _ = self.sender.send(LoadedImage {
            slot: self.slot,
            ticket: self.ticket.clone(),
            result,
        });
    }
}

impl Drop for LoadReport {
    fn drop(&mut self) {
        if !self.sent {
            log::warn!(
                "Load of {} for slot {} ended without a result",
                self.ticket.key(),
                self.slot
            );
            let _ = self.sender.send(LoadedImage {
                slot: self.slot,
                ticket: self.ticket.clone(),
                result: Err(ErrorKind::Network),
            });
        }
    }
}

/// A display surface for one image (a grid cell or the detail view)
#[derive(Debug)]
pub struct ImageSlot {
    id: SlotId,
    guard: StaleGuard,
    content: SlotContent,
}

impl ImageSlot {
    pub fn new(id: SlotId) -> Self {
        Self {
            id,
            guard: StaleGuard::new(),
            content: SlotContent::Empty,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn content(&self) -> &SlotContent {
        &self.content
    }

    /// Key the slot is currently assigned to
    pub fn current_key(&self) -> Option<&str> {
        self.guard.current()
    }

    /// Clear content and assignment before the slot is reused
    pub fn reset(&mut self) {
        self.guard.reset();
        self.content = SlotContent::Empty;
    }

    /// Apply a finished load. Returns false if it was stale and dropped.
    pub fn apply(&mut self, loaded: LoadedImage) -> bool {
        if loaded.slot != self.id {
            log::warn!(
                "Image for slot {} delivered to slot {}",
                loaded.slot,
                self.id
            );
            return false;
        }
        match self.guard.accept(&loaded.ticket, loaded.result) {
            Some(Ok(bytes)) => {
                self.content = SlotContent::Ready(bytes);
                true
            }
            Some(Err(kind)) => {
                self.content = SlotContent::Failed(kind);
                true
            }
            None => false,
        }
    }
}

/// Starts image loads for slots and collects their results
pub struct ImageLoader<S> {
    source: Arc<S>,
    cache: Arc<ImageCache>,
    runtime: Handle,
    /// Channel sender for background image loading
    image_sender: UnboundedSender<LoadedImage>,
    /// Channel receiver for background image loading
    image_receiver: UnboundedReceiver<LoadedImage>,
    /// Limits concurrent network downloads
    request_semaphore: Arc<Semaphore>,
    pending: usize,
}

impl<S: PhotoSource + 'static> ImageLoader<S> {
    pub fn new(
        source: Arc<S>,
        cache: Arc<ImageCache>,
        runtime: Handle,
        max_concurrent_downloads: usize,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            source,
            cache,
            runtime,
            image_sender: tx,
            image_receiver: rx,
            request_semaphore: Arc::new(Semaphore::new(max_concurrent_downloads.max(1))),
            pending: 0,
        }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// Loads spawned but not yet collected by `poll`
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Show the image at `url` in `slot`.
    ///
    /// A completed cache entry is applied immediately. Otherwise the slot
    /// switches to `Loading` and a background load is spawned.
    pub fn request(&mut self, slot: &mut ImageSlot, url: &str) {
        let ticket = slot.guard.assign(url);

        if let Some(bytes) = self.cache.get(url) {
            log::debug!("Image cache HIT for {} in slot {}", url, slot.id);
            slot.content = SlotContent::Ready(bytes);
            return;
        }

        log::debug!("Image cache MISS for {} in slot {}, spawning task", url, slot.id);
        slot.content = SlotContent::Loading;
        self.pending += 1;

        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let semaphore = Arc::clone(&self.request_semaphore);
        let report = LoadReport {
            slot: slot.id,
            ticket,
            sender: self.image_sender.clone(),
            sent: false,
        };

        self.runtime.spawn(async move {
            let result = cache
                .get_or_fetch(report.ticket.key(), |url| async move {
                    let _permit = semaphore.acquire().await.map_err(|_| ErrorKind::Network)?;
                    source.fetch_bytes(&url).await
                })
                .await;
            report.send(result);
        });
    }

    /// Collect finished loads without blocking
    pub fn poll(&mut self) -> Vec<LoadedImage> {
        let mut loaded = Vec::new();
        while let Ok(image) = self.image_receiver.try_recv() {
            loaded.push(image);
        }
        self.pending = self.pending.saturating_sub(loaded.len());
        loaded
    }

    /// Wait for the next finished load. `None` when nothing is pending.
    pub async fn next_loaded(&mut self) -> Option<LoadedImage> {
        if self.pending == 0 {
            return None;
        }
        let image = self.image_receiver.recv().await?;
        self.pending -= 1;
        Some(image)
    }
}

#[cfg(test)]
#[path = "image_loader_tests.rs"]
mod tests;
