//! Paginated photo feed
//!
//! Forward-only pagination with at most one page request in flight. The
//! controller lives on the owner thread; the fetch runs on the tokio
//! runtime and its outcome is applied when the owner calls
//! [`FeedController::poll`] or [`FeedController::settle`].

use gallery_common::{ErrorKind, Photo, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::scroll::ScrollPosition;
use crate::unsplash::PhotoSource;

/// Signals for the view layer, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// First page of an empty feed started loading (full-screen spinner)
    LoadingStarted,
    /// New items were appended
    Updated,
    /// The last request failed; items are unchanged
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone)]
pub struct FeedState {
    pub items: Vec<Photo>,
    /// Next page to request, starting at 1
    pub page_cursor: u32,
    pub is_loading: bool,
    pub last_error: Option<ErrorKind>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page_cursor: 1,
            is_loading: false,
            last_error: None,
        }
    }
}

/// Message sent from the background page fetch
struct PageOutcome {
    page: u32,
    result: Result<Vec<Photo>>,
}

/// Reports the outcome of one page fetch. If the task ends without
/// reporting (the source panicked or the runtime shut down), dropping it
/// reports a network failure so the controller leaves the loading state.
struct PageReport {
    page: u32,
    sender: UnboundedSender<PageOutcome>,
    sent: bool,
}

impl PageReport {
    fn send(mut self, result: Result<Vec<Photo>>) {
        self.sent = true;
        // Receiver gone means the controller was dropped
        let _ = self.sender.send(PageOutcome {
            page: self.page,
            result,
        });
    }
}

impl Drop for PageReport {
    fn drop(&mut self) {
        if !self.sent {
            log::warn!("Fetch task for page {} ended without a result", self.page);
            let _ = self.sender.send(PageOutcome {
                page: self.page,
                result: Err(ErrorKind::Network),
            });
        }
    }
}

pub struct FeedController<S> {
    source: Arc<S>,
    runtime: Handle,
    state: FeedState,
    events: VecDeque<FeedEvent>,
    page_sender: UnboundedSender<PageOutcome>,
    page_receiver: UnboundedReceiver<PageOutcome>,
}

impl<S: PhotoSource + 'static> FeedController<S> {
    pub fn new(source: Arc<S>, runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            source,
            runtime,
            state: FeedState::default(),
            events: VecDeque::new(),
            page_sender: tx,
            page_receiver: rx,
        }
    }

    /// Request the page at the cursor. No-op while a request is in flight.
    ///
    /// Returns true if a request was started.
    pub fn load_next_page(&mut self) -> bool {
        if self.state.is_loading {
            log::debug!("Page {} already loading, ignoring", self.state.page_cursor);
            return false;
        }
        self.state.is_loading = true;
        if self.state.items.is_empty() {
            self.events.push_back(FeedEvent::LoadingStarted);
        }

        let page = self.state.page_cursor;
        let source = Arc::clone(&self.source);
        let report = PageReport {
            page,
            sender: self.page_sender.clone(),
            sent: false,
        };

        log::info!("Loading page {}", page);
        self.runtime.spawn(async move {
            let result = source.fetch_page(page).await;
            report.send(result);
        });
        true
    }

    /// Drop all items and load page 1. No-op while loading.
    pub fn refresh(&mut self) -> bool {
        if self.state.is_loading {
            log::debug!("Refresh ignored, a page is loading");
            return false;
        }
        log::info!("Refreshing feed ({} items dropped)", self.state.items.len());
        self.state.page_cursor = 1;
        self.state.items.clear();
        self.load_next_page()
    }

    /// Load the next page if the list is scrolled close to its end
    pub fn on_scroll(&mut self, position: ScrollPosition) -> bool {
        position.near_end() && self.load_next_page()
    }

    /// Apply a finished fetch, if any, and drain pending events. Never blocks.
    pub fn poll(&mut self) -> Vec<FeedEvent> {
        while let Ok(outcome) = self.page_receiver.try_recv() {
            self.apply(outcome);
        }
        self.events.drain(..).collect()
    }

    /// Wait for the in-flight fetch (if any), apply it and drain events
    pub async fn settle(&mut self) -> Vec<FeedEvent> {
        if self.state.is_loading {
            if let Some(outcome) = self.page_receiver.recv().await {
                self.apply(outcome);
            }
        }
        self.poll()
    }

    fn apply(&mut self, outcome: PageOutcome) {
        if !self.state.is_loading || outcome.page != self.state.page_cursor {
            log::warn!(
                "Ignoring unexpected result for page {} (cursor {})",
                outcome.page,
                self.state.page_cursor
            );
            return;
        }
        self.state.is_loading = false;

        match outcome.result {
            Ok(photos) => {
                log::debug!("Page {} appended {} items", outcome.page, photos.len());
                self.state.items.extend(photos);
                self.state.page_cursor += 1;
                self.state.last_error = None;
                self.events.push_back(FeedEvent::Updated);
            }
            Err(kind) => {
                log::warn!("Page {} failed: {}", outcome.page, kind);
                self.state.last_error = Some(kind);
                self.events.push_back(FeedEvent::Failed {
                    kind,
                    message: kind.user_message().to_string(),
                });
            }
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn items(&self) -> &[Photo] {
        &self.state.items
    }

    pub fn len(&self) -> usize {
        self.state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    /// Item at a 0-based position
    pub fn item_at(&self, index: usize) -> Option<&Photo> {
        self.state.items.get(index)
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn page_cursor(&self) -> u32 {
        self.state.page_cursor
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.state.last_error
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
