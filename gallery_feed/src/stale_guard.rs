//! Stale-response suppression for display surfaces
//!
//! A surface remembers which key it currently shows. A fetch started for
//! one key and completed after the surface moved on is discarded.

/// Issued when a fetch starts; compared against the guard on completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: String,
}

impl FetchTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Tracks the key a display surface is currently assigned to
#[derive(Debug, Default, Clone)]
pub struct StaleGuard {
    current: Option<String>,
}

impl StaleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as current and return the ticket for its fetch
    pub fn assign(&mut self, key: impl Into<String>) -> FetchTicket {
        let key = key.into();
        self.current = Some(key.clone());
        FetchTicket { key }
    }

    /// Forget the current key (the surface was recycled)
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// True if the ticket still matches what the surface shows
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.current.as_deref() == Some(ticket.key.as_str())
    }

    /// Pass `result` through only if the ticket is still current
    pub fn accept<T>(&self, ticket: &FetchTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            log::debug!(
                "Dropping stale result for {} (now showing {:?})",
                ticket.key,
                self.current
            );
            None
        }
    }
}
