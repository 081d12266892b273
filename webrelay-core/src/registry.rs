//! Subscriber registry
//!
//! Sorted, de-duplicated set of callback URLs shared by every request handler.
//! Mutations take the write lock for the whole search-and-modify step; readers
//! get a copy so no lock outlives the call.

use parking_lot::RwLock;
use tracing::debug;

use crate::validation::{validate_subscriber_url, ValidationError};

/// Result of registering a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
    /// Rejected by the validator; the registry is unchanged
    Invalid(ValidationError),
}

/// Result of deregistering a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Process-wide set of subscriber URLs, kept in ascending byte order.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    urls: RwLock<Vec<String>>,
}

impl SubscriberRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `url` if it is valid and not already present.
    pub fn add(&self, url: &str) -> AddOutcome {
        if let Err(e) = validate_subscriber_url(url) {
            debug!(url = %url, reason = %e, "Rejected subscriber URL");
            return AddOutcome::Invalid(e);
        }

        let mut urls = self.urls.write();
        // `binary_search` only reports Ok on an exact match; Err is the insertion point.
        match urls.binary_search_by(|probe| probe.as_str().cmp(url)) {
            Ok(_) => AddOutcome::AlreadyPresent,
            Err(index) => {
                urls.insert(index, url.to_string());
                debug!(url = %url, subscribers = urls.len(), "Subscriber added");
                AddOutcome::Added
            }
        }
    }

    /// Deregister `url`.
    pub fn remove(&self, url: &str) -> RemoveOutcome {
        let mut urls = self.urls.write();
        match urls.binary_search_by(|probe| probe.as_str().cmp(url)) {
            Ok(index) => {
                urls.remove(index);
                debug!(url = %url, subscribers = urls.len(), "Subscriber removed");
                RemoveOutcome::Removed
            }
            Err(_) => RemoveOutcome::NotFound,
        }
    }

    /// Copy of the current membership for a single publication.
    ///
    /// The read lock is released before returning, so deliveries against the
    /// copy never block registration.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.urls.read().clone()
    }

    /// Current membership in ascending order
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.snapshot()
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls
            .read()
            .binary_search_by(|probe| probe.as_str().cmp(url))
            .is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.read().is_empty()
    }
}
