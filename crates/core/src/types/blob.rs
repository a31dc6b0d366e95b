//! Blob references for externally stored objects.

use serde::{Deserialize, Serialize};

/// A reference to an object in the external blob store.
///
/// The canonical storage `key` is recorded alongside the public `url` at
/// upload time, so deletion never has to reconstruct a key from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    /// Canonical storage key, usable directly with the store's delete API.
    pub key: String,
    /// Public URL serving the object.
    pub url: String,
}

impl BlobRef {
    /// Create a new blob reference.
    #[must_use]
    pub const fn new(key: String, url: String) -> Self {
        Self { key, url }
    }
}
