//! Blob store collaborator: trait and HTTP client.
//!
//! The store is a key-value object store: `put` uploads bytes under a
//! collision-resistant key and returns a [`BlobRef`] carrying both the
//! canonical key and the public URL; `delete` removes by stored key.
//!
//! Propagation policy lives at the call sites: upload failures are fatal and
//! surfaced, deletion failures are logged and swallowed
//! ([`delete_best_effort`]).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use uuid::Uuid;

use stitchdesk_core::BlobRef;

use crate::config::MediaConfig;

/// Errors that can occur when interacting with the blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store returned an error response.
    #[error("storage error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client.
    #[error("client error: {0}")]
    Client(String),
}

/// A key-value blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` under a fresh key beneath `logical_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails; upload failures are always
    /// surfaced to the caller.
    async fn put(
        &self,
        bytes: Vec<u8>,
        logical_path: &str,
        content_type: &str,
    ) -> Result<BlobRef, BlobError>;

    /// Delete the object behind `blob` by its stored key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the deletion. Most call sites
    /// should go through [`delete_best_effort`] instead.
    async fn delete(&self, blob: &BlobRef) -> Result<(), BlobError>;
}

/// Delete a blob, logging and swallowing any failure.
///
/// Blob deletion is best-effort everywhere: a failure must never abort the
/// surrounding workflow.
pub async fn delete_best_effort(store: &dyn BlobStore, blob: &BlobRef) {
    if let Err(e) = store.delete(blob).await {
        tracing::warn!(key = %blob.key, error = %e, "blob deletion failed, skipping");
    }
}

/// HTTP client for the media object store.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
}

impl MediaClient {
    /// Create a new media store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, BlobError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.service_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| BlobError::Client(format!("invalid service key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for MediaClient {
    async fn put(
        &self,
        bytes: Vec<u8>,
        logical_path: &str,
        content_type: &str,
    ) -> Result<BlobRef, BlobError> {
        // Collision-resistant key: one fresh uuid per upload.
        let key = format!("{}/{}", logical_path.trim_matches('/'), Uuid::new_v4());
        let url = format!("{}/object/{}/{}", self.endpoint, self.bucket, key);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BlobError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let public_url = format!("{}/object/public/{}/{}", self.endpoint, self.bucket, key);
        Ok(BlobRef::new(key, public_url))
    }

    async fn delete(&self, blob: &BlobRef) -> Result<(), BlobError> {
        let url = format!("{}/object/{}/{}", self.endpoint, self.bucket, blob.key);

        let response = self.client.delete(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BlobError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
