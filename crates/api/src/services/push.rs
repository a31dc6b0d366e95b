//! Push dispatch collaborator: trait and FCM-style client.
//!
//! Delivery is fire-and-forget from the caller's perspective: a batched send
//! reports per-token success/failure counts and tolerates partial failure.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PushConfig;

/// Errors that can occur when dispatching push notifications.
#[derive(Debug, Error)]
pub enum PushError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dispatch service returned an error response.
    #[error("push error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client.
    #[error("client error: {0}")]
    Client(String),
}

/// Outcome of a batched push dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushReceipt {
    pub success_count: u32,
    pub failure_count: u32,
}

/// A push notification dispatcher.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send one batched notification to `tokens`.
    ///
    /// An empty token list is a no-op returning a zero receipt.
    ///
    /// # Errors
    ///
    /// Returns an error only when the whole batch fails (service unreachable
    /// or rejected); per-token failures are counted in the receipt.
    async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<PushReceipt, PushError>;
}

/// FCM legacy batch-send client.
#[derive(Clone)]
pub struct FcmClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct FcmResponse {
    success: u32,
    failure: u32,
}

impl FcmClient {
    /// Create a new FCM client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("key={}", config.server_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PushError::Client(format!("invalid server key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<PushReceipt, PushError> {
        if tokens.is_empty() {
            return Ok(PushReceipt::default());
        }

        let url = format!("{}/fcm/send", self.endpoint);
        let payload = serde_json::json!({
            "registration_ids": tokens,
            "notification": {
                "title": title,
                "body": body,
            },
            "data": data,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PushError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FcmResponse = response.json().await.map_err(PushError::Http)?;

        Ok(PushReceipt {
            success_count: parsed.success,
            failure_count: parsed.failure,
        })
    }
}
