//! Payment gateway collaborator: trait and Flutterwave client.
//!
//! The gateway initializes a hosted payment page and later verifies the
//! transaction by reference. Gateway failures are always surfaced as errors,
//! never silently treated as success; `apply_payment` runs only after a
//! verification reports `successful`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use stitchdesk_core::{PaymentStatus, Phone, SubscriptionTier};

use crate::config::PaymentConfig;

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("gateway error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a gateway response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Failed to build the client.
    #[error("client error: {0}")]
    Client(String),
}

/// A charge to initialize with the gateway.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub currency: String,
    pub phone: Phone,
    pub business_name: String,
    pub tier: SubscriptionTier,
}

/// An initialized transaction: where to send the payer, and the reference to
/// verify later.
#[derive(Debug, Clone)]
pub struct InitializedCharge {
    pub redirect_url: String,
    pub tx_ref: String,
}

/// A transaction as reported by gateway verification.
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub tx_ref: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency: String,
}

/// The payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize a hosted payment for `charge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is unreachable or rejects the request.
    async fn initialize(&self, charge: &ChargeRequest) -> Result<InitializedCharge, PaymentError>;

    /// Verify the transaction behind `tx_ref`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is unreachable or the response cannot
    /// be parsed. A reachable gateway reporting a failed transaction is NOT
    /// an error here; the status is carried in the result.
    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction, PaymentError>;
}

/// Generate a fresh transaction reference.
#[must_use]
pub fn generate_tx_ref() -> String {
    format!("stchd-{}", Uuid::new_v4())
}

/// Flutterwave API client.
#[derive(Clone)]
pub struct FlutterwaveClient {
    client: reqwest::Client,
    base_url: String,
    redirect_url: String,
}

#[derive(Deserialize)]
struct FwEnvelope<T> {
    status: String,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct FwPaymentLink {
    link: String,
}

#[derive(Deserialize)]
struct FwTransaction {
    tx_ref: String,
    status: String,
    amount: Decimal,
    currency: String,
}

impl FlutterwaveClient {
    /// Create a new Flutterwave client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Client(format!("invalid secret key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            redirect_url: config.redirect_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for FlutterwaveClient {
    async fn initialize(&self, charge: &ChargeRequest) -> Result<InitializedCharge, PaymentError> {
        let tx_ref = generate_tx_ref();
        let url = format!("{}/payments", self.base_url);

        let body = serde_json::json!({
            "tx_ref": tx_ref,
            "amount": charge.amount,
            "currency": charge.currency,
            "redirect_url": self.redirect_url,
            "customer": {
                "phonenumber": charge.phone.as_str(),
                "name": charge.business_name,
            },
            "meta": {
                "tier": charge.tier.to_string(),
            },
            "customizations": {
                "title": "Stitchdesk subscription",
            },
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: FwEnvelope<FwPaymentLink> = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        if envelope.status != "success" {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_default(),
            });
        }

        let link = envelope
            .data
            .ok_or_else(|| PaymentError::Parse("missing payment link".to_owned()))?
            .link;

        Ok(InitializedCharge {
            redirect_url: link,
            tx_ref,
        })
    }

    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction, PaymentError> {
        let url = format!(
            "{}/transactions/verify_by_reference?tx_ref={}",
            self.base_url, tx_ref
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: FwEnvelope<FwTransaction> = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        let tx = envelope
            .data
            .ok_or_else(|| PaymentError::Parse("missing transaction data".to_owned()))?;

        let tx_status: PaymentStatus = tx
            .status
            .parse()
            .map_err(|_| PaymentError::Parse(format!("unknown transaction status: {}", tx.status)))?;

        Ok(VerifiedTransaction {
            tx_ref: tx.tx_ref,
            status: tx_status,
            amount: tx.amount,
            currency: tx.currency,
        })
    }
}
