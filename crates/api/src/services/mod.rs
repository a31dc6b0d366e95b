//! Domain services and external-service clients.

pub mod auth;
pub mod blobs;
pub mod broadcast;
pub mod deletion;
pub mod payments;
pub mod push;
pub mod subscription;
pub mod sweep;

pub use auth::{AuthError, AuthService};
pub use blobs::{BlobError, BlobStore, MediaClient};
pub use broadcast::{BroadcastOutcome, Broadcaster};
pub use deletion::{AccountDeletion, DeletionError};
pub use payments::{
    ChargeRequest, FlutterwaveClient, InitializedCharge, PaymentError, PaymentGateway,
    VerifiedTransaction,
};
pub use push::{FcmClient, PushError, PushReceipt, PushSender};
pub use subscription::{SubscriptionError, SubscriptionService, TRIAL_PERIOD_DAYS};
pub use sweep::OrderSweep;
