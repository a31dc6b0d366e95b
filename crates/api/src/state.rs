//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Store;
use crate::services::{
    AccountDeletion, AuthService, BlobStore, Broadcaster, OrderSweep, PaymentGateway, PushSender,
    SubscriptionService,
};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; carries the store and the external-service
/// collaborators as explicitly constructed dependencies.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Store,
    blobs: Arc<dyn BlobStore>,
    payments: Arc<dyn PaymentGateway>,
    push: Arc<dyn PushSender>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Store,
        blobs: Arc<dyn BlobStore>,
        payments: Arc<dyn PaymentGateway>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                blobs,
                payments,
                push,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get the blob store collaborator.
    #[must_use]
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.inner.blobs
    }

    /// Get the payment gateway collaborator.
    #[must_use]
    pub fn payments(&self) -> &Arc<dyn PaymentGateway> {
        &self.inner.payments
    }

    /// The authentication service.
    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.inner.store.tenants.clone())
    }

    /// The subscription lifecycle engine.
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionService {
        SubscriptionService::new(self.inner.store.tenants.clone())
    }

    /// The account deletion orchestrator.
    #[must_use]
    pub fn deletion(&self) -> AccountDeletion {
        AccountDeletion::new(self.inner.store.clone(), self.inner.blobs.clone())
    }

    /// The notification broadcaster.
    #[must_use]
    pub fn broadcaster(&self) -> Broadcaster {
        Broadcaster::new(
            self.inner.store.tenants.clone(),
            self.inner.store.notifications.clone(),
            self.inner.push.clone(),
        )
    }

    /// The periodic order sweep.
    #[must_use]
    pub fn sweep(&self) -> OrderSweep {
        OrderSweep::new(
            self.inner.store.orders.clone(),
            self.inner.store.notifications.clone(),
        )
    }
}
