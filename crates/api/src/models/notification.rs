//! Notification domain types.

use chrono::{DateTime, Utc};

use stitchdesk_core::{NotificationId, NotificationKind, TenantId};

/// A persisted in-app notification.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    /// Unique notification ID.
    pub id: NotificationId,
    /// Owning tenant; set by the server, never from client input.
    pub tenant_id: TenantId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    /// Whether the tenant has read the notification.
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub tenant_id: TenantId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
}
