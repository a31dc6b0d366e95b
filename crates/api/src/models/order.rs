//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stitchdesk_core::{BlobRef, CustomerId, OrderId, OrderStatus, TenantId};

/// A tailoring order.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning tenant; set by the server, never from client input.
    pub tenant_id: TenantId,
    /// Customer the order is for, if any.
    pub customer_id: Option<CustomerId>,
    /// Short title, e.g. "Three-piece suit".
    pub title: String,
    pub description: Option<String>,
    pub status: OrderStatus,
    /// Agreed delivery date.
    pub due_date: Option<DateTime<Utc>>,
    /// Agreed charge for the work.
    pub charge: Option<Decimal>,
    /// Reference pictures of the desired style.
    pub style_pictures: Vec<BlobRef>,
    /// Design sketches.
    pub sketches: Vec<BlobRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create an order. New orders always start as `pending`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub charge: Option<Decimal>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct OrderUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<OrderStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub charge: Option<Decimal>,
}
