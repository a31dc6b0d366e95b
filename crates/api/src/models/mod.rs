//! Domain types.
//!
//! These types represent validated domain objects separate from database row
//! types.

pub mod customer;
pub mod measurement;
pub mod notification;
pub mod order;
pub mod session;
pub mod tenant;

pub use customer::{Customer, CustomerUpdate, NewCustomer};
pub use measurement::{Measurement, MeasurementUpdate, NewMeasurement};
pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, Order, OrderUpdate};
pub use session::CurrentTenant;
pub use tenant::{NewTenant, PaymentRecord, PendingPayment, SubscriptionState, Tenant};
