//! Deterministic in-memory store.
//!
//! Implements every store trait over a single `RwLock`-guarded map set.
//! Used by the test suites and for local development without a database;
//! semantics (tenant scoping, conflict detection, list ordering) mirror the
//! `PostgreSQL` repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use stitchdesk_core::{
    BlobRef, CustomerId, MeasurementId, NotificationId, OrderId, OrderStatus, Phone, TenantId,
};

use crate::db::{
    CustomerStore, MeasurementStore, NotificationStore, OrderStore, RepositoryError, TenantStore,
};
use crate::models::{
    Customer, CustomerUpdate, Measurement, MeasurementUpdate, NewCustomer, NewMeasurement,
    NewNotification, NewOrder, NewTenant, Notification, Order, OrderUpdate, PaymentRecord,
    PendingPayment, SubscriptionState, Tenant,
};

#[derive(Default)]
struct Inner {
    tenants: HashMap<TenantId, Tenant>,
    customers: HashMap<CustomerId, Customer>,
    measurements: HashMap<MeasurementId, Measurement>,
    orders: HashMap<OrderId, Order>,
    notifications: HashMap<NotificationId, Notification>,
}

/// In-memory implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn create(&self, new: NewTenant) -> Result<Tenant, RepositoryError> {
        let mut inner = self.inner.write().await;

        if inner.tenants.values().any(|t| t.phone == new.phone) {
            return Err(RepositoryError::Conflict(
                "phone already registered".to_owned(),
            ));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: TenantId::generate(),
            phone: new.phone,
            password_hash: new.password_hash,
            business_name: new.business_name,
            is_admin: new.is_admin,
            subscription: new.subscription,
            pending_payment: None,
            payment_history: Vec::new(),
            push_enabled: false,
            push_token: None,
            profile_image: None,
            created_at: now,
            updated_at: now,
        };

        inner.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.inner.read().await.tenants.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &Phone) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .tenants
            .values()
            .find(|t| &t.phone == phone)
            .cloned())
    }

    async fn list_non_admin(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut tenants: Vec<Tenant> = inner
            .tenants
            .values()
            .filter(|t| !t.is_admin)
            .cloned()
            .collect();
        tenants.sort_by_key(|t| (t.created_at, t.id.as_uuid()));
        Ok(tenants)
    }

    async fn update_subscription(
        &self,
        id: TenantId,
        state: &SubscriptionState,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let tenant = inner.tenants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        tenant.subscription = state.clone();
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn set_pending_payment(
        &self,
        id: TenantId,
        pending: Option<&PendingPayment>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let tenant = inner.tenants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        tenant.pending_payment = pending.cloned();
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn record_payment(
        &self,
        id: TenantId,
        record: &PaymentRecord,
        state: &SubscriptionState,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let tenant = inner.tenants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        tenant.payment_history.push(record.clone());
        tenant.subscription = state.clone();
        tenant.pending_payment = None;
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn update_business_name(
        &self,
        id: TenantId,
        business_name: &str,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let tenant = inner.tenants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        tenant.business_name = business_name.to_owned();
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn set_profile_image(
        &self,
        id: TenantId,
        image: Option<&BlobRef>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let tenant = inner.tenants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        tenant.profile_image = image.cloned();
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn set_push_registration(
        &self,
        id: TenantId,
        enabled: bool,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let tenant = inner.tenants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        tenant.push_enabled = enabled;
        tenant.push_token = token.map(ToOwned::to_owned);
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: TenantId) -> Result<bool, RepositoryError> {
        Ok(self.inner.write().await.tenants.remove(&id).is_some())
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn create(
        &self,
        tenant_id: TenantId,
        new: NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let now = Utc::now();
        let customer = Customer {
            id: CustomerId::generate(),
            tenant_id,
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            notes: new.notes,
            photo: None,
            created_at: now,
            updated_at: now,
        };

        self.inner
            .write()
            .await
            .customers
            .insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .customers
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Customer>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut customers: Vec<Customer> = inner
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(customer) = inner
            .customers
            .get_mut(&id)
            .filter(|c| c.tenant_id == tenant_id)
        else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            customer.name = name;
        }
        if let Some(phone) = update.phone {
            customer.phone = Some(phone);
        }
        if let Some(email) = update.email {
            customer.email = Some(email);
        }
        if let Some(address) = update.address {
            customer.address = Some(address);
        }
        if let Some(notes) = update.notes {
            customer.notes = Some(notes);
        }
        customer.updated_at = Utc::now();

        Ok(Some(customer.clone()))
    }

    async fn set_photo(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        photo: Option<&BlobRef>,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(customer) = inner
            .customers
            .get_mut(&id)
            .filter(|c| c.tenant_id == tenant_id)
        else {
            return Ok(false);
        };

        customer.photo = photo.cloned();
        customer.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner
            .customers
            .get(&id)
            .is_some_and(|c| c.tenant_id == tenant_id)
        {
            return Ok(inner.customers.remove(&id));
        }
        Ok(None)
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.customers.len();
        inner.customers.retain(|_, c| c.tenant_id != tenant_id);
        Ok((before - inner.customers.len()) as u64)
    }
}

#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn create(
        &self,
        tenant_id: TenantId,
        new: NewMeasurement,
    ) -> Result<Measurement, RepositoryError> {
        let now = Utc::now();
        let measurement = Measurement {
            id: MeasurementId::generate(),
            tenant_id,
            customer_id: new.customer_id,
            label: new.label,
            values: new.values,
            unit: new.unit,
            photo: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        self.inner
            .write()
            .await
            .measurements
            .insert(measurement.id, measurement.clone());
        Ok(measurement)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
    ) -> Result<Option<Measurement>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .measurements
            .get(&id)
            .filter(|m| m.tenant_id == tenant_id)
            .cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Measurement>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut measurements: Vec<Measurement> = inner
            .measurements
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect();
        measurements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(measurements)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
        update: MeasurementUpdate,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(measurement) = inner
            .measurements
            .get_mut(&id)
            .filter(|m| m.tenant_id == tenant_id)
        else {
            return Ok(None);
        };

        if let Some(label) = update.label {
            measurement.label = label;
        }
        if let Some(values) = update.values {
            measurement.values = values;
        }
        if let Some(unit) = update.unit {
            measurement.unit = unit;
        }
        if let Some(notes) = update.notes {
            measurement.notes = Some(notes);
        }
        measurement.updated_at = Utc::now();

        Ok(Some(measurement.clone()))
    }

    async fn set_photo(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
        photo: Option<&BlobRef>,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(measurement) = inner
            .measurements
            .get_mut(&id)
            .filter(|m| m.tenant_id == tenant_id)
        else {
            return Ok(false);
        };

        measurement.photo = photo.cloned();
        measurement.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner
            .measurements
            .get(&id)
            .is_some_and(|m| m.tenant_id == tenant_id)
        {
            return Ok(inner.measurements.remove(&id));
        }
        Ok(None)
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.measurements.len();
        inner.measurements.retain(|_, m| m.tenant_id != tenant_id);
        Ok((before - inner.measurements.len()) as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, tenant_id: TenantId, new: NewOrder) -> Result<Order, RepositoryError> {
        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            tenant_id,
            customer_id: new.customer_id,
            title: new.title,
            description: new.description,
            status: OrderStatus::Pending,
            due_date: new.due_date,
            charge: new.charge,
            style_pictures: Vec::new(),
            sketches: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.inner
            .write()
            .await
            .orders
            .insert(order.id, order.clone());
        Ok(order)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner
            .orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
        else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            order.title = title;
        }
        if let Some(description) = update.description {
            order.description = Some(description);
        }
        if let Some(status) = update.status {
            order.status = status;
        }
        if let Some(due_date) = update.due_date {
            order.due_date = Some(due_date);
        }
        if let Some(charge) = update.charge {
            order.charge = Some(charge);
        }
        order.updated_at = Utc::now();

        Ok(Some(order.clone()))
    }

    async fn add_style_picture(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        picture: &BlobRef,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner
            .orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
        else {
            return Ok(false);
        };

        order.style_pictures.push(picture.clone());
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn add_sketch(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        sketch: &BlobRef,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner
            .orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
        else {
            return Ok(false);
        };

        order.sketches.push(sketch.clone());
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner
            .orders
            .get(&id)
            .is_some_and(|o| o.tenant_id == tenant_id)
        {
            return Ok(inner.orders.remove(&id));
        }
        Ok(None)
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.orders.len();
        inner.orders.retain(|_, o| o.tenant_id != tenant_id);
        Ok((before - inner.orders.len()) as u64)
    }

    async fn promote_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut promoted = Vec::new();

        for order in inner.orders.values_mut() {
            if order.status == OrderStatus::Pending && order.created_at < older_than {
                order.status = OrderStatus::InProgress;
                order.updated_at = now;
                promoted.push(order.clone());
            }
        }

        promoted.sort_by_key(|o| (o.created_at, o.id.as_uuid()));
        Ok(promoted)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, RepositoryError> {
        let notification = Notification {
            id: NotificationId::generate(),
            tenant_id: new.tenant_id,
            title: new.title,
            body: new.body,
            kind: new.kind,
            read: false,
            created_at: Utc::now(),
        };

        self.inner
            .write()
            .await
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn create_many(&self, batch: &[NewNotification]) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        for new in batch {
            let notification = Notification {
                id: NotificationId::generate(),
                tenant_id: new.tenant_id,
                title: new.title.clone(),
                body: new.body.clone(),
                kind: new.kind,
                read: false,
                created_at: now,
            };
            inner.notifications.insert(notification.id, notification);
        }

        Ok(batch.len() as u64)
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Notification>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut notifications: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.tenant_id == tenant_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        tenant_id: TenantId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(notification) = inner
            .notifications
            .get_mut(&id)
            .filter(|n| n.tenant_id == tenant_id)
        else {
            return Ok(false);
        };

        notification.read = true;
        Ok(true)
    }

    async fn mark_all_read(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let mut count = 0;

        for notification in inner.notifications.values_mut() {
            if notification.tenant_id == tenant_id && !notification.read {
                notification.read = true;
                count += 1;
            }
        }

        Ok(count)
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.notifications.len();
        inner
            .notifications
            .retain(|_, n| n.tenant_id != tenant_id);
        Ok((before - inner.notifications.len()) as u64)
    }
}
