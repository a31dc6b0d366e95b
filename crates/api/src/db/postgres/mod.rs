//! `PostgreSQL` store implementations.
//!
//! One repository per entity, each owning a clone of the connection pool.
//! Queries are runtime-checked (`query_as`/`query`) so the workspace builds
//! without a live database; row structs convert into domain types, surfacing
//! [`RepositoryError::DataCorruption`](super::RepositoryError::DataCorruption)
//! when stored text fails to parse back into an enum or identifier.

mod customers;
mod measurements;
mod notifications;
mod orders;
mod tenants;

pub use customers::PgCustomerStore;
pub use measurements::PgMeasurementStore;
pub use notifications::PgNotificationStore;
pub use orders::PgOrderStore;
pub use tenants::PgTenantStore;
