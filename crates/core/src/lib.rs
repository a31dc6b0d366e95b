//! Stitchdesk Core - Shared types library.
//!
//! This crate provides common types used across all Stitchdesk components:
//! - `api` - Multi-tenant back-office service
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, the normalized phone
//!   identifier, subscription state, statuses, and blob references

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
