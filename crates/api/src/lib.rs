//! Stitchdesk API library.
//!
//! This crate provides the back-office functionality as a library, allowing
//! it to be tested and reused. The binary in `main.rs` wires configuration,
//! the `PostgreSQL` store, and the external-service clients together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
