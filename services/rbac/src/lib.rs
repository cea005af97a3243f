//! RBAC service library
//!
//! Turns a generated route manifest into permission records, manages the
//! role-permission grant matrix and the field-level access overlay, and
//! exposes the admin surface over HTTP.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod inflect;
pub mod manifest;
pub mod models;
pub mod overlay;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod sync;
pub mod validation;

pub use state::AppState;
