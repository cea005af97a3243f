//! Common library for the Gatekeeper RBAC platform
//!
//! This crate provides the infrastructure shared by the Gatekeeper services:
//! PostgreSQL connection pooling, Redis cache access, and the error types
//! used by both.

pub mod cache;
pub mod database;
pub mod error;
