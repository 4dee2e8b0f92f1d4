//! Roster API Library
//!
//! A CRUD HTTP service for roles, the users holding them and the tasks
//! assigned to them, over an in-memory or `SQLite` store.
//!
//! - [`domain`]: records, update shapes, field validation and integrity rules
//! - [`infrastructure`]: repository traits, storage backends and configuration
//! - [`api`]: axum handlers, DTOs, error mapping and routing

pub mod api;
pub mod domain;
pub mod infrastructure;
