//! Passport registry: lifecycle CRUD over battery passport documents with
//! post-commit event emission to the platform event bus.

pub mod config;
pub mod events;
pub mod models;
pub mod routes;
pub mod store;
