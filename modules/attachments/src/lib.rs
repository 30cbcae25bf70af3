//! Attachments service.
//!
//! Authenticated upload, fetch, and delete of passport file attachments.
//! Every route resolves the caller through the identity service; requests
//! without a verifiable token are rejected uniformly.

pub mod config;
pub mod routes;
pub mod store;
