//! Notification service.
//!
//! Drains passport lifecycle events from the bus under a consumer group,
//! renders them into plain-text notifications, and delivers them via SMTP
//! or, when SMTP is not configured, the log.

pub mod config;
pub mod consumer;
pub mod render;
pub mod sink;
