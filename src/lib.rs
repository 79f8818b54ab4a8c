//! ansd - an in-process advanced notification service
//!
//! This library provides a single-owner store of published notifications, a
//! subscription registry with asynchronous callback delivery, and the
//! removal and cancellation paths that feed `on_cancel`. Callers reach the
//! service through a [`client::NotificationClient`] bound to their bundle.
pub mod app;
pub mod bundles;
pub mod cli;
pub mod client;
pub mod config;
pub mod control;
pub mod core;
pub mod dnd;
pub mod error;
pub mod metrics;
pub mod notification;
pub mod service;
pub mod slots;
pub mod store;
pub mod task_manager;

// Re-export core types for convenience
pub use crate::core::*;
pub use crate::error::{result_code, NotificationError};
