//! workhub-notify — real-time notification delivery.
//!
//! Domain services embed [`publish::NotificationPublisher`] to fan a
//! business event out into durable per-receiver notifications; connected
//! clients get them live over the SSE surface in [`api`], with gap-free
//! backfill on reconnect. The binary in `main.rs` is a thin wrapper around
//! this crate.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod models;
pub mod publish;
pub mod store;
pub mod stream;

use store::NotificationStore;
use stream::EmitterRegistry;

/// Shared application state passed to handlers. The publish orchestrator is
/// not part of it: publishing is an internal library call made by the domain
/// services (and the `publish` CLI command), never an HTTP surface.
pub struct AppState {
    pub store: Arc<dyn NotificationStore>,
    pub registry: Arc<EmitterRegistry>,
    pub config: config::Config,
}
