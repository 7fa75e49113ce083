//! Diagonal webhook receiver.
//!
//! Authenticates inbound deliveries, signs requested charges with the
//! organization key and captures them through the Diagonal API. Verification
//! and signing live in the core [`diagonal`] crate; this crate provides the
//! HTTP server, configuration and state wiring.
//!
//! # Modules
//!
//! - [`routes`]: HTTP endpoints (webhook, health, metrics)
//! - [`dispatch`]: per-event-type handling of authenticated events
//! - [`config`]: environment configuration
//! - [`bootstrap`]: builds [`AppState`](state::AppState) from a config
//! - [`metrics`]: Prometheus counters and histograms

pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod routes;
pub mod state;
