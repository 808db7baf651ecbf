// Infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain
pub mod store;
pub mod template;

// Application layer
pub mod api;
pub mod server;
