//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod render;
mod routes;

pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use render::{render_blocking, render_template, RenderRequest};
pub use routes::api_routes;
