//! HTTP request handlers for the disclosure bridge.

mod disclose;
mod health;
mod metrics;
mod session;

pub use disclose::disclose;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use session::start_session;
