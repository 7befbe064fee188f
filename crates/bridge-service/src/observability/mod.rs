//! Observability for the disclosure bridge.
//!
//! Provides metric definitions and the Prometheus recorder setup.

pub mod metrics;
