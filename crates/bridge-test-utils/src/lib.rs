//! # Bridge Test Utilities
//!
//! Shared test utilities for the disclosure bridge.
//!
//! This crate provides:
//! - Mock IRMA server (`MockIrmaServer`, wiremock based)
//! - Server test harness (`TestBridgeServer` for E2E tests)
//! - Fixed test configuration and token decoding helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let irma = MockIrmaServer::start().await;
//!     irma.mount_session("tok1").await;
//!
//!     let server = TestBridgeServer::spawn(&irma.uri()).await?;
//!     let response = reqwest::get(format!("{}/session?room=demo", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod irma_mock;
pub mod server_harness;

// Re-export commonly used items
pub use fixtures::*;
pub use irma_mock::*;
pub use server_harness::*;
