//! Service layer for the disclosure bridge.
//!
//! - [`room_policy`]: which attributes a room requires
//! - [`irma_client`]: HTTP client for the IRMA requestor API

pub mod irma_client;
pub mod room_policy;

pub use irma_client::{IrmaClient, RetryPolicy};
pub use room_policy::RoomPolicies;
