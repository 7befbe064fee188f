//! Disclosure Bridge Library
//!
//! Exchanges an IRMA attribute disclosure for a Jitsi access token.
//!
//! A client first asks for a disclosure session for a room (`GET /session`).
//! The bridge starts the session at the IRMA server with the room's policy
//! and hands back the session pointer plus signed "trusted facts" naming the
//! session and room. After the user disclosed, the client presents the
//! trusted facts (`POST /disclose`), the bridge reads the session result and
//! returns a Jitsi token with the disclosed values as display name.
//!
//! The library is exposed for the binary and for integration tests.

pub mod cli;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
pub mod tokens;
