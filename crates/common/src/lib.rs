//! Common utilities shared across the disclosure bridge crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for HS256 JWT signing and verification
pub mod jwt;
