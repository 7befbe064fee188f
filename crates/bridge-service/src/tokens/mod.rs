//! Tokens minted by the bridge.
//!
//! - [`trusted_facts`]: short-lived HS256 token binding an IRMA session to a room,
//!   signed with the backend secret and only ever verified by the bridge itself
//! - [`access_token`]: HS256 token accepted by the Jitsi deployment, signed with
//!   the Jitsi secret

pub mod access_token;
pub mod trusted_facts;

pub use access_token::AccessTokenIssuer;
pub use trusted_facts::{TrustedFacts, TrustedFactsIssuer};
