//! # roamly-shared
//!
//! Types shared by every Roamly client component: wire records returned by
//! the content API, local media payloads, credential claim decoding and the
//! default tuning constants.
//!
//! Nothing in this crate performs I/O.

pub mod claims;
pub mod constants;
pub mod error;
pub mod types;

pub use claims::{decode_identity, SessionClaim};
pub use error::ClaimError;
pub use types::*;
