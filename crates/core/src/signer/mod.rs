//! Request signing.
//!
//! Bodies are signed with HMAC-SHA256 over `"<timestamp>:<canonical body>"`
//! using a secret shared with the job service.

mod canonical;
mod hmac_signer;

pub use canonical::canonical_body;
pub use hmac_signer::{current_unix_seconds, Signer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}
