//! Access gate: a shared code checked before any metered remote call.
//!
//! This is a plain equality check against a configured secret. There is no
//! hashing, expiry or attempt limiting; it keeps casual visitors from
//! spending API credit, nothing more.

use crate::error::EssenceError;
use tracing::{debug, warn};

/// Exact, case-sensitive comparison of `candidate` against `secret`.
///
/// An empty secret never authorises anything.
pub fn authorize(candidate: &str, secret: &str) -> bool {
    !secret.is_empty() && candidate == secret
}

/// Gate check with the outcome expressed as a `Result`.
///
/// An empty candidate reports [`EssenceError::MissingCode`] so the caller can
/// prompt for a code instead of claiming the code is wrong.
pub fn check(candidate: &str, secret: &str) -> Result<(), EssenceError> {
    if candidate.is_empty() {
        debug!("Gate: no code supplied");
        return Err(EssenceError::MissingCode);
    }
    if authorize(candidate, secret) {
        debug!("Gate: code accepted");
        Ok(())
    } else {
        warn!("Gate: code rejected");
        Err(EssenceError::Unauthorized)
    }
}
