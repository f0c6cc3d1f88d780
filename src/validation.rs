//! Input validation for construction parameters.

use crate::{LocauthError, Result};

/// Maximum identity pool id length accepted by the identity service.
const MAX_IDENTITY_POOL_ID_LENGTH: usize = 55;

/// Validates an identity pool identifier.
///
/// Identifiers are usually `<region>:<uuid>`, but any non-empty identifier
/// without whitespace or control characters is accepted so that test pools
/// and private deployments work.
///
/// # Errors
///
/// Returns [`LocauthError::InvalidIdentityPoolId`] if validation fails.
///
/// # Example
///
/// ```
/// use locauth::validation::validate_identity_pool_id;
///
/// assert!(validate_identity_pool_id("us-east-1:1b2c3d4e-0000-1111-2222-333344445555").is_ok());
/// assert!(validate_identity_pool_id("pool-1").is_ok());
///
/// assert!(validate_identity_pool_id("").is_err());
/// assert!(validate_identity_pool_id("pool 1").is_err());
/// ```
pub fn validate_identity_pool_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LocauthError::InvalidIdentityPoolId(
            "identity pool id cannot be empty".to_string(),
        ));
    }

    if id.len() > MAX_IDENTITY_POOL_ID_LENGTH {
        return Err(LocauthError::InvalidIdentityPoolId(format!(
            "identity pool id exceeds maximum length of {} characters",
            MAX_IDENTITY_POOL_ID_LENGTH
        )));
    }

    if id.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(LocauthError::InvalidIdentityPoolId(
            "identity pool id contains whitespace or control characters".to_string(),
        ));
    }

    Ok(())
}
