//! Bearer token inspection.
//!
//! Tokens are decoded locally; the signature is not checked.

use chrono::{DateTime, Utc};

use tmc_core::{Claims, CredentialError, Identity};

/// Decode `token` and log its identity and expiry.
///
/// An expired token, or one without an expiry, is still described with a
/// warning.
///
/// # Errors
///
/// Returns an error if the token does not decode.
pub fn inspect(token: &str) -> Result<(), CredentialError> {
    let claims = Claims::decode(token)?;
    let now = Utc::now();

    match Identity::from_claims(claims.clone(), now) {
        Ok(identity) => {
            describe(&identity);
            tracing::info!(
                expires_at = %identity.expires_at,
                remaining_minutes = (identity.expires_at - now).num_minutes(),
                "Token is valid"
            );
        }
        Err(CredentialError::Expired) => {
            let expired_at = claims
                .exp
                .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));
            tracing::warn!(
                email = %claims.sub,
                role = %claims.role,
                expired_at = ?expired_at,
                "Token has expired"
            );
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Log the fields of a decoded identity.
pub fn describe(identity: &Identity) {
    tracing::info!(
        email = %identity.email,
        role = %identity.role,
        person_id = ?identity.id,
        name = %identity.display_name(),
        "Identity"
    );
    if let Some(raw) = &identity.unrecognized_role {
        tracing::warn!(role = %raw, "Unrecognized role claim, treated as consultant");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_rejects_malformed_token() {
        assert!(matches!(inspect("not-a-token"), Err(CredentialError::NotCompact)));
    }
}
