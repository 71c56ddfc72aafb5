//! Bearer credential decoding.
//!
//! The backend issues a signed JWT. This frontend never verifies the
//! signature (the backend does that on every call); it only reads the
//! payload to learn who is signed in, with which role, and until when.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::PersonId;
use super::role::Role;

/// Errors that can occur when decoding a bearer credential.
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    /// Not three dot-separated segments.
    #[error("credential is not a compact JWT")]
    NotCompact,
    /// The payload segment is not valid base64url.
    #[error("credential payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// The payload is not the expected JSON object.
    #[error("credential payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
    /// The credential has no expiry or it has passed.
    #[error("credential has expired")]
    Expired,
}

/// A person id claim, which some issuers encode as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdClaim {
    Number(i64),
    Text(String),
}

/// Raw claims carried in the credential payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject: the operator's email.
    #[serde(alias = "email")]
    pub sub: String,
    /// Role claim, e.g. `admin` or `konsulent`.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    id: Option<IdClaim>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Expiry, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    /// Decode the payload segment of a compact JWT without verifying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not three segments or the payload
    /// does not decode to a claims object.
    pub fn decode(token: &str) -> Result<Self, CredentialError> {
        let mut segments = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(CredentialError::NotCompact);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The person id claim, if present and numeric.
    #[must_use]
    pub fn person_id(&self) -> Option<PersonId> {
        match self.id.as_ref()? {
            IdClaim::Number(id) => Some(PersonId::new(*id)),
            IdClaim::Text(raw) => raw.parse().ok(),
        }
    }
}

/// The signed-in operator, derived from valid, unexpired claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
    pub id: Option<PersonId>,
    pub name: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Set when the role claim was not recognized and defaulted.
    pub unrecognized_role: Option<String>,
}

impl Identity {
    /// Decode a credential and check its expiry against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Expired`] when `exp` is missing or not in
    /// the future, and a decoding error when the token is malformed.
    pub fn from_token(token: &str, now: DateTime<Utc>) -> Result<Self, CredentialError> {
        let claims = Claims::decode(token)?;
        Self::from_claims(claims, now)
    }

    /// Build an identity from already-decoded claims.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Expired`] when `exp` is missing or not in
    /// the future.
    pub fn from_claims(claims: Claims, now: DateTime<Utc>) -> Result<Self, CredentialError> {
        let expires_at = claims
            .exp
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or(CredentialError::Expired)?;
        if expires_at <= now {
            return Err(CredentialError::Expired);
        }

        let id = claims.person_id();
        let (role, unrecognized_role) = match Role::from_claim(&claims.role) {
            Some(role) => (role, None),
            None => (Role::Consultant, Some(claims.role.clone())),
        };

        Ok(Self {
            email: claims.sub,
            role,
            id,
            name: claims.name,
            expires_at,
            unrecognized_role,
        })
    }

    /// Whether the credential has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Name to greet the operator with: the name claim, else the email's
    /// local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or(&self.email))
    }
}
