use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token validation failures, kept as four distinct kinds because callers
/// branch on them (re-login prompt vs outright rejection).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token string is not structurally a token.
    #[error("malformed token, please log in again")]
    Malformed,

    /// The signature checked out but the token is past its expiry.
    #[error("token expired, please log in again")]
    Expired,

    /// The token carries a not-before bound that has not been reached yet.
    #[error("token not yet valid, please log in again")]
    NotYetValid,

    /// Signature mismatch or any other validation failure.
    #[error("invalid token, please log in again")]
    Invalid,
}

/// The claims embedded in a signed bearer token.
///
/// Immutable once issued; lives only inside the token string and is never
/// persisted server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The subject user ID.
    pub user_id: i64,
    /// The role IDs granted to the user at issue time.
    pub role_ids: Vec<i64>,
    /// The issuer.
    pub iss: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expires-at, seconds since the Unix epoch.
    pub exp: i64,
    /// Optional not-before bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation
}

/// Issues a signed HS256 bearer token for the given user.
///
/// `ttl_hours` may be zero or negative; the resulting token is simply already
/// expired, which `verify` reports as [`TokenError::Expired`].
pub fn issue(
    secret: &str,
    issuer: &str,
    ttl_hours: i64,
    user_id: i64,
    role_ids: Vec<i64>,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        role_ids,
        iss: issuer.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
        nbf: None,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)
}

/// Verifies a bearer token and returns its claims.
///
/// The library-specific error flags are folded into the four-way
/// [`TokenError`] taxonomy: anything structurally unparseable is `Malformed`,
/// never `Invalid`.
pub fn verify(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Malformed,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Invalid,
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const ISSUER: &str = "scribe";

    #[test]
    fn round_trip_preserves_identity() {
        let token = issue(SECRET, ISSUER, 10, 1, vec![1, 2]).unwrap();
        assert!(!token.is_empty());

        let claims = verify(SECRET, &token).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.role_ids, vec![1, 2]);
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn negative_ttl_is_expired() {
        let token = issue(SECRET, ISSUER, -1, 7, vec![]).unwrap();
        assert_eq!(verify(SECRET, &token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed_not_invalid() {
        assert_eq!(verify(SECRET, "not-a-token"), Err(TokenError::Malformed));
        assert_eq!(verify(SECRET, ""), Err(TokenError::Malformed));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue(SECRET, ISSUER, 10, 1, vec![1]).unwrap();
        assert_eq!(verify("other-secret", &token), Err(TokenError::Invalid));
    }

    #[test]
    fn future_not_before_is_not_yet_valid() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: 1,
            role_ids: vec![],
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + 3600,
            nbf: Some(now + 1800),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(SECRET, &token), Err(TokenError::NotYetValid));
    }
}
