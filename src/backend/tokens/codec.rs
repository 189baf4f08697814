/**
 * Token Signing and Verification
 *
 * This module signs and verifies the compact HS256 tokens used for every
 * callback URL, for signed requests to the Docs engine and for the
 * engine-signed payloads that arrive on the track endpoint.
 *
 * # Claim Handling
 *
 * `sign` adds `iat` and `exp` to whatever claim set it is given. Nothing in
 * a token is trusted until `verify` has checked the signature and expiry.
 */

use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::shared::{SessionClaims, TokenAction};

/// Token failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidToken,
    #[error("token expired")]
    Expired,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token minted for '{actual}' used on '{expected}'")]
    ActionMismatch {
        expected: TokenAction,
        actual: TokenAction,
    },
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Claims plus the registered time claims added on signing
#[derive(Serialize)]
struct Stamped<'a, T> {
    #[serde(flatten)]
    claims: &'a T,
    iat: i64,
    exp: i64,
}

/// HS256 signer/verifier bound to one shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    leeway: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec whose tokens live for `leeway` unless stated otherwise
    ///
    /// Verification requires an `exp` claim and allows no clock skew.
    pub fn new(secret: &str, leeway: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            leeway,
        }
    }

    /// Accept tokens without `exp`
    ///
    /// Tokens signed by the Docs engine may omit the claim; an `exp` that is
    /// present is still enforced.
    pub fn allow_missing_exp(mut self) -> Self {
        self.validation.required_spec_claims.clear();
        self
    }

    /// Sign `claims`, expiring after the configured leeway
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        self.sign_with_ttl(claims, self.leeway)
    }

    /// Sign `claims`, expiring after `ttl`
    pub fn sign_with_ttl<T: Serialize>(&self, claims: &T, ttl: Duration) -> Result<String, TokenError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2);
        self.sign_at(claims, chrono::Utc::now().timestamp(), ttl)
    }

    pub(crate) fn sign_at<T: Serialize>(
        &self,
        claims: &T,
        issued_at: i64,
        ttl_secs: i64,
    ) -> Result<String, TokenError> {
        let stamped = Stamped {
            claims,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &stamped, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and decode its claims
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Verify a session token and check it was minted for `expected`
    pub fn verify_session(&self, token: &str, expected: TokenAction) -> Result<SessionClaims, TokenError> {
        let claims: SessionClaims = self.verify(token)?;
        let actual = claims.action();
        if actual != expected {
            return Err(TokenError::ActionMismatch { expected, actual });
        }
        Ok(claims)
    }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::ImmatureSignature | ErrorKind::InvalidAlgorithm => {
            TokenError::InvalidToken
        }
        _ => TokenError::Malformed(error.to_string()),
    }
}

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
