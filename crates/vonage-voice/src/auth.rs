//! Bearer token signing for Voice API requests.
//!
//! Every request carries a freshly signed RS256 JWT identifying the
//! application. Tokens are never cached: each call to [`JwtAuth::sign`]
//! stamps the current time from the configured [`Clock`] and a new `jti`.

use std::{fmt, path::Path, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lifetime of a signed token, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 900;

/// Errors that can occur while building a bearer token.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("application id must not be empty")]
    MissingApplicationId,

    /// The private key is not a PEM-encoded RSA key.
    #[error("invalid private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to read private key from {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Time source for token issuance.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Claims carried by every Voice API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub application_id: String,
    pub iat: i64,
    pub jti: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Signs application tokens with the application's private key.
#[derive(Clone)]
pub struct JwtAuth {
    application_id: String,
    key: EncodingKey,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    not_before: Option<DateTime<Utc>>,
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("application_id", &self.application_id)
            .field("clock", &self.clock)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    /// Creates an authenticator from an application id and a PEM private key.
    ///
    /// Both PKCS#1 (`BEGIN RSA PRIVATE KEY`) and PKCS#8 (`BEGIN PRIVATE KEY`)
    /// encodings are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the application id is blank or the key cannot be
    /// parsed as an RSA PEM key.
    pub fn new(
        application_id: impl Into<String>,
        private_key_pem: &[u8],
    ) -> Result<Self, AuthError> {
        let application_id = application_id.into();
        if application_id.trim().is_empty() {
            return Err(AuthError::MissingApplicationId);
        }

        let key = EncodingKey::from_rsa_pem(private_key_pem).map_err(AuthError::InvalidKey)?;

        Ok(Self {
            application_id,
            key,
            clock: Arc::new(SystemClock),
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            not_before: None,
        })
    }

    /// Creates an authenticator reading the private key from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or for any reason listed
    /// on [`JwtAuth::new`].
    pub fn from_key_file(
        application_id: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| AuthError::KeyFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(application_id, &pem)
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Adds an `nbf` claim to every token.
    #[must_use]
    pub fn with_not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Builds the claims for a new token without signing them.
    pub fn claims(&self) -> Claims {
        let issued_at = self.clock.now();
        Claims {
            application_id: self.application_id.clone(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            exp: (issued_at + self.ttl).timestamp(),
            nbf: self.not_before.map(|nbf| nbf.timestamp()),
        }
    }

    /// Signs a fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if the signature cannot be produced.
    pub fn sign(&self) -> Result<String, AuthError> {
        let header = Header::new(Algorithm::RS256);
        encode(&header, &self.claims(), &self.key).map_err(AuthError::Signing)
    }

    /// Value for the `Authorization` header.
    ///
    /// # Errors
    ///
    /// Propagates signing failures from [`JwtAuth::sign`].
    pub fn bearer(&self) -> Result<String, AuthError> {
        Ok(format!("Bearer {}", self.sign()?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeZone;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    use super::*;

    pub(crate) const APPLICATION_ID: &str = "951614e0-eec4-4087-a6b1-3f4c2f169cb0";
    pub(crate) const PRIVATE_KEY: &[u8] = include_bytes!("../testdata/application_key");
    const PUBLIC_KEY: &[u8] = include_bytes!("../testdata/application_key.pub");

    pub(crate) fn test_auth() -> JwtAuth {
        JwtAuth::new(APPLICATION_ID, PRIVATE_KEY).unwrap()
    }

    fn frozen() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap()
    }

    fn decode_claims(token: &str) -> Claims {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let key = DecodingKey::from_rsa_pem(PUBLIC_KEY).unwrap();
        decode::<Claims>(token, &key, &validation).unwrap().claims
    }

    #[test]
    fn test_sign_with_frozen_clock_sets_deterministic_times() {
        let auth = test_auth().with_clock(FixedClock(frozen()));

        let claims = decode_claims(&auth.sign().unwrap());

        assert_eq!(claims.application_id, APPLICATION_ID);
        assert_eq!(claims.iat, frozen().timestamp());
        assert_eq!(claims.exp, frozen().timestamp() + 15 * 60);
        assert!(claims.nbf.is_none());
    }

    #[test]
    fn test_sign_issues_unique_jti_per_token() {
        let auth = test_auth().with_clock(FixedClock(frozen()));

        let first = decode_claims(&auth.sign().unwrap());
        let second = decode_claims(&auth.sign().unwrap());

        assert_eq!(first.iat, second.iat);
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_custom_ttl_and_not_before_are_encoded() {
        let auth = test_auth()
            .with_clock(FixedClock(frozen()))
            .with_ttl(Duration::seconds(60))
            .with_not_before(frozen());

        let claims = decode_claims(&auth.sign().unwrap());

        assert_eq!(claims.exp - claims.iat, 60);
        assert_eq!(claims.nbf, Some(frozen().timestamp()));
    }

    #[test]
    fn test_token_header_uses_rs256() {
        let token = test_auth().sign().unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_bearer_prefixes_token() {
        let bearer = test_auth().bearer().unwrap();
        assert!(bearer.starts_with("Bearer "));
        assert_eq!(bearer.split('.').count(), 3);
    }

    #[test]
    fn test_new_rejects_blank_application_id() {
        let result = JwtAuth::new("  ", PRIVATE_KEY);
        assert!(matches!(result, Err(AuthError::MissingApplicationId)));
    }

    #[test]
    fn test_new_rejects_malformed_key() {
        let result = JwtAuth::new(APPLICATION_ID, b"not a key");
        assert!(matches!(result, Err(AuthError::InvalidKey(_))));
    }

    #[test]
    fn test_from_key_file_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("private.key");

        let error = JwtAuth::from_key_file(APPLICATION_ID, &missing).unwrap_err();

        assert!(matches!(error, AuthError::KeyFile { .. }));
        assert!(error.to_string().contains("private.key"));
    }

    #[test]
    fn test_from_key_file_reads_pem() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("private.key");
        std::fs::write(&path, PRIVATE_KEY).unwrap();

        let auth = JwtAuth::from_key_file(APPLICATION_ID, &path).unwrap();

        assert_eq!(auth.application_id(), APPLICATION_ID);
    }
}
