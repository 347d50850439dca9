use crate::types::{AppError, Claims, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and validates stateless session tokens.
///
/// Tokens are HS256 JWTs whose subject is the user's email. Signature checks and
/// expiry checks are separate calls so that callers can tell a forged token from
/// a merely stale one.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    leeway_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service.
    ///
    /// # Arguments
    /// * `secret` - HMAC signing key (should be at least 32 bytes)
    /// * `ttl_secs` - Token validity in seconds
    /// * `leeway_secs` - Clock skew tolerated when checking expiry
    pub fn new(secret: &str, ttl_secs: i64, leeway_secs: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(AppError::Configuration(
                "JWT signing key is not configured".to_string(),
            ));
        }
        if ttl_secs < 0 || leeway_secs < 0 {
            return Err(AppError::Configuration(
                "Token TTL and leeway must not be negative".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            leeway_secs,
        })
    }

    /// Token validity in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issues a signed token for `subject`.
    pub fn issue(&self, subject: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and structure and returns the claims.
    ///
    /// Expiry is not checked here, see [`TokenService::is_expired`].
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(e.to_string()))
    }

    /// Returns the subject of a correctly signed token.
    pub fn extract_subject(&self, token: &str) -> Result<String> {
        let claims = self.decode_claims(token)?;
        if claims.sub.is_empty() {
            return Err(AppError::InvalidToken("empty subject".to_string()));
        }
        Ok(claims.sub)
    }

    /// Reports whether a correctly signed token has passed its expiry.
    ///
    /// An expired token is `Ok(true)`; only malformed or forged tokens are errors.
    pub fn is_expired(&self, token: &str) -> Result<bool> {
        let claims = self.decode_claims(token)?;
        Ok(Utc::now().timestamp() >= claims.exp.saturating_add(self.leeway_secs))
    }
}
