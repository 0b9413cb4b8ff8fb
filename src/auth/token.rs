use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the account's unique identifier.
    pub sub: Uuid,
    /// Issuance timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues and verifies signed session tokens.
///
/// The signing secret is loaded once at startup and handed to this service's
/// constructor; nothing in the auth path reads environment state. Tokens are
/// stateless: validity is determined purely by signature and expiry, with no
/// server-side revocation. An expired token requires a fresh login.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_days,
        }
    }

    /// Issues a signed token for the given account id.
    pub fn issue(&self, account_id: Uuid) -> Result<String, AppError> {
        let now = chrono::Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::days(self.expiry_days))
            .ok_or_else(|| AppError::InternalServerError("Token expiry overflow".into()))?;

        let claims = Claims {
            sub: account_id,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature and expiry, returning its claims.
    ///
    /// Malformed tokens, bad signatures, and expired tokens all come back as
    /// `AppError::Unauthorized`; callers at the request boundary present one
    /// generic message regardless of which check failed.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}
