use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::JwtConfig,
    users::ports::{TokenIssuer, TokenSubject},
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token is not authorized")]
    NotAuthorized,

    #[error("invalid user_id in token")]
    BadSubject,

    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// `None` when the configured lifetime does not fit a timestamp.
    ttl: Option<TimeDuration>,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: cfg
                .ttl_hours
                .checked_mul(60 * 60)
                .and_then(|secs| i64::try_from(secs).ok())
                .map(TimeDuration::seconds),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;
        validation
    }
}

impl TokenIssuer for JwtKeys {
    fn issue(&self, user_id: Uuid, role: &str) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = self
            .ttl
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            authorized: true,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    fn validate(&self, token: &str) -> Result<TokenSubject, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Self::validation())
            .map_err(TokenError::Invalid)?;
        let claims = data.claims;
        if !claims.authorized {
            return Err(TokenError::NotAuthorized);
        }
        let user_id = Uuid::parse_str(&claims.user_id).map_err(|_| TokenError::BadSubject)?;
        debug!(user_id = %user_id, "jwt verified");
        Ok(TokenSubject {
            user_id,
            role: claims.role,
        })
    }
}
