use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use smartlab_api::models::TokenPair;
use uuid::Uuid;

use crate::errors::AuthError;
use crate::settings::Auth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username
    pub sub: String,
    pub role: String,
    pub kind: TokenKind,
    /// Unique per token so that a rotation always yields new strings
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenService {
    access_expiration: u64,
    refresh_expiration: u64,
    secret: String,
}

impl TokenService {
    pub fn new(auth: Auth) -> Self {
        Self {
            access_expiration: auth.access_expiration,
            refresh_expiration: auth.refresh_expiration,
            secret: auth.secret,
        }
    }

    pub fn generate_pair(&self, username: &str, role: &str) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        let iat = now();

        let access_token = self.encode_claims(&TokenClaims {
            sub: username.to_string(),
            role: role.to_string(),
            kind: TokenKind::Access,
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat + self.access_expiration,
        })?;
        let refresh_token = self.encode_claims(&TokenClaims {
            sub: username.to_string(),
            role: role.to_string(),
            kind: TokenKind::Refresh,
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat + self.refresh_expiration,
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn encode_claims(&self, claims: &TokenClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
    }

    /// Decodes an access token. Any failure, expiry included, is `InvalidToken`.
    pub fn retrieve_access_claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.retrieve_claims(token, TokenKind::Access)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn retrieve_refresh_claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.retrieve_claims(token, TokenKind::Refresh)
            .map_err(|e| match e {
                AuthError::RefreshTokenExpired => AuthError::RefreshTokenExpired,
                _ => AuthError::InvalidRefreshToken,
            })
    }

    fn retrieve_claims(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::RefreshTokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        if data.claims.kind != kind {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
