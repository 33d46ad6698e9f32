use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Header};

use crate::errors::{ApiError, AuthError};
use crate::services::TokenService;

#[derive(Clone)]
pub struct TokenState {
    pub token_service: Arc<TokenService>,
}

/// Rejects requests without a valid access token.
pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(req.headers())
        .map_err(|_| AuthError::InvalidToken)?
        .ok_or(AuthError::MissingToken)?;

    let claims = state.token_service.retrieve_access_claims(&token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Lets anonymous requests through, but a request that presents a bearer
/// token must present a valid one.
pub async fn optional_auth(
    State(state): State<TokenState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(req.headers()).map_err(|_| AuthError::InvalidToken)?;

    if let Some(token) = token {
        let claims = state.token_service.retrieve_access_claims(&token)?;
        req.extensions_mut().insert(claims);
    }

    Ok(next.run(req).await)
}

pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let mut values = headers.get_all(header::AUTHORIZATION).iter().peekable();

    if values.peek().is_none() {
        return Ok(None);
    }

    let header: Authorization<Bearer> =
        Authorization::decode(&mut values).map_err(|_| AuthError::InvalidToken)?;

    Ok(Some(header.token().to_string()))
}
