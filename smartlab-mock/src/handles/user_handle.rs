use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use smartlab_api::models::*;
use smartlab_api::routes;

use crate::errors::{ApiError, AuthError};
use crate::middlewares::{TokenState, auth};
use crate::services::{LabService, TokenClaims};

#[derive(Clone)]
pub struct UserState {
    pub lab: Arc<LabService>,
}

pub fn user_router(user_state: UserState, token_state: TokenState) -> Router {
    Router::new()
        .route(routes::USERS, get(get_users))
        .route(
            routes::USER_ROLE,
            get(get_user_role).route_layer(middleware::from_fn_with_state(token_state, auth)),
        )
        .with_state(user_state)
}

pub async fn get_users(State(state): State<UserState>) -> Json<Vec<UserSummary>> {
    Json(state.lab.users().await)
}

pub async fn get_user_role(
    Extension(claims): Extension<TokenClaims>,
    State(state): State<UserState>,
) -> Result<Json<RoleResponse>, ApiError> {
    let user = state
        .lab
        .find_user(&claims.sub)
        .await
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(RoleResponse {
        role: user.role.to_string(),
    }))
}
