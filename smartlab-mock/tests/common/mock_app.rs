use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use smartlab_api::models::TokenPair;
use smartlab_mock::app::create_router;
use smartlab_mock::services::{AuthService, LabService, TokenService};
use smartlab_mock::settings::Settings;
use tower::ServiceExt;

pub struct MockApp {
    pub router: Router,
    pub lab: Arc<LabService>,
    pub token_service: Arc<TokenService>,
    /// Token pair of `teacher1`
    pub tokens: TokenPair,
}

impl MockApp {
    pub fn new() -> Self {
        let settings = Settings::new().unwrap();

        let auth_service = Arc::new(AuthService::new());
        let token_service = Arc::new(TokenService::new(settings.auth.clone()));
        let lab = Arc::new(LabService::seeded(&auth_service).unwrap());

        let router = create_router(lab.clone(), auth_service, token_service.clone(), &settings);
        let tokens = token_service.generate_pair("teacher1", "teacher").unwrap();

        Self {
            router,
            lab,
            token_service,
            tokens,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri).method(method);

        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

        (status, body)
    }
}
