use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiClient, ApiError, RequestOptions};
use crate::common::UserInfo;

/// Username/password or email login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_info: UserInfo,
}

#[derive(Clone)]
pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.api.post_json("/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.api.post_json("/auth/register", request).await
    }

    /// Mails a verification code to `email`.
    pub async fn request_code(&self, email: &str) -> Result<String, ApiError> {
        self.api
            .post_json("/auth/code", &json!({ "email": email }))
            .await
    }

    pub async fn verify_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        self.api
            .post_json("/auth/verify", &json!({ "email": email, "code": code }))
            .await
    }

    pub async fn validate_token(&self, token: &str) -> Result<String, ApiError> {
        self.api
            .post_json("/auth/validate", &json!({ "token": token }))
            .await
    }

    pub async fn me(&self) -> Result<UserInfo, ApiError> {
        self.api.get("/users/me").await
    }

    /// Server-side logout. Failures are not shown to the user.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.api
            .execute(
                self.api.request(reqwest::Method::POST, "/auth/logout"),
                RequestOptions::quiet(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::api::testing::{client, ok};
    use crate::common::UserId;

    #[tokio::test]
    async fn login_returns_token_and_profile() {
        let router = Router::new().route(
            "/api/auth/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({ "username": "alice", "password": "secret" }));
                ok(json!({
                    "token": "jwt",
                    "userInfo": { "id": 5, "username": "alice", "avatar": null }
                }))
            }),
        );
        let (api, _) = client(router).await;

        let response = AuthApi::new(api)
            .login(&LoginRequest {
                username: Some("alice".to_string()),
                password: Some("secret".to_string()),
                email: None,
            })
            .await
            .unwrap();

        assert_eq!(response.token, "jwt");
        assert_eq!(response.user_info.id, UserId(5));
        assert_eq!(response.user_info.avatar, "");
    }

    #[tokio::test]
    async fn logout_failures_stay_quiet() {
        let router = Router::new().route(
            "/api/auth/logout",
            post(|| async { Json(json!({ "code": 500, "message": "boom" })) }),
        );
        let (api, notifier) = client(router).await;

        assert!(AuthApi::new(api).logout().await.is_err());
        assert!(notifier.messages().is_empty());
    }
}
