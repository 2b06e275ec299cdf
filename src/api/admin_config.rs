use std::collections::BTreeMap;

use serde_json::{Value, json};

use super::{ApiClient, ApiError};

/// Runtime configuration management, behind an extra admin password.
#[derive(Clone)]
pub struct AdminConfigApi {
    api: ApiClient,
}

impl AdminConfigApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn verify_password(&self, password: &str) -> Result<Value, ApiError> {
        self.api
            .post_json(
                "/admin/config/verify-password",
                &json!({ "password": password }),
            )
            .await
    }

    pub async fn editable_keys(&self) -> Result<Vec<String>, ApiError> {
        self.api.get("/admin/config/keys").await
    }

    pub async fn update(&self, key: &str, value: &str) -> Result<Value, ApiError> {
        self.api
            .put_json(&format!("/admin/config/{key}"), &json!({ "value": value }))
            .await
    }

    pub async fn update_batch(&self, configs: &BTreeMap<String, String>) -> Result<Value, ApiError> {
        self.api.put_json("/admin/config/batch", configs).await
    }

    pub async fn update_mail_password(&self, password: &str) -> Result<Value, ApiError> {
        self.api
            .put_json(
                "/admin/config/mail-password",
                &json!({ "password": password }),
            )
            .await
    }

    pub async fn backup(&self) -> Result<Value, ApiError> {
        self.api.post("/admin/config/backup").await
    }

    pub async fn restart(&self) -> Result<Value, ApiError> {
        self.api.post("/admin/config/restart").await
    }
}
