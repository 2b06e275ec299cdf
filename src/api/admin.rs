use serde_json::{Map, Value, json};

use super::video::VideoCreate;
use super::{ApiClient, ApiError, PageQuery};
use crate::common::{ServerId, UserId};

/// Administrator user management. Responses are passed through as JSON.
#[derive(Clone)]
pub struct AdminApi {
    api: ApiClient,
}

impl AdminApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn users(&self, page: u32, size: u32) -> Result<Value, ApiError> {
        self.api
            .get_query("/admin/users", &PageQuery::new(page, size))
            .await
    }

    pub async fn create_video_for_user(
        &self,
        user: UserId,
        video: &VideoCreate,
    ) -> Result<ServerId, ApiError> {
        self.api
            .post_json(&format!("/admin/users/{user}/videos"), video)
            .await
    }

    /// `fields` is merged into a body that always carries the user id.
    pub async fn update_user(&self, user: UserId, fields: Map<String, Value>) -> Result<(), ApiError> {
        let mut body = fields;
        body.insert("id".to_string(), json!(user));
        self.api
            .put_json(&format!("/admin/users/{user}"), &body)
            .await
    }

    pub async fn update_user_status(&self, user: UserId, status: &str) -> Result<(), ApiError> {
        self.api
            .patch_json(
                &format!("/admin/users/{user}/status"),
                &json!({ "status": status }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::{patch, put};
    use axum::{Json, Router};

    use super::*;
    use crate::api::testing::{client, ok};

    #[tokio::test]
    async fn update_user_injects_id_and_status_uses_patch() {
        let router = Router::new()
            .route(
                "/api/admin/users/{user}",
                put(|Json(body): Json<Value>| async move {
                    assert_eq!(body, json!({ "id": 8, "nickname": "Mod" }));
                    ok(Value::Null)
                }),
            )
            .route(
                "/api/admin/users/{user}/status",
                patch(|Json(body): Json<Value>| async move {
                    assert_eq!(body, json!({ "status": "BANNED" }));
                    ok(Value::Null)
                }),
            );
        let (api, _) = client(router).await;
        let admin = AdminApi::new(api);

        let mut fields = Map::new();
        fields.insert("nickname".to_string(), json!("Mod"));
        fields.insert("id".to_string(), json!(999));
        admin.update_user(UserId(8), fields).await.unwrap();
        admin.update_user_status(UserId(8), "BANNED").await.unwrap();
    }
}
