use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use super::video::VideoSummary;
use super::{ApiClient, ApiError, UploadFile};
use crate::common::types::nullable;
use crate::common::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub gender: String,
    #[serde(default, deserialize_with = "nullable")]
    pub address: String,
    #[serde(default, deserialize_with = "nullable")]
    pub role: String,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub followers_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub following_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub video_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub like_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<VideoSummary>>,
}

/// Partial profile update; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct UserApi {
    api: ApiClient,
}

impl UserApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn my_profile(&self) -> Result<UserProfile, ApiError> {
        self.api.get("/user/profile/me").await
    }

    pub async fn profile(&self, user: UserId) -> Result<UserProfile, ApiError> {
        self.api.get(&format!("/user/profile/{user}")).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.api.put_json("/user/profile/me", update).await
    }

    /// Returns the new avatar URL.
    pub async fn upload_avatar(&self, file: UploadFile) -> Result<String, ApiError> {
        let form = Form::new().part("file", file.into_part()?);
        self.api.post_form("/user/profile/avatar", form).await
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::put;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::api::testing::{client, ok};

    #[tokio::test]
    async fn update_sends_only_changed_fields() {
        let router = Router::new().route(
            "/api/user/profile/me",
            put(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({ "nickname": "Ally" }));
                ok(json!({ "userId": 1, "username": "alice", "nickname": "Ally",
                           "age": null, "videos": null }))
            }),
        );
        let (api, _) = client(router).await;

        let profile = UserApi::new(api)
            .update_profile(&ProfileUpdate {
                nickname: Some("Ally".to_string()),
                ..ProfileUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(profile.nickname, "Ally");
        assert_eq!(profile.age, None);
        assert_eq!(profile.videos, None);
    }
}
