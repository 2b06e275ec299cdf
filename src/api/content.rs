use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, UploadFile, Visibility, optional_text, tag_parts};
use crate::common::types::nullable;
use crate::common::{ServerId, UserId};

/// An image set holds between two and nine images.
pub const IMAGE_SET_LIMITS: (usize, usize) = (2, 9);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Video,
    Image,
    ImageSet,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "VIDEO",
            Self::Image => "IMAGE",
            Self::ImageSet => "IMAGE_SET",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCreate {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    pub visibility: Option<Visibility>,
}

impl ContentCreate {
    fn append_to(&self, form: Form) -> Form {
        let form = form.text("title", self.title.clone());
        let form = optional_text(form, "description", self.description.as_deref());
        let form = optional_text(form, "category", self.category.as_deref());
        let form = optional_text(form, "subcategory", self.subcategory.as_deref());
        let form = optional_text(form, "visibility", self.visibility.map(Visibility::as_str));
        tag_parts(form, &self.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: ServerId,
    pub content_type: ContentType,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumbnail_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub image_count: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    pub uploader_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_avatar: String,
    #[serde(default, deserialize_with = "nullable")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetail {
    pub id: ServerId,
    pub content_type: ContentType,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub primary_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumbnail_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub visibility: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    pub uploader_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_avatar: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_uploader_verified: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub dislike_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub share_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub is_liked: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_favorited: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_following_uploader: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: String,
}

#[derive(Serialize)]
struct TypeFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    content_type: Option<ContentType>,
}

#[derive(Clone)]
pub struct ContentApi {
    api: ApiClient,
}

impl ContentApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn upload_image(
        &self,
        file: UploadFile,
        metadata: &ContentCreate,
    ) -> Result<ServerId, ApiError> {
        let form = Form::new().part("file", file.into_part()?);
        self.api
            .post_form("/contents/image", metadata.append_to(form))
            .await
    }

    /// Rejects sets outside two to nine images before anything is sent.
    pub async fn upload_image_set(
        &self,
        files: Vec<UploadFile>,
        metadata: &ContentCreate,
    ) -> Result<ServerId, ApiError> {
        let (min, max) = IMAGE_SET_LIMITS;
        if !(min..=max).contains(&files.len()) {
            return Err(ApiError::Validation(format!(
                "An image set needs {min} to {max} images, got {}",
                files.len()
            )));
        }
        let mut form = Form::new();
        for file in files {
            form = form.part("files", file.into_part()?);
        }
        self.api
            .post_form("/contents/image-set", metadata.append_to(form))
            .await
    }

    pub async fn detail(&self, id: &ServerId) -> Result<ContentDetail, ApiError> {
        self.api.get(&format!("/contents/{id}")).await
    }

    pub async fn user_contents(
        &self,
        user: UserId,
        content_type: Option<ContentType>,
    ) -> Result<Vec<ContentSummary>, ApiError> {
        self.api
            .get_query(&format!("/contents/user/{user}"), &TypeFilter { content_type })
            .await
    }

    pub async fn my_contents(
        &self,
        content_type: Option<ContentType>,
    ) -> Result<Vec<ContentSummary>, ApiError> {
        self.api
            .get_query("/contents/my", &TypeFilter { content_type })
            .await
    }

    pub async fn delete(&self, id: &ServerId) -> Result<(), ApiError> {
        self.api.delete(&format!("/contents/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;

    use super::*;
    use crate::api::testing::{client, ok};

    #[tokio::test]
    async fn image_sets_are_validated_locally() {
        let (api, notifier) = client(Router::new()).await;
        let content = ContentApi::new(api);
        let metadata = ContentCreate {
            title: "Trip".to_string(),
            ..ContentCreate::default()
        };

        let one = vec![UploadFile::new("a.jpg", vec![1])];
        assert!(matches!(
            content.upload_image_set(one, &metadata).await,
            Err(ApiError::Validation(_))
        ));

        let ten = (0..10)
            .map(|i| UploadFile::new(format!("{i}.jpg"), vec![1]))
            .collect();
        assert!(matches!(
            content.upload_image_set(ten, &metadata).await,
            Err(ApiError::Validation(_))
        ));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn type_filter_is_optional() {
        let router = Router::new().route(
            "/api/contents/my",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                let items = match query.get("type").map(String::as_str) {
                    Some("IMAGE_SET") => json!([{
                        "id": 3, "contentType": "IMAGE_SET", "uploaderId": 1, "imageCount": 4
                    }]),
                    None => json!([]),
                    Some(other) => panic!("unexpected type {other}"),
                };
                ok(items)
            }),
        );
        let (api, _) = client(router).await;
        let content = ContentApi::new(api);

        let sets = content.my_contents(Some(ContentType::ImageSet)).await.unwrap();
        assert_eq!(sets[0].content_type, ContentType::ImageSet);
        assert_eq!(sets[0].image_count, Some(4));

        assert!(content.my_contents(None).await.unwrap().is_empty());
    }
}
