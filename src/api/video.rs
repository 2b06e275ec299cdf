use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, PageQuery, UploadFile, Visibility, optional_text, tag_parts};
use crate::common::types::nullable;
use crate::common::{ServerId, UserId};

/// Video card as listed in feeds and profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: ServerId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumbnail_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: String,
    pub uploader_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_avatar: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: ServerId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub video_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumbnail_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "nullable")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
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
    pub uploader_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub uploader_avatar: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_uploader_verified: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_liked: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_favorited: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_following_uploader: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
}

/// Metadata sent with a new video. Also the body of the admin
/// create-for-user call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCreate {
    pub title: String,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverUpload {
    pub cover_url: String,
    pub thumbnail_url: String,
}

#[derive(Clone)]
pub struct VideoApi {
    api: ApiClient,
}

impl VideoApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn trending(&self, page: u32, size: u32) -> Result<Vec<VideoSummary>, ApiError> {
        self.api
            .get_query("/recommend/trending", &PageQuery::new(page, size))
            .await
    }

    pub async fn feed(&self, page: u32, size: u32) -> Result<Vec<VideoSummary>, ApiError> {
        self.api
            .get_query("/recommend/feed", &PageQuery::new(page, size))
            .await
    }

    pub async fn my_videos(&self) -> Result<Vec<VideoSummary>, ApiError> {
        self.api.get("/videos/my").await
    }

    pub async fn user_videos(&self, user: UserId) -> Result<Vec<VideoSummary>, ApiError> {
        self.api.get(&format!("/videos/user/{user}")).await
    }

    pub async fn detail(&self, id: &ServerId) -> Result<VideoDetail, ApiError> {
        self.api.get(&format!("/videos/{id}")).await
    }

    /// Uploads the video file, an optional cover, and its metadata. Returns
    /// the new video id.
    pub async fn upload(
        &self,
        file: UploadFile,
        cover: Option<UploadFile>,
        metadata: &VideoCreate,
    ) -> Result<ServerId, ApiError> {
        let mut form = Form::new().part("file", file.into_part()?);
        if let Some(cover) = cover {
            form = form.part("coverFile", cover.into_part()?);
        }
        form = form
            .text("title", metadata.title.clone())
            .text("duration", metadata.duration.to_string());
        form = optional_text(form, "description", metadata.description.as_deref());
        form = optional_text(form, "coverUrl", metadata.cover_url.as_deref());
        form = optional_text(form, "thumbnailUrl", metadata.thumbnail_url.as_deref());
        form = optional_text(form, "category", metadata.category.as_deref());
        form = optional_text(form, "subcategory", metadata.subcategory.as_deref());
        form = optional_text(
            form,
            "visibility",
            metadata.visibility.map(Visibility::as_str),
        );
        form = tag_parts(form, &metadata.tags);

        self.api.post_form("/videos", form).await
    }

    pub async fn upload_cover(&self, file: UploadFile) -> Result<CoverUpload, ApiError> {
        let form = Form::new().part("file", file.into_part()?);
        self.api.post_form("/videos/upload/cover", form).await
    }

    pub async fn update(&self, id: &ServerId, update: &VideoUpdate) -> Result<(), ApiError> {
        self.api.put_json(&format!("/videos/{id}"), update).await
    }

    pub async fn delete(&self, id: &ServerId) -> Result<(), ApiError> {
        self.api.delete(&format!("/videos/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Multipart;
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::json;

    use super::*;
    use crate::api::testing::{client, ok};

    #[tokio::test]
    async fn upload_sends_file_cover_and_repeated_tags() {
        let router = Router::new().route(
            "/api/videos",
            post(|mut multipart: Multipart| async move {
                let mut names = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().map(str::to_string);
                    let text = field.text().await.unwrap();
                    names.push(match file_name {
                        Some(file_name) => format!("{name}={file_name}"),
                        None => format!("{name}:{text}"),
                    });
                }
                assert_eq!(
                    names,
                    vec![
                        "file=clip.mp4",
                        "coverFile=cover.png",
                        "title:Sunset",
                        "duration:12.5",
                        "visibility:UNLISTED",
                        "tags:travel",
                        "tags:beach",
                    ]
                );
                ok(json!(99))
            }),
        );
        let (api, _) = client(router).await;

        let id = VideoApi::new(api)
            .upload(
                UploadFile::new("clip.mp4", b"video".to_vec()),
                Some(UploadFile::new("cover.png", b"png".to_vec())),
                &VideoCreate {
                    title: "Sunset".to_string(),
                    duration: 12.5,
                    tags: vec!["travel".to_string(), "beach".to_string()],
                    visibility: Some(Visibility::Unlisted),
                    ..VideoCreate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(id, ServerId::from(99));
    }

    #[tokio::test]
    async fn feed_decodes_sparse_cards() {
        let router = Router::new().route(
            "/api/recommend/feed",
            get(|| async {
                ok(json!([{
                    "id": 1,
                    "title": "First",
                    "uploaderId": 5,
                    "tags": null,
                    "videoUrl": "/media/1.mp4"
                }]))
            }),
        );
        let (api, _) = client(router).await;

        let feed = VideoApi::new(api).feed(1, 10).await.unwrap();
        assert_eq!(feed[0].uploader_id, UserId(5));
        assert!(feed[0].tags.is_empty());
        assert_eq!(feed[0].video_url.as_deref(), Some("/media/1.mp4"));
    }
}
