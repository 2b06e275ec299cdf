//! Typed wrappers around the ViewX REST endpoints.
//!
//! Every domain client holds a clone of [`ApiClient`], which owns the HTTP
//! client, attaches the stored bearer token and unwraps the
//! `{code, message, data}` envelope.

pub mod actuator;
pub mod admin;
pub mod admin_config;
pub mod auth;
pub mod chat;
pub mod content;
pub mod interaction;
pub mod notification;
pub mod request;
pub mod search;
pub mod system;
pub mod user;
pub mod video;

pub use request::{ApiClient, RequestOptions};

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request failed ({code}): {message}")]
    Business { code: i64, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// `page`/`size` query shared by the paginated endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
}

impl PageQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

/// A file to send as one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub(crate) fn into_part(self) -> Result<Part, ApiError> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.mime {
            Some(mime) => Ok(part.mime_str(&mime)?),
            None => Ok(part),
        }
    }
}

/// Who can see an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Unlisted => "UNLISTED",
        }
    }
}

pub(crate) fn optional_text(form: Form, name: &'static str, value: Option<&str>) -> Form {
    match value {
        Some(value) if !value.is_empty() => form.text(name, value.to_string()),
        _ => form,
    }
}

/// Each tag becomes its own repeated `tags` part.
pub(crate) fn tag_parts(form: Form, tags: &[String]) -> Form {
    tags.iter()
        .fold(form, |form, tag| form.text("tags", tag.clone()))
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    Some(match extension.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use tokio::net::TcpListener;

    use super::ApiClient;
    use crate::notify::Notifier;
    use crate::notify::testing::RecordingNotifier;
    use crate::storage::KvStore;
    use crate::store::session::SessionStore;

    /// Serves `router` on an ephemeral port and returns its `/api` base URL.
    pub async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    /// Client with token `t-1` stored, recording its notices.
    pub async fn client(router: Router) -> (ApiClient, Arc<RecordingNotifier>) {
        let base = serve(router).await;
        let session = SessionStore::new(Arc::new(KvStore::in_memory().unwrap()));
        session.set_token("t-1").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let api = ApiClient::new(
            &base,
            Duration::from_secs(5),
            session,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        )
        .unwrap();
        (api, notifier)
    }

    pub fn ok(data: serde_json::Value) -> axum::Json<serde_json::Value> {
        axum::Json(serde_json::json!({ "code": 200, "message": "success", "data": data }))
    }
}
