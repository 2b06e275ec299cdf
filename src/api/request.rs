use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use url::Url;

use super::ApiError;
use crate::notify::{NoticeLevel, Notifier};
use crate::store::session::SessionStore;

/// Per-request behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Suppress the user-visible notice on failure. The error is still
    /// returned and 401 handling still applies.
    pub quiet: bool,
}

impl RequestOptions {
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    unauthorized: broadcast::Sender<()>,
}

/// Shared REST wrapper.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let (unauthorized, _) = broadcast::channel(4);
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                session,
                notifier,
                unauthorized,
            }),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// Fires each time the server rejects the stored credential.
    pub fn subscribe_unauthorized(&self) -> broadcast::Receiver<()> {
        self.inner.unauthorized.subscribe()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Builder for `path` with the stored bearer token attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.inner.http.request(method, self.url(path));
        match self.inner.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `builder` and unwraps the response envelope into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                self.report(options, status_message(err.status()));
                return Err(err.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = status_message(Some(status)).to_string();
            self.report(options, &message);
            if status == StatusCode::UNAUTHORIZED {
                self.handle_unauthorized();
                return Err(ApiError::Unauthorized(message));
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                self.report(options, status_message(None));
                return Err(err.into());
            }
        };
        let envelope: Envelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.report(options, "Unexpected response from server");
                return Err(err.into());
            }
        };

        match envelope.code {
            200 | 0 => Ok(serde_json::from_value(envelope.data)?),
            401 => {
                let message = envelope
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| "Session expired, please log in again".to_string());
                self.report(options, &message);
                self.handle_unauthorized();
                Err(ApiError::Unauthorized(message))
            }
            code => {
                let message = envelope
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| "System error".to_string());
                self.report(options, &message);
                Err(ApiError::Business { code, message })
            }
        }
    }

    /// Sends `builder` and returns the raw JSON body, for endpoints that do
    /// not use the envelope. Failures are never surfaced as notices, and a
    /// 401 here leaves the stored token alone.
    pub async fn send_raw(&self, builder: RequestBuilder) -> Result<serde_json::Value, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(status_message(Some(status)).to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: status_message(Some(status)).to_string(),
            });
        }
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::GET, path), RequestOptions::default())
            .await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute(
            self.request(Method::GET, path).query(query),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path), RequestOptions::default())
            .await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(
            self.request(Method::POST, path).json(body),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn post_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute(
            self.request(Method::POST, path).query(query),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        self.execute(
            self.request(Method::POST, path).multipart(form),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::PUT, path), RequestOptions::default())
            .await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(
            self.request(Method::PUT, path).json(body),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(
            self.request(Method::PATCH, path).json(body),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::DELETE, path), RequestOptions::default())
            .await
    }

    fn handle_unauthorized(&self) {
        log::warn!("Credential rejected by the server; clearing stored token");
        self.inner.session.clear_token();
        // Nobody listening is fine.
        let _ = self.inner.unauthorized.send(());
    }

    fn report(&self, options: RequestOptions, message: &str) {
        log::warn!("Request failed: {message}");
        if !options.quiet {
            self.inner.notifier.notify(NoticeLevel::Error, message);
        }
    }
}

fn status_message(status: Option<StatusCode>) -> &'static str {
    match status.map(|status| status.as_u16()) {
        Some(401) => "Unauthorized, please log in again",
        Some(403) => "Access denied",
        Some(404) => "Request address not found",
        Some(500) => "Internal server error",
        _ => "Network connection failure",
    }
}
