use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, RequestOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemVersionInfo {
    pub version: String,
    #[serde(default)]
    pub build_time: Option<String>,
    #[serde(default)]
    pub update_log: Option<String>,
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub min_compatible_version: Option<String>,
    #[serde(default)]
    pub update_type: Option<UpdateType>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckUpdateQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    client_version: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeQuery<'a> {
    from_version: &'a str,
    to_version: &'a str,
}

#[derive(Clone)]
pub struct SystemApi {
    api: ApiClient,
}

impl SystemApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn version(&self) -> Result<SystemVersionInfo, ApiError> {
        self.api.get("/system/version").await
    }

    /// `None` when `client_version` is current.
    pub async fn check_update(
        &self,
        client_version: Option<&str>,
    ) -> Result<Option<SystemVersionInfo>, ApiError> {
        self.api
            .get_query("/system/check-update", &CheckUpdateQuery { client_version })
            .await
    }

    /// Background variant of [`Self::check_update`]: failures are returned
    /// without a user notice.
    pub async fn poll_update(
        &self,
        client_version: Option<&str>,
    ) -> Result<Option<SystemVersionInfo>, ApiError> {
        let request = self
            .api
            .request(Method::GET, "/system/check-update")
            .query(&CheckUpdateQuery { client_version });
        self.api.execute(request, RequestOptions::quiet()).await
    }

    pub async fn perform_upgrade(&self, from_version: &str, to_version: &str) -> Result<(), ApiError> {
        self.api
            .post_query::<serde_json::Value, _>(
                "/system/upgrade",
                &UpgradeQuery {
                    from_version,
                    to_version,
                },
            )
            .await
            .map(drop)
    }

    pub async fn health(&self) -> Result<String, ApiError> {
        self.api.get("/system/health").await
    }
}
