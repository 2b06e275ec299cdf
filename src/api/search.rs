use serde::Serialize;

use super::interaction::UserSummary;
use super::video::VideoSummary;
use super::{ApiClient, ApiError};

#[derive(Serialize)]
struct SearchQuery<'a> {
    keyword: &'a str,
    page: u32,
    size: u32,
}

#[derive(Clone)]
pub struct SearchApi {
    api: ApiClient,
}

impl SearchApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn users(
        &self,
        keyword: &str,
        page: u32,
        size: u32,
    ) -> Result<Vec<UserSummary>, ApiError> {
        self.api
            .get_query("/users/search", &SearchQuery { keyword, page, size })
            .await
    }

    pub async fn videos(
        &self,
        keyword: &str,
        page: u32,
        size: u32,
    ) -> Result<Vec<VideoSummary>, ApiError> {
        self.api
            .get_query("/recommend/search", &SearchQuery { keyword, page, size })
            .await
    }
}
