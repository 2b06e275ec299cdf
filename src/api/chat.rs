use async_trait::async_trait;

use super::{ApiClient, ApiError, PageQuery};
use crate::common::{ChatMessage, Conversation, UserId};
use crate::store::chat::ChatHistorySource;

#[derive(Clone)]
pub struct ChatApi {
    api: ApiClient,
}

impl ChatApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.api.get("/messages/conversations").await
    }

    /// One page of history with `peer`, newest first.
    pub async fn history(
        &self,
        peer: UserId,
        page: u32,
        size: u32,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        self.api
            .get_query(
                &format!("/messages/history/{peer}"),
                &PageQuery::new(page, size),
            )
            .await
    }

    pub async fn mark_as_read(&self, peer: UserId) -> Result<(), ApiError> {
        self.api.put(&format!("/messages/read/{peer}")).await
    }

    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        self.api.get("/messages/unread-count").await
    }
}

#[async_trait]
impl ChatHistorySource for ChatApi {
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        ChatApi::conversations(self).await
    }

    async fn history(
        &self,
        peer: UserId,
        page: u32,
        size: u32,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        ChatApi::history(self, peer, page, size).await
    }

    async fn mark_as_read(&self, peer: UserId) -> Result<(), ApiError> {
        ChatApi::mark_as_read(self, peer).await
    }
}
