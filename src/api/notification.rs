use async_trait::async_trait;
use serde::Serialize;

use super::{ApiClient, ApiError};
use crate::common::{Notification, NotificationKind, ServerId};
use crate::store::notification::NotificationSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<NotificationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            notification_type: None,
            unread_only: None,
            page: Some(1),
            page_size: Some(10),
        }
    }
}

#[derive(Clone)]
pub struct NotificationApi {
    api: ApiClient,
}

impl NotificationApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, ApiError> {
        self.api.get_query("/notifications", query).await
    }

    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        self.api.get("/notifications/unread-count").await
    }

    pub async fn mark_as_read(&self, id: &ServerId) -> Result<(), ApiError> {
        self.api
            .put::<Option<String>>(&format!("/notifications/{id}/read"))
            .await
            .map(drop)
    }

    pub async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        self.api
            .put::<Option<String>>("/notifications/read-all")
            .await
            .map(drop)
    }

    pub async fn delete(&self, id: &ServerId) -> Result<(), ApiError> {
        self.api
            .delete::<Option<String>>(&format!("/notifications/{id}"))
            .await
            .map(drop)
    }
}

#[async_trait]
impl NotificationSource for NotificationApi {
    async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, ApiError> {
        NotificationApi::list(self, query).await
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        NotificationApi::unread_count(self).await
    }

    async fn mark_as_read(&self, id: &ServerId) -> Result<(), ApiError> {
        NotificationApi::mark_as_read(self, id).await
    }

    async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        NotificationApi::mark_all_as_read(self).await
    }

    async fn delete(&self, id: &ServerId) -> Result<(), ApiError> {
        NotificationApi::delete(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::routing::{delete, get};
    use axum::Router;
    use serde_json::json;

    use super::*;
    use crate::api::testing::{client, ok};

    #[tokio::test]
    async fn list_uses_default_paging_and_decodes_kinds() {
        let router = Router::new()
            .route(
                "/api/notifications",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    assert_eq!(query.get("page").map(String::as_str), Some("1"));
                    assert_eq!(query.get("pageSize").map(String::as_str), Some("10"));
                    assert!(!query.contains_key("unreadOnly"));
                    ok(json!([
                        { "id": 1, "notificationType": "FOLLOW", "senderNickname": "Bob",
                          "notificationTypeDesc": "followed you", "isRead": false },
                        { "id": 2, "notificationType": "BRAND_NEW", "isRead": true }
                    ]))
                }),
            )
            .route(
                "/api/notifications/{id}",
                delete(|| async { ok(json!("deleted")) }),
            );
        let (api, _) = client(router).await;
        let notifications = NotificationApi::new(api);

        let list = notifications
            .list(&NotificationQuery::default())
            .await
            .unwrap();
        assert_eq!(list[0].notification_type, NotificationKind::Follow);
        assert_eq!(list[0].summary(), "Bob followed you");
        assert_eq!(
            list[1].notification_type,
            NotificationKind::Unknown("BRAND_NEW".to_string())
        );

        notifications.delete(&ServerId::new("2")).await.unwrap();
    }
}
