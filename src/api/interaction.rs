use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, PageQuery};
use crate::common::types::nullable;
use crate::common::{ServerId, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct InteractionStatus {
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub favorited: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub is_follower: bool,
    #[serde(default)]
    pub is_mutual: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub status_text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStats {
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

/// Compact user entry used by follower lists and user search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_following: bool,
}

#[derive(Clone)]
pub struct InteractionApi {
    api: ApiClient,
}

impl InteractionApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn toggle_like(&self, video: &ServerId) -> Result<(), ApiError> {
        self.api.post(&format!("/interactions/like/{video}")).await
    }

    pub async fn toggle_favorite(&self, video: &ServerId) -> Result<(), ApiError> {
        self.api
            .post(&format!("/interactions/favorite/{video}"))
            .await
    }

    pub async fn status(&self, video: &ServerId) -> Result<InteractionStatus, ApiError> {
        self.api
            .get(&format!("/interactions/status/{video}"))
            .await
    }

    /// Returns the server's description of the new state.
    pub async fn toggle_follow(&self, user: UserId) -> Result<String, ApiError> {
        self.api
            .post(&format!("/interactions/follow/{user}"))
            .await
    }

    pub async fn is_following(&self, user: UserId) -> Result<bool, ApiError> {
        self.api
            .get(&format!("/interactions/follow/status/{user}"))
            .await
    }

    pub async fn detailed_follow_status(&self, user: UserId) -> Result<FollowStatus, ApiError> {
        self.api
            .get(&format!("/interactions/follow/detailed-status/{user}"))
            .await
    }

    pub async fn follow_stats(&self, user: UserId) -> Result<FollowStats, ApiError> {
        self.api
            .get(&format!("/interactions/follow/stats/{user}"))
            .await
    }

    pub async fn followers(
        &self,
        user: UserId,
        page: u32,
        size: u32,
    ) -> Result<Vec<UserSummary>, ApiError> {
        self.api
            .get_query(
                &format!("/interactions/followers/{user}"),
                &PageQuery::new(page, size),
            )
            .await
    }

    pub async fn following(
        &self,
        user: UserId,
        page: u32,
        size: u32,
    ) -> Result<Vec<UserSummary>, ApiError> {
        self.api
            .get_query(
                &format!("/interactions/following/{user}"),
                &PageQuery::new(page, size),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::json;

    use super::*;
    use crate::api::testing::{client, ok};

    #[tokio::test]
    async fn follow_round_trip() {
        let router = Router::new()
            .route(
                "/api/interactions/follow/{user}",
                post(|| async { ok(json!("Followed")) }),
            )
            .route(
                "/api/interactions/follow/detailed-status/{user}",
                get(|| async {
                    ok(json!({ "isFollowing": true, "isFollower": true, "isMutual": true,
                               "statusText": "Mutual" }))
                }),
            )
            .route(
                "/api/interactions/follow/stats/{user}",
                get(|| async { ok(json!({ "followerCount": 10, "followingCount": 3 })) }),
            );
        let (api, _) = client(router).await;
        let interactions = InteractionApi::new(api);

        assert_eq!(interactions.toggle_follow(UserId(9)).await.unwrap(), "Followed");
        let status = interactions.detailed_follow_status(UserId(9)).await.unwrap();
        assert!(status.is_mutual);
        assert_eq!(
            interactions.follow_stats(UserId(9)).await.unwrap(),
            FollowStats {
                follower_count: 10,
                following_count: 3
            }
        );
    }
}
