use std::sync::Arc;

use async_trait::async_trait;

use crate::api::notification::NotificationQuery;
use crate::api::ApiError;
use crate::common::{Notification, ServerId};

/// REST side of the notification store.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, ApiError>;

    async fn unread_count(&self) -> Result<u64, ApiError>;

    async fn mark_as_read(&self, id: &ServerId) -> Result<(), ApiError>;

    async fn mark_all_as_read(&self) -> Result<(), ApiError>;

    async fn delete(&self, id: &ServerId) -> Result<(), ApiError>;
}

/// Notification list plus unread counter. Local state only changes after
/// the server has accepted the matching call.
pub struct NotificationStore {
    source: Arc<dyn NotificationSource>,
    notifications: Vec<Notification>,
    unread_count: u64,
    loading: bool,
}

impl NotificationStore {
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        Self {
            source,
            notifications: Vec::new(),
            unread_count: 0,
            loading: false,
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replaces the list with one page; page 1 of 10 when `query` is `None`.
    pub async fn fetch_notifications(
        &mut self,
        query: Option<NotificationQuery>,
    ) -> Result<&[Notification], ApiError> {
        let query = query.unwrap_or_default();
        self.loading = true;
        let result = self.source.list(&query).await;
        self.loading = false;

        match result {
            Ok(list) => {
                self.notifications = list;
                Ok(&self.notifications)
            }
            Err(err) => {
                log::error!("Failed to fetch notifications: {err}");
                Err(err)
            }
        }
    }

    /// Refreshes the counter; failures keep the previous value.
    pub async fn fetch_unread_count(&mut self) -> u64 {
        match self.source.unread_count().await {
            Ok(count) => self.unread_count = count,
            Err(err) => log::error!("Failed to fetch unread notification count: {err}"),
        }
        self.unread_count
    }

    pub async fn mark_as_read(&mut self, id: &ServerId) -> Result<(), ApiError> {
        self.source.mark_as_read(id).await?;
        if let Some(notification) = self
            .notifications
            .iter_mut()
            .find(|notification| &notification.id == id)
        {
            if !notification.is_read {
                notification.is_read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
            }
        }
        Ok(())
    }

    pub async fn mark_all_as_read(&mut self) -> Result<(), ApiError> {
        self.source.mark_all_as_read().await?;
        for notification in &mut self.notifications {
            notification.is_read = true;
        }
        self.unread_count = 0;
        Ok(())
    }

    pub async fn delete_notification(&mut self, id: &ServerId) -> Result<(), ApiError> {
        self.source.delete(id).await?;
        if let Some(index) = self
            .notifications
            .iter()
            .position(|notification| &notification.id == id)
        {
            let removed = self.notifications.remove(index);
            if !removed.is_read {
                self.unread_count = self.unread_count.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Real-time push: newest first.
    pub fn add_notification(&mut self, notification: Notification) {
        if !notification.is_read {
            self.unread_count += 1;
        }
        self.notifications.insert(0, notification);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::common::NotificationKind;

    #[derive(Default)]
    struct FakeSource {
        page: Mutex<Vec<Notification>>,
        queries: Mutex<Vec<NotificationQuery>>,
        unread: Mutex<u64>,
        fail: AtomicBool,
    }

    impl FakeSource {
        fn check(&self) -> Result<(), ApiError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Http {
                    status: 500,
                    message: "Internal server error".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationSource for FakeSource {
        async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, ApiError> {
            self.check()?;
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.page.lock().unwrap().clone())
        }

        async fn unread_count(&self) -> Result<u64, ApiError> {
            self.check()?;
            Ok(*self.unread.lock().unwrap())
        }

        async fn mark_as_read(&self, _id: &ServerId) -> Result<(), ApiError> {
            self.check()
        }

        async fn mark_all_as_read(&self) -> Result<(), ApiError> {
            self.check()
        }

        async fn delete(&self, _id: &ServerId) -> Result<(), ApiError> {
            self.check()
        }
    }

    fn notification(id: &str, is_read: bool) -> Notification {
        Notification {
            id: ServerId::new(id),
            notification_type: NotificationKind::LikeVideo,
            notification_type_desc: "liked your video".to_string(),
            sender_id: None,
            sender_username: Some("bob".to_string()),
            sender_nickname: None,
            sender_avatar: None,
            related_video_id: None,
            related_video_title: None,
            related_video_cover: None,
            related_comment_id: None,
            related_comment_content: None,
            content: None,
            is_read,
            created_at: String::new(),
            time_desc: String::new(),
        }
    }

    async fn loaded(source: Arc<FakeSource>) -> NotificationStore {
        *source.page.lock().unwrap() = vec![
            notification("1", false),
            notification("2", true),
            notification("3", false),
        ];
        *source.unread.lock().unwrap() = 2;
        let mut store = NotificationStore::new(source as Arc<dyn NotificationSource>);
        store.fetch_notifications(None).await.unwrap();
        store.fetch_unread_count().await;
        store
    }

    #[tokio::test]
    async fn fetch_defaults_to_the_first_page_of_ten() {
        let source = Arc::new(FakeSource::default());
        let store = loaded(Arc::clone(&source)).await;

        assert_eq!(store.notifications().len(), 3);
        assert_eq!(store.unread_count(), 2);
        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0].page, Some(1));
        assert_eq!(queries[0].page_size, Some(10));
    }

    #[tokio::test]
    async fn reading_twice_only_decrements_once() {
        let mut store = loaded(Arc::new(FakeSource::default())).await;

        store.mark_as_read(&ServerId::new("1")).await.unwrap();
        store.mark_as_read(&ServerId::new("1")).await.unwrap();
        store.mark_as_read(&ServerId::new("2")).await.unwrap();

        assert_eq!(store.unread_count(), 1);
        assert!(store.notifications()[0].is_read);
    }

    #[tokio::test]
    async fn server_failures_leave_state_untouched() {
        let source = Arc::new(FakeSource::default());
        let mut store = loaded(Arc::clone(&source)).await;
        source.fail.store(true, Ordering::SeqCst);

        assert!(store.mark_all_as_read().await.is_err());
        assert!(store.delete_notification(&ServerId::new("1")).await.is_err());
        assert_eq!(store.fetch_unread_count().await, 2);

        assert_eq!(store.unread_count(), 2);
        assert_eq!(store.notifications().len(), 3);
    }

    #[tokio::test]
    async fn delete_and_read_all_adjust_the_counter() {
        let mut store = loaded(Arc::new(FakeSource::default())).await;

        store.delete_notification(&ServerId::new("2")).await.unwrap();
        assert_eq!(store.unread_count(), 2);
        store.delete_notification(&ServerId::new("3")).await.unwrap();
        assert_eq!(store.unread_count(), 1);

        store.mark_all_as_read().await.unwrap();
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().iter().all(|n| n.is_read));
    }

    #[tokio::test]
    async fn counter_never_goes_below_zero() {
        let source = Arc::new(FakeSource::default());
        *source.page.lock().unwrap() = vec![notification("9", false)];
        let mut store = NotificationStore::new(source as Arc<dyn NotificationSource>);
        store.fetch_notifications(None).await.unwrap();

        store.mark_as_read(&ServerId::new("9")).await.unwrap();
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn pushed_notifications_are_prepended() {
        let mut store =
            NotificationStore::new(Arc::new(FakeSource::default()) as Arc<dyn NotificationSource>);

        store.add_notification(notification("1", false));
        store.add_notification(notification("2", true));
        store.add_notification(notification("3", false));

        let ids: Vec<_> = store
            .notifications()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert_eq!(store.unread_count(), 2);
    }
}
