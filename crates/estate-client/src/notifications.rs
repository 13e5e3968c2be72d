//! One user's notification feed backed by `/api/notifications`

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use estate_engine::NotificationInbox;
use estate_types::{Notification, Outcome, Result};
use query_cache::{CacheKey, PollHandle, ViewScope};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::path::ResourcePath;
use crate::repository::Repository;
use crate::response::ListResponse;
use crate::rest::RestClient;

pub struct NotificationFeed {
    notifications: Repository<Notification>,
    user_id: String,
    poll_interval: Duration,
}

impl NotificationFeed {
    pub fn new(
        notifications: Repository<Notification>,
        user_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            notifications,
            user_id: user_id.into(),
            poll_interval,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// `["/api/notifications", <userId>]`
    pub fn key(&self) -> CacheKey {
        self.notifications.collection_key().with(self.user_id.clone())
    }

    fn list_path(&self) -> ResourcePath {
        ResourcePath::collection::<Notification>().param("userId", self.user_id.clone())
    }

    /// Default listing: archived notifications are left out
    pub async fn list(&self) -> Result<Vec<Notification>> {
        let mut items = self.list_all().await?;
        items.retain(|n| !n.is_archived());
        Ok(items)
    }

    /// Every notification of the user, archived ones included
    pub async fn list_all(&self) -> Result<Vec<Notification>> {
        let response: ListResponse<Notification> = self
            .notifications
            .cache()
            .fetch_as(&self.key(), self.notifications.reader(self.list_path()))
            .await?;
        Ok(response.into_items())
    }

    pub async fn inbox(&self) -> Result<NotificationInbox> {
        Ok(NotificationInbox::new(self.list_all().await?))
    }

    pub async fn unread_count(&self) -> Result<usize> {
        Ok(self.inbox().await?.unread_count_for(&self.user_id))
    }

    /// Header badge: the unread count, or the error for the view to render
    pub async fn unread_badge(&self) -> Outcome<usize> {
        self.unread_count().await.into()
    }

    /// Returns whether the notification changed. Already-read notifications
    /// are not sent again.
    pub async fn mark_read(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut inbox = self.inbox().await?;
        if !inbox.mark_read(id, now)? {
            debug!(notification = id, "already read");
            return Ok(false);
        }
        let path = ResourcePath::record::<Notification>(id);
        let body = json!({ "isRead": true, "readAt": now });
        self.commit(inbox, |rest| async move { rest.patch(&path, body).await })
            .await?;
        Ok(true)
    }

    /// Returns whether the notification changed
    pub async fn archive(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut inbox = self.inbox().await?;
        if !inbox.archive(id, now)? {
            debug!(notification = id, "already archived");
            return Ok(false);
        }
        let path = ResourcePath::record::<Notification>(id);
        let body = json!({ "status": "archived", "archivedAt": now });
        self.commit(inbox, |rest| async move { rest.patch(&path, body).await })
            .await?;
        Ok(true)
    }

    /// Marks every unread notification of the user as read in one request.
    /// Returns how many changed; the feed is invalidated only after the
    /// backend accepted the batch.
    pub async fn mark_all_read(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut inbox = self.inbox().await?;
        let changed = inbox.mark_all_read(&self.user_id, now);
        if changed == 0 {
            return Ok(0);
        }
        let path = ResourcePath::collection::<Notification>().segment("mark-all-read");
        let body = json!({ "userId": self.user_id, "readAt": now });
        self.commit(inbox, |rest| async move { rest.post(&path, body).await })
            .await?;
        info!(user = %self.user_id, count = changed, "notifications marked read");
        Ok(changed)
    }

    /// Archives every read notification of the user in one request
    pub async fn archive_all_read(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut inbox = self.inbox().await?;
        let changed = inbox.archive_all_read(&self.user_id, now);
        if changed == 0 {
            return Ok(0);
        }
        let path = ResourcePath::collection::<Notification>().segment("archive-read");
        let body = json!({ "userId": self.user_id, "archivedAt": now });
        self.commit(inbox, |rest| async move { rest.post(&path, body).await })
            .await?;
        info!(user = %self.user_id, count = changed, "read notifications archived");
        Ok(changed)
    }

    /// Refetches the feed every configured interval until the handle drops
    pub fn poll(&self) -> Result<PollHandle> {
        self.poll_every(self.poll_interval)
    }

    pub fn poll_every(&self, every: Duration) -> Result<PollHandle> {
        self.notifications.cache().poll(
            self.key(),
            self.notifications.reader(self.list_path()),
            every,
        )
    }

    /// Polls for as long as `scope` (the notifications view) lives
    pub fn watch(&self, scope: &mut ViewScope) -> Result<()> {
        scope.poll(
            self.key(),
            self.notifications.reader(self.list_path()),
            self.poll_interval,
        )
    }

    /// Shows `inbox` while `send` runs; restores the previous feed on failure
    async fn commit<F, Fut>(&self, inbox: NotificationInbox, send: F) -> Result<()>
    where
        F: FnOnce(Arc<dyn RestClient>) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let optimistic = serde_json::to_value(inbox.items())?;
        let rest = Arc::clone(self.notifications.rest());
        let key = self.key();
        self.notifications
            .cache()
            .mutate_optimistic(&key, move |_| optimistic, move || send(rest), &[key.clone()])
            .await?;
        Ok(())
    }
}
