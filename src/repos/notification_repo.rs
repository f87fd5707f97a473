use crate::db::{ChangeKind, Collection, DocumentStore, FieldOp, Order, Query, Watch, Write};
use crate::error::Result;
use crate::models::Notification;
use crate::session::Session;

pub struct NotificationRepository {
    store: DocumentStore,
    page_size: i64,
}

impl NotificationRepository {
    pub fn new(store: DocumentStore, page_size: i64) -> Self {
        Self { store, page_size }
    }

    pub async fn create(&self, notification: &Notification) -> Result<()> {
        self.store
            .insert(Collection::Notifications, &notification.id, notification)
            .await
    }

    /// Creates a notification, logging instead of failing.
    pub(crate) async fn notify(&self, notification: Notification) {
        if let Err(e) = self.create(&notification).await {
            tracing::warn!(
                "Failed to notify {} ({}): {}",
                notification.recipient_id,
                notification.kind,
                e
            );
        }
    }

    /// Most recent notifications for the signed-in user, newest first.
    pub async fn list(&self, session: &Session) -> Result<Vec<Notification>> {
        self.store
            .query(
                &Query::new(Collection::Notifications)
                    .where_eq("recipientId", session.uid())
                    .order_by(Order::NewestFirst)
                    .limit(self.page_size),
            )
            .await
    }

    pub async fn unread_count(&self, session: &Session) -> Result<i64> {
        self.store
            .count(
                &Query::new(Collection::Notifications)
                    .where_eq("recipientId", session.uid())
                    .where_eq("read", false),
            )
            .await
    }

    pub async fn mark_read(&self, session: &Session, id: &str) -> Result<()> {
        let notification: Notification = self.store.fetch(Collection::Notifications, id).await?;
        session.require_owner(&notification.recipient_id, "mark this notification read")?;

        self.store
            .update(Collection::Notifications, id, vec![FieldOp::set("read", true)])
            .await
    }

    /// Marks every unread notification read in one batch. Returns how many changed.
    pub async fn mark_all_read(&self, session: &Session) -> Result<usize> {
        let unread: Vec<Notification> = self
            .store
            .query(
                &Query::new(Collection::Notifications)
                    .where_eq("recipientId", session.uid())
                    .where_eq("read", false),
            )
            .await?;

        let count = unread.len();
        if count == 0 {
            return Ok(0);
        }

        // A notification deleted in the meantime is skipped
        let writes = unread
            .iter()
            .map(|n| {
                Write::update(Collection::Notifications, &n.id, vec![FieldOp::set("read", true)])
                    .if_exists()
            })
            .collect();
        self.store.batch(writes).await?;

        tracing::info!("Marked {} notification(s) read for {}", count, session.uid());
        Ok(count)
    }

    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        let notification: Notification = self.store.fetch(Collection::Notifications, id).await?;
        session.require_owner(&notification.recipient_id, "delete this notification")?;

        self.store.delete(Collection::Notifications, id).await
    }

    /// Live stream of notifications created for the signed-in user.
    pub async fn watch(&self, session: &Session) -> NotificationStream {
        NotificationStream {
            watch: self.store.watch(Collection::Notifications).await,
            recipient_id: session.uid().to_string(),
        }
    }
}

pub struct NotificationStream {
    watch: Watch,
    recipient_id: String,
}

impl NotificationStream {
    /// Waits for the next new notification. `None` once every handle to the
    /// store has been dropped.
    pub async fn next(&mut self) -> Result<Option<Notification>> {
        while let Some(change) = self.watch.next().await {
            if change.kind != ChangeKind::Created {
                continue;
            }
            if let Some(notification) = change.document::<Notification>()? {
                if notification.recipient_id == self.recipient_id {
                    return Ok(Some(notification));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::{Notification, NotificationType};
    use crate::test_support::{setup_hub, sign_up};

    fn like_from(sender: &str, recipient: &str) -> Notification {
        Notification::new(NotificationType::Like, recipient, sender, "Arjun", "Arjun liked your post")
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_all_read() {
        let ctx = setup_hub().await;
        let priya = sign_up(&ctx.hub, "priya").await;
        let repo = &ctx.hub.notifications;

        for _ in 0..3 {
            repo.create(&like_from("u2", priya.uid())).await.unwrap();
        }
        assert_eq!(repo.unread_count(&priya).await.unwrap(), 3);

        assert_eq!(repo.mark_all_read(&priya).await.unwrap(), 3);
        assert_eq!(repo.unread_count(&priya).await.unwrap(), 0);
        assert_eq!(repo.mark_all_read(&priya).await.unwrap(), 0);
        assert_eq!(repo.list(&priya).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_only_recipient_can_mark_read() {
        let ctx = setup_hub().await;
        let priya = sign_up(&ctx.hub, "priya").await;
        let arjun = sign_up(&ctx.hub, "arjun").await;
        let repo = &ctx.hub.notifications;

        let notification = like_from(arjun.uid(), priya.uid());
        repo.create(&notification).await.unwrap();

        let err = repo.mark_read(&arjun, &notification.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        repo.mark_read(&priya, &notification.id).await.unwrap();
        assert!(repo.list(&priya).await.unwrap()[0].read);
    }

    #[tokio::test]
    async fn test_delete_notification() {
        let ctx = setup_hub().await;
        let priya = sign_up(&ctx.hub, "priya").await;
        let repo = &ctx.hub.notifications;

        let notification = like_from("u2", priya.uid());
        repo.create(&notification).await.unwrap();
        repo.delete(&priya, &notification.id).await.unwrap();

        assert!(repo.list(&priya).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_filters_by_recipient() {
        let ctx = setup_hub().await;
        let priya = sign_up(&ctx.hub, "priya").await;
        let repo = &ctx.hub.notifications;

        let mut stream = repo.watch(&priya).await;
        repo.create(&like_from("u2", "someone-else")).await.unwrap();
        let mine = like_from("u2", priya.uid());
        repo.create(&mine).await.unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.id, mine.id);
    }

    #[tokio::test]
    async fn test_watch_ends_when_hub_is_dropped() {
        let ctx = setup_hub().await;
        let priya = sign_up(&ctx.hub, "priya").await;

        let mut stream = ctx.hub.notifications.watch(&priya).await;
        drop(priya);
        drop(ctx.hub);

        assert!(stream.next().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_mark_all_read_tolerates_concurrent_delete() {
        let ctx = setup_hub().await;
        let priya = sign_up(&ctx.hub, "priya").await;
        let repo = &ctx.hub.notifications;

        let mut created = Vec::new();
        for _ in 0..5 {
            let notification = like_from("u2", priya.uid());
            repo.create(&notification).await.unwrap();
            created.push(notification);
        }

        let deletes = async {
            for notification in &created {
                repo.delete(&priya, &notification.id).await?;
            }
            Ok::<_, crate::error::Error>(())
        };
        let (marked, deleted) = tokio::join!(repo.mark_all_read(&priya), deletes);
        marked.unwrap();
        deleted.unwrap();
        assert!(repo.list(&priya).await.unwrap().is_empty());
    }
}
