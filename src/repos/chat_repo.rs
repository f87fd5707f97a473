//! Persistent chat on club and direct-message channels.
//!
//! Clients either poll [`ChatRepository::history`] with the timestamp of the
//! last message they saw, or hold a [`MessageStream`] for live delivery.

use chrono::{DateTime, Utc};

use crate::db::{ChangeKind, Collection, DocumentStore, Order, Query, Watch, Write};
use crate::error::{Error, Result};
use crate::models::{
    club_channel, direct_channel, Club, Message, Notification, NotificationType, UserProfile,
};
use crate::session::Session;

const PREVIEW_LEN: usize = 80;

pub struct ChatRepository {
    store: DocumentStore,
    page_size: i64,
}

impl ChatRepository {
    pub fn new(store: DocumentStore, page_size: i64) -> Self {
        Self { store, page_size }
    }

    /// Posts to a club's channel. Only members may post.
    pub async fn send_to_club(&self, session: &Session, club_id: &str, content: &str) -> Result<Message> {
        let club: Club = self.store.fetch(Collection::Clubs, club_id).await?;
        if !club.is_member(session.uid()) {
            return Err(Error::PermissionDenied(format!(
                "Join {} to post in its chat",
                club.name
            )));
        }

        let message = Message::new(
            club_channel(club_id),
            session.uid(),
            session.display_name(),
            content,
        );
        self.store.insert(Collection::Messages, &message.id, &message).await?;
        Ok(message)
    }

    /// Sends a direct message and notifies the recipient in the same batch.
    pub async fn send_direct(&self, session: &Session, recipient_id: &str, content: &str) -> Result<Message> {
        if recipient_id == session.uid() {
            return Err(Error::Invalid("You cannot message yourself".to_string()));
        }
        let _recipient: UserProfile = self.store.fetch(Collection::Users, recipient_id).await?;

        let message = Message::new(
            direct_channel(session.uid(), recipient_id),
            session.uid(),
            session.display_name(),
            content,
        );
        let notification = Notification::new(
            NotificationType::Message,
            recipient_id,
            session.uid(),
            session.display_name(),
            format!("{}: {}", session.display_name(), preview(content)),
        );

        self.store
            .batch(vec![
                Write::insert(Collection::Messages, &message.id, &message)?,
                Write::insert(Collection::Notifications, &notification.id, &notification)?,
            ])
            .await?;
        Ok(message)
    }

    /// Messages on `channel` in send order.
    ///
    /// Without `since`, returns the latest page. With `since`, returns the
    /// page of messages sent after that instant.
    pub async fn history(&self, channel: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Message>> {
        let query = Query::new(Collection::Messages)
            .where_eq("channel", channel)
            .limit(self.page_size);

        match since {
            Some(since) => {
                self.store
                    .query(&query.created_after(since).order_by(Order::OldestFirst))
                    .await
            }
            None => {
                let mut latest: Vec<Message> =
                    self.store.query(&query.order_by(Order::NewestFirst)).await?;
                latest.reverse();
                Ok(latest)
            }
        }
    }

    /// Live stream of new messages on `channel`.
    pub async fn subscribe(&self, channel: &str) -> MessageStream {
        MessageStream {
            watch: self.store.watch(Collection::Messages).await,
            channel: channel.to_string(),
        }
    }
}

pub struct MessageStream {
    watch: Watch,
    channel: String,
}

impl MessageStream {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Waits for the next message on the channel. `None` once the hub is dropped.
    pub async fn next(&mut self) -> Result<Option<Message>> {
        while let Some(change) = self.watch.next().await {
            if change.kind != ChangeKind::Created {
                continue;
            }
            match change.document::<Message>()? {
                Some(message) if message.channel == self.channel => return Ok(Some(message)),
                _ => continue,
            }
        }
        Ok(None)
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_LEN {
        content.to_string()
    } else {
        let cut: String = content.chars().take(PREVIEW_LEN).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::preview;
    use crate::error::ErrorKind;
    use crate::models::{club_channel, direct_channel, NotificationType};
    use crate::test_support::{setup_hub, sign_up};

    #[tokio::test]
    async fn test_club_chat_requires_membership() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;

        let club = ctx.hub.clubs.create(&asha, "Robotics", "tech", "").await.unwrap();
        let err = ctx
            .hub
            .chat
            .send_to_club(&ravi, &club.id, "hi")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        ctx.hub.clubs.join(&ravi, &club.id).await.unwrap();
        ctx.hub.chat.send_to_club(&asha, &club.id, "welcome").await.unwrap();
        ctx.hub.chat.send_to_club(&ravi, &club.id, "thanks").await.unwrap();

        let history = ctx.hub.chat.history(&club_channel(&club.id), None).await.unwrap();
        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["welcome", "thanks"]);
    }

    #[tokio::test]
    async fn test_direct_message_notifies() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;

        let message = ctx.hub.chat.send_direct(&asha, ravi.uid(), "lunch?").await.unwrap();
        assert_eq!(message.channel, direct_channel(ravi.uid(), asha.uid()));

        let notes = ctx.hub.notifications.list(&ravi).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationType::Message);
        assert_eq!(notes[0].message, "Asha: lunch?");
    }

    #[tokio::test]
    async fn test_history_since_excludes_seen_messages() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let chat = &ctx.hub.chat;

        let first = chat.send_direct(&asha, ravi.uid(), "one").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        chat.send_direct(&ravi, asha.uid(), "two").await.unwrap();

        let newer = chat
            .history(&first.channel, Some(first.created_at))
            .await
            .unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].content, "two");
    }

    #[tokio::test]
    async fn test_subscribe_filters_by_channel() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let meera = sign_up(&ctx.hub, "meera").await;
        let chat = &ctx.hub.chat;

        let channel = direct_channel(asha.uid(), ravi.uid());
        let mut stream = chat.subscribe(&channel).await;

        chat.send_direct(&asha, meera.uid(), "not for you").await.unwrap();
        chat.send_direct(&asha, ravi.uid(), "hey ravi").await.unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.content, "hey ravi");
        assert_eq!(stream.channel(), channel);
    }

    #[tokio::test]
    async fn test_stream_ends_after_hub_drop() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;

        let mut stream = ctx.hub.chat.subscribe(&direct_channel(asha.uid(), ravi.uid())).await;
        ctx.hub.chat.send_direct(&asha, ravi.uid(), "last one").await.unwrap();
        drop(ctx.hub);

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.content, "last one");
        assert!(stream.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cannot_message_self() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let err = ctx.hub.chat.send_direct(&asha, asha.uid(), "hi me").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), 83);
        assert_eq!(preview("short"), "short");
    }
}
