use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    FriendRequest,
    Like,
    Comment,
    Message,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::FriendRequest => write!(f, "friend_request"),
            NotificationType::Like => write!(f, "like"),
            NotificationType::Comment => write!(f, "comment"),
            NotificationType::Message => write!(f, "message"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub read: bool,
    pub request_id: Option<String>,
    pub post_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationType,
        recipient_id: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipient_id: recipient_id.into(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            kind,
            message: message.into(),
            read: false,
            request_id: None,
            post_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_post_id(mut self, post_id: impl Into<String>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            if self.read { " " } else { "*" },
            self.kind,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new(NotificationType::Like, "u1", "u2", "Ravi", "Ravi liked your post")
            .with_post_id("p1");
        assert!(!n.read);
        assert_eq!(n.post_id.as_deref(), Some("p1"));

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "like");
        assert_eq!(json["recipientId"], "u1");
    }

    #[test]
    fn test_display_marks_unread() {
        let n = Notification::new(NotificationType::Message, "u1", "u2", "Ravi", "Hi");
        assert!(format!("{}", n).starts_with('*'));
    }
}
