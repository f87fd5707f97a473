use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A persisted chat message on a club or direct channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub channel: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel: channel.into(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.created_at.format("%H:%M"),
            self.sender_name,
            self.content
        )
    }
}

/// Channel name for a club's group chat.
pub fn club_channel(club_id: &str) -> String {
    format!("club:{}", club_id)
}

/// Channel name for a direct conversation; the same for either participant.
pub fn direct_channel(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("dm:{}:{}", first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_channel_is_symmetric() {
        assert_eq!(direct_channel("u2", "u1"), direct_channel("u1", "u2"));
        assert_eq!(direct_channel("u1", "u2"), "dm:u1:u2");
    }

    #[test]
    fn test_club_channel() {
        assert_eq!(club_channel("c1"), "club:c1");
    }
}
