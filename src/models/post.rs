use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    #[default]
    General,
    Academic,
    Events,
    Clubs,
    Sports,
    Placements,
    Other,
}

impl fmt::Display for PostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostCategory::General => write!(f, "general"),
            PostCategory::Academic => write!(f, "academic"),
            PostCategory::Events => write!(f, "events"),
            PostCategory::Clubs => write!(f, "clubs"),
            PostCategory::Sports => write!(f, "sports"),
            PostCategory::Placements => write!(f, "placements"),
            PostCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for PostCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(PostCategory::General),
            "academic" => Ok(PostCategory::Academic),
            "events" => Ok(PostCategory::Events),
            "clubs" => Ok(PostCategory::Clubs),
            "sports" => Ok(PostCategory::Sports),
            "placements" => Ok(PostCategory::Placements),
            "other" => Ok(PostCategory::Other),
            _ => Err(format!(
                "Invalid category '{}'. Valid options: general, academic, events, clubs, sports, placements, other",
                s
            )),
        }
    }
}

/// A feed post. `like_count` and `comment_count` are denormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category: PostCategory,
    pub likes: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    #[serde(default)]
    pub hide_likes: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            content: content.into(),
            image_url: None,
            category: PostCategory::default(),
            likes: Vec::new(),
            like_count: 0,
            comment_count: 0,
            hide_likes: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: PostCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_hide_likes(mut self, hide_likes: bool) -> Self {
        self.hide_likes = hide_likes;
        self
    }

    pub fn is_liked_by(&self, uid: &str) -> bool {
        self.likes.iter().any(|l| l == uid)
    }

    /// Adds a like. Returns false if `uid` already liked the post.
    pub fn add_like(&mut self, uid: &str) -> bool {
        let added = !self.is_liked_by(uid);
        if added {
            self.likes.push(uid.to_string());
        }
        self.like_count = self.likes.len() as i64;
        added
    }

    /// Removes a like. Returns false if `uid` had not liked the post.
    pub fn remove_like(&mut self, uid: &str) -> bool {
        let before = self.likes.len();
        self.likes.retain(|l| l != uid);
        self.like_count = self.likes.len() as i64;
        self.likes.len() != before
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} [{}] {}",
            self.author_name,
            self.category,
            self.created_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(f, "{}", self.content)?;
        if let Some(url) = &self.image_url {
            writeln!(f, "Image: {}", url)?;
        }
        if self.hide_likes {
            writeln!(f, "{} comment(s)", self.comment_count)?;
        } else {
            writeln!(
                f,
                "{} like(s), {} comment(s)",
                self.like_count, self.comment_count
            )?;
        }
        Ok(())
    }
}

/// Caller-supplied fields for a new post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub content: String,
    #[serde(default)]
    pub category: PostCategory,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub hide_likes: bool,
}

impl NewPost {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_defaults() {
        let post = Post::new("u1", "Asha", "Hello campus");
        assert!(post.likes.is_empty());
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.category, PostCategory::General);
        assert!(!post.hide_likes);
    }

    #[test]
    fn test_like_is_idempotent_per_user() {
        let mut post = Post::new("u1", "Asha", "Hi");
        assert!(post.add_like("u2"));
        assert!(!post.add_like("u2"));
        assert_eq!(post.likes, vec!["u2"]);
        assert_eq!(post.like_count, 1);

        assert!(post.remove_like("u2"));
        assert!(!post.remove_like("u2"));
        assert_eq!(post.like_count, 0);
    }

    #[test]
    fn test_like_resyncs_drifted_counter() {
        let mut post = Post::new("u1", "Asha", "Hi");
        post.like_count = 7;
        post.add_like("u2");
        assert_eq!(post.like_count, 1);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            PostCategory::from_str("Academic").unwrap(),
            PostCategory::Academic
        );
        assert!(PostCategory::from_str("memes").is_err());
    }

    #[test]
    fn test_stored_field_names() {
        let post = Post::new("u1", "Asha", "Hi").with_category(PostCategory::Sports);
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["likeCount"], 0);
        assert_eq!(json["commentCount"], 0);
        assert_eq!(json["authorId"], "u1");
        assert_eq!(json["category"], "sports");
        assert_eq!(json["likes"], serde_json::json!([]));
    }

    #[test]
    fn test_new_post_ignores_server_fields() {
        let payload: NewPost = serde_json::from_value(serde_json::json!({
            "content": "Hi",
            "likeCount": 99,
            "likes": ["x"],
            "id": "forged"
        }))
        .unwrap();
        assert_eq!(payload.content, "Hi");
        assert_eq!(payload.category, PostCategory::General);
    }

    #[test]
    fn test_display_hides_likes() {
        let post = Post::new("u1", "Asha", "Hi").with_hide_likes(true);
        let output = format!("{}", post);
        assert!(!output.contains("like(s)"));
        assert!(output.contains("0 comment(s)"));
    }
}
