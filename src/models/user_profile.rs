use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::AuthUser;

/// Public profile stored in `users`, keyed by uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(rename = "photoURL", alias = "profilePic", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub friends: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Initial profile created on first sign-in.
    pub fn from_auth(user: &AuthUser) -> Self {
        let now = Utc::now();
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            department: None,
            batch: None,
            bio: String::new(),
            interests: Vec::new(),
            friends: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_friend(&self, uid: &str) -> bool {
        self.friends.iter().any(|f| f == uid)
    }

    /// Case-insensitive match on display name or email.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.display_name.to_lowercase().contains(&term) || self.email.to_lowercase().contains(&term)
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.display_name)?;
        writeln!(f, "{}", "=".repeat(self.display_name.len()))?;
        writeln!(f, "Email: {}", self.email)?;
        if let Some(department) = &self.department {
            writeln!(f, "Department: {}", department)?;
        }
        if let Some(batch) = &self.batch {
            writeln!(f, "Batch: {}", batch)?;
        }
        if !self.bio.is_empty() {
            writeln!(f, "\n{}", self.bio)?;
        }
        if !self.interests.is_empty() {
            writeln!(f, "\nInterests: {}", self.interests.join(", "))?;
        }
        writeln!(f, "Friends: {}", self.friends.len())?;
        Ok(())
    }
}

/// Self-service profile edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub department: Option<String>,
    pub batch: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.department.is_none()
            && self.batch.is_none()
            && self.bio.is_none()
            && self.interests.is_none()
    }

    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.display_name {
            profile.display_name = name.clone();
        }
        if let Some(department) = &self.department {
            profile.department = Some(department.clone());
        }
        if let Some(batch) = &self.batch {
            profile.batch = Some(batch.clone());
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(interests) = &self.interests {
            profile.interests = interests.clone();
        }
        profile.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthUser {
        AuthUser {
            uid: "u1".into(),
            email: "priya@campus.edu".into(),
            display_name: "Priya".into(),
            photo_url: None,
        }
    }

    #[test]
    fn test_from_auth_has_empty_relations() {
        let profile = UserProfile::from_auth(&auth());
        assert_eq!(profile.uid, "u1");
        assert!(profile.interests.is_empty());
        assert!(profile.friends.is_empty());
        assert!(profile.bio.is_empty());
    }

    #[test]
    fn test_photo_field_names() {
        let mut profile = UserProfile::from_auth(&auth());
        profile.photo_url = Some("https://x/p.png".into());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["photoURL"], "https://x/p.png");
        assert_eq!(json["displayName"], "Priya");

        // Older documents use profilePic
        let mut legacy = json.clone();
        let obj = legacy.as_object_mut().unwrap();
        obj.remove("photoURL");
        obj.insert("profilePic".into(), "https://x/old.png".into());
        let parsed: UserProfile = serde_json::from_value(legacy).unwrap();
        assert_eq!(parsed.photo_url.as_deref(), Some("https://x/old.png"));
    }

    #[test]
    fn test_profile_update_apply() {
        let mut profile = UserProfile::from_auth(&auth());
        let update = ProfileUpdate {
            department: Some("CSE".into()),
            interests: Some(vec!["chess".into()]),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut profile);
        assert_eq!(profile.department.as_deref(), Some("CSE"));
        assert_eq!(profile.interests, vec!["chess"]);
        assert_eq!(profile.display_name, "Priya");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let profile = UserProfile::from_auth(&auth());
        assert!(profile.matches("PRI"));
        assert!(profile.matches("campus.edu"));
        assert!(!profile.matches("zed"));
    }
}
