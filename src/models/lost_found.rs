use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LostFoundType {
    Lost,
    Found,
}

impl fmt::Display for LostFoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LostFoundType::Lost => write!(f, "lost"),
            LostFoundType::Found => write!(f, "found"),
        }
    }
}

impl FromStr for LostFoundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lost" => Ok(LostFoundType::Lost),
            "found" => Ok(LostFoundType::Found),
            _ => Err(format!("Invalid type '{}'. Valid options: lost, found", s)),
        }
    }
}

/// A lost or found report. `resolved` only ever goes from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LostFoundItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: LostFoundType,
    pub category: String,
    pub location: String,
    pub date: NaiveDate,
    pub contact: Option<String>,
    pub image_url: Option<String>,
    pub reporter_id: String,
    pub reporter_name: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl LostFoundItem {
    pub fn new(
        new: NewLostFoundItem,
        reporter_id: impl Into<String>,
        reporter_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            kind: new.kind,
            category: new.category,
            location: new.location,
            date: new.date,
            contact: new.contact,
            image_url: new.image_url,
            reporter_id: reporter_id.into(),
            reporter_name: reporter_name.into(),
            resolved: false,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for LostFoundItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}] {}{}",
            self.kind,
            self.title,
            if self.resolved { " (resolved)" } else { "" }
        )?;
        writeln!(f, "Where: {} on {}", self.location, self.date)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Reported by: {}", self.reporter_name)?;
        if let Some(contact) = &self.contact {
            writeln!(f, "Contact: {}", contact)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLostFoundItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: LostFoundType,
    pub category: String,
    pub location: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_is_stored_as_type() {
        let item = LostFoundItem::new(
            NewLostFoundItem {
                title: "Blue umbrella".into(),
                description: String::new(),
                kind: LostFoundType::Found,
                category: "accessories".into(),
                location: "Library".into(),
                date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
                contact: None,
                image_url: None,
            },
            "u1",
            "Asha",
        );
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "found");
        assert_eq!(json["resolved"], false);
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!(LostFoundType::from_str("LOST").unwrap(), LostFoundType::Lost);
        assert!(LostFoundType::from_str("stolen").is_err());
    }
}
