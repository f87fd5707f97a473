use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A job or internship listing on the placements board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub package: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub apply_url: Option<String>,
    pub posted_by: String,
    pub created_at: DateTime<Utc>,
}

impl Placement {
    pub fn new(new: NewPlacement, posted_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company: new.company,
            role: new.role,
            description: new.description,
            location: new.location,
            package: new.package,
            deadline: new.deadline,
            apply_url: new.apply_url,
            posted_by: posted_by.into(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} - {}", self.company, self.role)?;
        if let Some(location) = &self.location {
            writeln!(f, "Location: {}", location)?;
        }
        if let Some(package) = &self.package {
            writeln!(f, "Package: {}", package)?;
        }
        if let Some(deadline) = &self.deadline {
            writeln!(f, "Apply by: {}", deadline)?;
        }
        if let Some(url) = &self.apply_url {
            writeln!(f, "Apply: {}", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlacement {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub apply_url: Option<String>,
}
