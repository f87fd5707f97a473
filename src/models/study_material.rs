use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An uploaded study resource. `downloads` is a best-effort click counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterial {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    pub file_url: String,
    pub file_name: String,
    pub file_type: String,
    pub uploader_id: String,
    pub uploader_name: String,
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
}

impl StudyMaterial {
    pub fn new(
        new: NewStudyMaterial,
        file_url: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        uploader_id: impl Into<String>,
        uploader_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            subject: new.subject,
            file_url: file_url.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            uploader_id: uploader_id.into(),
            uploader_name: uploader_name.into(),
            downloads: 0,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for StudyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.title, self.subject)?;
        writeln!(f, "File: {} ({})", self.file_name, self.file_type)?;
        writeln!(f, "URL: {}", self.file_url)?;
        writeln!(f, "Uploaded by: {}", self.uploader_name)?;
        writeln!(f, "Downloads: {}", self.downloads)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudyMaterial {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
}
