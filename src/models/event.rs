use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub category: String,
    pub organizer_id: String,
    pub organizer_name: String,
    pub attendees: Vec<String>,
    pub max_attendees: Option<u32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        new: NewEvent,
        organizer_id: impl Into<String>,
        organizer_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            date: new.date,
            time: new.time,
            location: new.location,
            category: new.category,
            organizer_id: organizer_id.into(),
            organizer_name: organizer_name.into(),
            attendees: Vec::new(),
            max_attendees: new.max_attendees,
            image_url: new.image_url,
            created_at: Utc::now(),
        }
    }

    pub fn is_attending(&self, uid: &str) -> bool {
        self.attendees.iter().any(|a| a == uid)
    }

    pub fn is_full(&self) -> bool {
        self.spots_left() == Some(0)
    }

    /// Remaining capacity, `None` when unlimited.
    pub fn spots_left(&self) -> Option<u32> {
        self.max_attendees
            .map(|max| max.saturating_sub(self.attendees.len() as u32))
    }

    /// Adds `uid` to the attendees if there is room.
    ///
    /// Returns false if `uid` was already attending.
    pub fn rsvp(&mut self, uid: &str) -> Result<bool> {
        if self.is_attending(uid) {
            return Ok(false);
        }
        if self.is_full() {
            return Err(Error::EventFull(self.title.clone()));
        }
        self.attendees.push(uid.to_string());
        Ok(true)
    }

    /// Returns false if `uid` was not attending.
    pub fn cancel_rsvp(&mut self, uid: &str) -> bool {
        let before = self.attendees.len();
        self.attendees.retain(|a| a != uid);
        self.attendees.len() != before
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f, "When: {} {}", self.date, self.time.format("%H:%M"))?;
        writeln!(f, "Where: {}", self.location)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Organizer: {}", self.organizer_name)?;
        match self.max_attendees {
            Some(max) => writeln!(f, "Attendees: {}/{}", self.attendees.len(), max)?,
            None => writeln!(f, "Attendees: {}", self.attendees.len())?,
        }
        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub category: String,
    #[serde(default)]
    pub max_attendees: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}
