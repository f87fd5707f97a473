use campus_hub::blob::Upload;
use campus_hub::models::NewEvent;
use campus_hub::{CampusHub, Session};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct EventCommand {
    #[command(subcommand)]
    pub command: EventSubcommand,
}

#[derive(Subcommand)]
pub enum EventSubcommand {
    /// Create an event
    Create {
        /// Event title
        title: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,

        /// Venue
        #[arg(long)]
        location: String,

        /// Category
        #[arg(long, default_value = "general")]
        category: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Maximum number of attendees
        #[arg(long)]
        max_attendees: Option<u32>,

        /// Attach a poster image
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List upcoming events
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Only events you are attending
        #[arg(long)]
        attending: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an event's details
    Show {
        /// Event ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// RSVP to an event
    Rsvp {
        /// Event ID
        id: String,
    },

    /// Cancel your RSVP
    Cancel {
        /// Event ID
        id: String,
    },

    /// Delete an event you organize
    Delete {
        /// Event ID
        id: String,
    },
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("Invalid time '{}'. Use HH:MM", s))
}

impl EventCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            EventSubcommand::Create {
                title,
                date,
                time,
                location,
                category,
                description,
                max_attendees,
                image,
            } => {
                if *max_attendees == Some(0) {
                    return Err("--max-attendees must be at least 1".into());
                }
                let new = NewEvent {
                    title: non_empty(title, "Title")?.to_string(),
                    description: description.clone(),
                    date: *date,
                    time: *time,
                    location: non_empty(location, "Location")?.to_string(),
                    category: category.to_lowercase(),
                    max_attendees: *max_attendees,
                    image_url: None,
                };

                let upload = match image {
                    Some(path) => Some(Upload::from_path(path).await?),
                    None => None,
                };
                let event = hub.events.create(session, new, upload.as_ref()).await?;
                println!("Created event:");
                println!("{}", event);
                Ok(())
            }

            EventSubcommand::List {
                category,
                attending,
                format,
            } => {
                let events = if *attending {
                    hub.events.attending(session.uid()).await?
                } else {
                    hub.events.list(category.as_deref()).await?
                };
                print_list(&events, format, "event(s)", |e| {
                    let seats = match e.max_attendees {
                        Some(max) => format!("{}/{}", e.attendees.len(), max),
                        None => e.attendees.len().to_string(),
                    };
                    format!(
                        "{:<36}  {}  {}  {:<8}  {}",
                        e.id,
                        e.date,
                        e.time.format("%H:%M"),
                        seats,
                        truncate(&e.title, 30)
                    )
                })
            }

            EventSubcommand::Show { id, format } => {
                let event = hub
                    .events
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Event not found: {}", id))?;
                print_one(&event, format)
            }

            EventSubcommand::Rsvp { id } => {
                let event = hub.events.rsvp(session, id).await?;
                match event.spots_left() {
                    Some(left) => println!("You're going to {} ({} spot(s) left)", event.title, left),
                    None => println!("You're going to {}", event.title),
                }
                Ok(())
            }

            EventSubcommand::Cancel { id } => {
                let event = hub.events.cancel_rsvp(session, id).await?;
                println!("Cancelled RSVP for {}", event.title);
                Ok(())
            }

            EventSubcommand::Delete { id } => {
                hub.events.delete(session, id).await?;
                println!("Deleted event {}", id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert!(parse_time("6pm").is_err());
    }
}
