use campus_hub::blob::Upload;
use campus_hub::models::{LostFoundType, NewLostFoundItem};
use campus_hub::{CampusHub, Session};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct LostCommand {
    #[command(subcommand)]
    pub command: LostSubcommand,
}

#[derive(Subcommand)]
pub enum LostSubcommand {
    /// Report a lost or found item
    Report {
        /// lost or found
        kind: LostFoundType,

        /// What it is
        title: String,

        /// Where it was lost or found
        #[arg(long)]
        location: String,

        /// Category (e.g. electronics, id-card)
        #[arg(long, default_value = "other")]
        category: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// How to reach you
        #[arg(long)]
        contact: Option<String>,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Attach a photo
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List open reports
    List {
        /// Only lost or only found
        #[arg(long = "type")]
        kind: Option<LostFoundType>,

        /// Include resolved reports
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a report
    Show {
        /// Report ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark one of your reports resolved
    Resolve {
        /// Report ID
        id: String,
    },
}

impl LostCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            LostSubcommand::Report {
                kind,
                title,
                location,
                category,
                date,
                contact,
                description,
                image,
            } => {
                let new = NewLostFoundItem {
                    title: non_empty(title, "Title")?.to_string(),
                    description: description.clone(),
                    kind: *kind,
                    category: category.to_lowercase(),
                    location: non_empty(location, "Location")?.to_string(),
                    date: date.unwrap_or_else(|| Utc::now().date_naive()),
                    contact: contact.clone(),
                    image_url: None,
                };

                let upload = match image {
                    Some(path) => Some(Upload::from_path(path).await?),
                    None => None,
                };
                let item = hub.lost_found.report(session, new, upload.as_ref()).await?;
                println!("Reported:");
                println!("{}", item);
                Ok(())
            }

            LostSubcommand::List { kind, all, format } => {
                let items = hub.lost_found.list(*kind, *all).await?;
                print_list(&items, format, "report(s)", |i| {
                    format!(
                        "{:<36}  {:<5}  {}  {:<16}  {}{}",
                        i.id,
                        i.kind,
                        i.date,
                        truncate(&i.location, 16),
                        truncate(&i.title, 30),
                        if i.resolved { " (resolved)" } else { "" }
                    )
                })
            }

            LostSubcommand::Show { id, format } => {
                let item = hub
                    .lost_found
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Report not found: {}", id))?;
                print_one(&item, format)
            }

            LostSubcommand::Resolve { id } => {
                hub.lost_found.mark_resolved(session, id).await?;
                println!("Marked {} resolved", id);
                Ok(())
            }
        }
    }
}
