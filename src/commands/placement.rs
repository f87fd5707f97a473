use campus_hub::models::NewPlacement;
use campus_hub::{CampusHub, Session};
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct PlacementCommand {
    #[command(subcommand)]
    pub command: PlacementSubcommand,
}

#[derive(Subcommand)]
pub enum PlacementSubcommand {
    /// Post a job or internship
    Create {
        /// Company name
        company: String,

        /// Role title
        role: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Location
        #[arg(long)]
        location: Option<String>,

        /// Compensation (free text, e.g. "12 LPA")
        #[arg(long)]
        package: Option<String>,

        /// Application deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,

        /// Where to apply
        #[arg(long)]
        apply_url: Option<String>,
    },

    /// List recent placements
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a placement
    Show {
        /// Placement ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a placement you posted
    Delete {
        /// Placement ID
        id: String,
    },
}

impl PlacementCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            PlacementSubcommand::Create {
                company,
                role,
                description,
                location,
                package,
                deadline,
                apply_url,
            } => {
                let new = NewPlacement {
                    company: non_empty(company, "Company")?.to_string(),
                    role: non_empty(role, "Role")?.to_string(),
                    description: description.clone(),
                    location: location.clone(),
                    package: package.clone(),
                    deadline: *deadline,
                    apply_url: apply_url.clone(),
                };
                let placement = hub.placements.create(session, new).await?;
                println!("Posted placement:");
                println!("{}", placement);
                Ok(())
            }

            PlacementSubcommand::List { format } => {
                let placements = hub.placements.list().await?;
                print_list(&placements, format, "placement(s)", |p| {
                    format!(
                        "{:<36}  {:<20}  {:<24}  {}",
                        p.id,
                        truncate(&p.company, 20),
                        truncate(&p.role, 24),
                        p.deadline.map(|d| d.to_string()).unwrap_or_default()
                    )
                })
            }

            PlacementSubcommand::Show { id, format } => {
                let placement = hub
                    .placements
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Placement not found: {}", id))?;
                print_one(&placement, format)
            }

            PlacementSubcommand::Delete { id } => {
                hub.placements.delete(session, id).await?;
                println!("Deleted placement {}", id);
                Ok(())
            }
        }
    }
}
