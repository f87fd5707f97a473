use campus_hub::blob::Upload;
use campus_hub::models::ProfileUpdate;
use campus_hub::repos::DirectoryFilter;
use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Show a profile (your own by default)
    Show {
        /// User ID
        uid: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Edit your profile
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// Department
        #[arg(long)]
        department: Option<String>,

        /// Batch (graduation year)
        #[arg(long)]
        batch: Option<String>,

        /// Short bio
        #[arg(long)]
        bio: Option<String>,

        /// Interests, replacing the current list (can be repeated)
        #[arg(long = "interest", value_name = "INTEREST")]
        interests: Vec<String>,
    },

    /// Upload a new profile picture
    Photo {
        /// Image file
        path: PathBuf,
    },

    /// Remove your profile picture
    ClearPhoto,

    /// List your friends
    Friends {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ProfileCommand {
    pub async fn run(&self, hub: &CampusHub, mut session: Session) -> CommandResult {
        match &self.command {
            ProfileSubcommand::Show { uid, format } => {
                let profile = match uid {
                    Some(uid) => hub
                        .users
                        .get(uid)
                        .await?
                        .ok_or_else(|| format!("User not found: {}", uid))?,
                    None => session.profile().clone(),
                };
                print_one(&profile, format)
            }

            ProfileSubcommand::Update {
                name,
                department,
                batch,
                bio,
                interests,
            } => {
                let update = ProfileUpdate {
                    display_name: name.clone(),
                    department: department.clone(),
                    batch: batch.clone(),
                    bio: bio.clone(),
                    interests: (!interests.is_empty()).then(|| interests.clone()),
                };
                if update.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let profile = hub.users.update(&mut session, &update).await?;
                println!("Updated profile:");
                println!("{}", profile);
                Ok(())
            }

            ProfileSubcommand::Photo { path } => {
                let upload = Upload::from_path(path).await?;
                let profile = hub.upload_profile_photo(&mut session, &upload).await?;
                if let Some(url) = &profile.photo_url {
                    println!("Profile picture: {}", url);
                }
                Ok(())
            }

            ProfileSubcommand::ClearPhoto => {
                hub.users.clear_photo(&mut session).await?;
                println!("Removed profile picture");
                Ok(())
            }

            ProfileSubcommand::Friends { format } => {
                let friends = hub.users.friends(session.uid()).await?;
                print_list(&friends, format, "friend(s)", |p| {
                    format!("{:<36}  {:<24}  {}", p.uid, truncate(&p.display_name, 24), p.email)
                })
            }
        }
    }
}

#[derive(Args)]
pub struct DirectoryCommand {
    /// Filter by department
    #[arg(long)]
    department: Option<String>,

    /// Filter by batch
    #[arg(long)]
    batch: Option<String>,

    /// Search name or email
    #[arg(long, short)]
    search: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl DirectoryCommand {
    pub async fn run(&self, hub: &CampusHub) -> CommandResult {
        let filter = DirectoryFilter {
            department: self.department.clone(),
            batch: self.batch.clone(),
            search: self.search.clone(),
        };
        let profiles = hub.users.directory(&filter).await?;

        print_list(&profiles, &self.format, "student(s)", |p| {
            format!(
                "{:<36}  {:<24}  {:<10}  {}",
                p.uid,
                truncate(&p.display_name, 24),
                p.department.as_deref().unwrap_or("-"),
                p.batch.as_deref().unwrap_or("-")
            )
        })
    }
}
