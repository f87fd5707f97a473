use campus_hub::blob::Upload;
use campus_hub::models::NewStudyMaterial;
use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct StudyCommand {
    #[command(subcommand)]
    pub command: StudySubcommand,
}

#[derive(Subcommand)]
pub enum StudySubcommand {
    /// Share a study material file
    Upload {
        /// File to upload
        path: PathBuf,

        /// Title
        #[arg(long)]
        title: String,

        /// Subject
        #[arg(long)]
        subject: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List shared materials
    List {
        /// Filter by subject
        #[arg(long)]
        subject: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a material's details
    Show {
        /// Material ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Get a download link (counts as a download)
    Download {
        /// Material ID
        id: String,
    },

    /// Delete one of your uploads
    Delete {
        /// Material ID
        id: String,
    },
}

impl StudyCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            StudySubcommand::Upload {
                path,
                title,
                subject,
                description,
            } => {
                let new = NewStudyMaterial {
                    title: non_empty(title, "Title")?.to_string(),
                    description: description.clone(),
                    subject: non_empty(subject, "Subject")?.to_string(),
                };
                let file = Upload::from_path(path).await?;
                let material = hub.materials.upload(session, new, &file).await?;
                println!("Uploaded:");
                println!("{}", material);
                Ok(())
            }

            StudySubcommand::List { subject, format } => {
                let materials = hub.materials.list(subject.as_deref()).await?;
                print_list(&materials, format, "material(s)", |m| {
                    format!(
                        "{:<36}  {:<12}  {:<6}  {:>5}  {}",
                        m.id,
                        truncate(&m.subject, 12),
                        m.file_type,
                        m.downloads,
                        truncate(&m.title, 30)
                    )
                })
            }

            StudySubcommand::Show { id, format } => {
                let material = hub
                    .materials
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Material not found: {}", id))?;
                print_one(&material, format)
            }

            StudySubcommand::Download { id } => {
                let url = hub.materials.record_download(id).await?;
                println!("{}", url);
                Ok(())
            }

            StudySubcommand::Delete { id } => {
                hub.materials.delete(session, id).await?;
                println!("Deleted material {}", id);
                Ok(())
            }
        }
    }
}
