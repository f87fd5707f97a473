//! Account commands and the saved CLI session.
//!
//! Only the signed-in uid is written to `session.json` next to the
//! database; every other command resumes from it.

use campus_hub::config::Config;
use campus_hub::identity::FederatedCredential;
use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;

use super::{print_one, CommandResult, OutputFormat};

#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand)]
pub enum AuthSubcommand {
    /// Create an account and sign in
    Signup {
        /// Email address
        email: String,

        /// Display name (defaults to the part of the email before @)
        #[arg(long)]
        name: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in with email and password
    Login {
        /// Email address
        email: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in with a verified identity provider assertion
    Provider {
        /// Provider name (e.g. google)
        provider: String,

        /// Provider's stable subject id for the user
        subject: String,

        /// Email reported by the provider
        #[arg(long)]
        email: String,

        /// Display name reported by the provider
        #[arg(long, default_value = "")]
        name: String,

        /// Photo URL reported by the provider
        #[arg(long)]
        photo_url: Option<String>,
    },

    /// Sign out
    Logout,

    /// Show who is signed in
    Status {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Serialize, Deserialize)]
struct SavedSession {
    uid: String,
}

impl AuthCommand {
    pub async fn run(&self, hub: &CampusHub, config: &Config) -> CommandResult {
        let session_path = config.session_path();

        match &self.command {
            AuthSubcommand::Signup {
                email,
                name,
                password,
            } => {
                let password = password_or_prompt(password.as_deref())?;
                let session = hub
                    .sign_up(email, &password, name.as_deref().unwrap_or(""))
                    .await?;
                save_session(&session_path, &session)?;
                println!("Welcome, {}!", session.display_name());
                Ok(())
            }

            AuthSubcommand::Login { email, password } => {
                let password = password_or_prompt(password.as_deref())?;
                let session = hub.sign_in(email, &password).await?;
                save_session(&session_path, &session)?;
                println!("Signed in as {}", session.display_name());
                Ok(())
            }

            AuthSubcommand::Provider {
                provider,
                subject,
                email,
                name,
                photo_url,
            } => {
                let credential = FederatedCredential {
                    provider: provider.clone(),
                    subject: subject.clone(),
                    email: email.clone(),
                    display_name: name.clone(),
                    photo_url: photo_url.clone(),
                };
                let session = hub.sign_in_with_provider(&credential).await?;
                save_session(&session_path, &session)?;
                println!("Signed in as {} via {}", session.display_name(), provider);
                Ok(())
            }

            AuthSubcommand::Logout => {
                match load_saved(&session_path)? {
                    Some(saved) => {
                        if let Ok(session) = hub.resume(&saved.uid).await {
                            hub.sign_out(session);
                        }
                        std::fs::remove_file(&session_path)?;
                        println!("Signed out");
                    }
                    None => println!("Not signed in"),
                }
                Ok(())
            }

            AuthSubcommand::Status { format } => {
                match load_saved(&session_path)? {
                    Some(saved) => {
                        let session = hub.resume(&saved.uid).await?;
                        print_one(session.profile(), format)?;
                    }
                    None => println!("Not signed in"),
                }
                Ok(())
            }
        }
    }
}

/// Resumes the saved session, or explains how to sign in.
pub async fn require_session(
    hub: &CampusHub,
    config: &Config,
) -> Result<Session, Box<dyn std::error::Error>> {
    let saved = load_saved(&config.session_path())?
        .ok_or("Not signed in. Run 'campus auth login <email>' first.")?;
    Ok(hub.resume(&saved.uid).await?)
}

fn load_saved(path: &Path) -> Result<Option<SavedSession>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

fn save_session(path: &Path, session: &Session) -> CommandResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let saved = SavedSession {
        uid: session.uid().to_string(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&saved)?)?;
    Ok(())
}

fn password_or_prompt(password: Option<&str>) -> Result<String, io::Error> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
