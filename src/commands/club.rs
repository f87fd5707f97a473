use campus_hub::models::{club_channel, direct_channel, Message};
use campus_hub::{CampusHub, Session};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct ClubCommand {
    #[command(subcommand)]
    pub command: ClubSubcommand,
}

#[derive(Subcommand)]
pub enum ClubSubcommand {
    /// Start a club
    Create {
        /// Club name
        name: String,

        /// Category (e.g. tech, music, sports)
        #[arg(long)]
        category: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List clubs
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Only clubs you belong to
        #[arg(long)]
        mine: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a club
    Show {
        /// Club ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Join a club
    Join {
        /// Club ID
        id: String,
    },

    /// Leave a club
    Leave {
        /// Club ID
        id: String,
    },
}

impl ClubCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            ClubSubcommand::Create {
                name,
                category,
                description,
            } => {
                let club = hub
                    .clubs
                    .create(
                        session,
                        non_empty(name, "Club name")?,
                        &category.to_lowercase(),
                        description,
                    )
                    .await?;
                println!("Created club {}", club.id);
                Ok(())
            }

            ClubSubcommand::List {
                category,
                mine,
                format,
            } => {
                let clubs = if *mine {
                    hub.clubs.memberships(session.uid()).await?
                } else {
                    hub.clubs.list(category.as_deref()).await?
                };
                print_list(&clubs, format, "club(s)", |c| {
                    format!(
                        "{:<36}  {:<24}  {:<10}  {:>4}",
                        c.id,
                        truncate(&c.name, 24),
                        truncate(&c.category, 10),
                        c.members.len()
                    )
                })
            }

            ClubSubcommand::Show { id, format } => {
                let club = hub
                    .clubs
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Club not found: {}", id))?;
                print_one(&club, format)
            }

            ClubSubcommand::Join { id } => {
                let club = hub.clubs.join(session, id).await?;
                println!("Joined {} ({} member(s))", club.name, club.members.len());
                Ok(())
            }

            ClubSubcommand::Leave { id } => {
                let club = hub.clubs.leave(session, id).await?;
                println!("Left {}", club.name);
                Ok(())
            }
        }
    }
}

/// Which conversation a chat command addresses.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ChannelArgs {
    /// Club ID
    #[arg(long)]
    club: Option<String>,

    /// User ID of the other person in a direct conversation
    #[arg(long)]
    with: Option<String>,
}

impl ChannelArgs {
    fn channel(&self, session: &Session) -> Result<String, String> {
        match (&self.club, &self.with) {
            (Some(club_id), _) => Ok(club_channel(club_id)),
            (None, Some(other)) => Ok(direct_channel(session.uid(), other)),
            (None, None) => Err("Specify --club or --with".to_string()),
        }
    }
}

#[derive(Args)]
pub struct ChatCommand {
    #[command(subcommand)]
    pub command: ChatSubcommand,
}

#[derive(Subcommand)]
pub enum ChatSubcommand {
    /// Send a message
    Send {
        #[command(flatten)]
        to: ChannelArgs,

        /// Message text
        content: String,
    },

    /// Show a conversation's messages
    History {
        #[command(flatten)]
        channel: ChannelArgs,

        /// Only messages after this time (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print new messages as they arrive
    Follow {
        #[command(flatten)]
        channel: ChannelArgs,
    },
}

impl ChatCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            ChatSubcommand::Send { to, content } => {
                let content = non_empty(content, "Message")?;
                let message = match (&to.club, &to.with) {
                    (Some(club_id), _) => hub.chat.send_to_club(session, club_id, content).await?,
                    (None, Some(recipient)) => {
                        hub.chat.send_direct(session, recipient, content).await?
                    }
                    (None, None) => return Err("Specify --club or --with".into()),
                };
                println!("{}", message);
                Ok(())
            }

            ChatSubcommand::History {
                channel,
                since,
                format,
            } => {
                let messages = hub.chat.history(&channel.channel(session)?, *since).await?;
                print_list(&messages, format, "message(s)", Message::to_string)
            }

            ChatSubcommand::Follow { channel } => {
                let mut stream = hub.chat.subscribe(&channel.channel(session)?).await;
                eprintln!("Following {} (Ctrl-C to stop)", stream.channel());
                while let Some(message) = stream.next().await? {
                    println!("{}", message);
                }
                Ok(())
            }
        }
    }
}
