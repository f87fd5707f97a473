use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};

use super::{print_list, CommandResult, OutputFormat};

#[derive(Args)]
pub struct FriendCommand {
    #[command(subcommand)]
    pub command: FriendSubcommand,
}

#[derive(Subcommand)]
pub enum FriendSubcommand {
    /// Send a friend request
    Add {
        /// User ID of the person to add
        uid: String,
    },

    /// Accept a friend request
    Accept {
        /// Request ID
        request_id: String,
    },

    /// Decline a friend request
    Decline {
        /// Request ID
        request_id: String,
    },

    /// Remove a friend
    Remove {
        /// User ID of the friend
        uid: String,
    },

    /// Show pending friend requests
    Requests {
        /// Show requests you sent instead of ones you received
        #[arg(long)]
        sent: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl FriendCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            FriendSubcommand::Add { uid } => {
                let request = hub.friends.send_request(session, uid).await?;
                println!("Sent friend request {}", request.id);
                Ok(())
            }

            FriendSubcommand::Accept { request_id } => {
                let request = hub.friends.accept(session, request_id).await?;
                println!("You are now friends with {}", request.sender_name);
                Ok(())
            }

            FriendSubcommand::Decline { request_id } => {
                hub.friends.decline(session, request_id).await?;
                println!("Declined request {}", request_id);
                Ok(())
            }

            FriendSubcommand::Remove { uid } => {
                hub.friends.unfriend(session, uid).await?;
                println!("Removed {} from your friends", uid);
                Ok(())
            }

            FriendSubcommand::Requests { sent, format } => {
                if *sent {
                    let requests = hub.friends.outgoing(session).await?;
                    print_list(&requests, format, "request(s)", |r| {
                        format!("{}  to {} ({})", r.id, r.recipient_id, r.status)
                    })
                } else {
                    let requests = hub.friends.incoming(session).await?;
                    print_list(&requests, format, "request(s)", |r| r.to_string())
                }
            }
        }
    }
}
