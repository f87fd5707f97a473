use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};

use super::{print_list, CommandResult, OutputFormat};

#[derive(Args)]
pub struct NotifyCommand {
    #[command(subcommand)]
    pub command: NotifySubcommand,
}

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// List recent notifications
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the number of unread notifications
    Unread,

    /// Mark a notification read
    Read {
        /// Notification ID
        id: String,
    },

    /// Mark every notification read
    ReadAll,

    /// Delete a notification
    Delete {
        /// Notification ID
        id: String,
    },

    /// Print new notifications as they arrive
    Watch,
}

impl NotifyCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            NotifySubcommand::List { format } => {
                let notifications = hub.notifications.list(session).await?;
                print_list(&notifications, format, "notification(s)", |n| {
                    format!("{}  {}", n.id, n)
                })
            }

            NotifySubcommand::Unread => {
                let count = hub.notifications.unread_count(session).await?;
                println!("{}", count);
                Ok(())
            }

            NotifySubcommand::Read { id } => {
                hub.notifications.mark_read(session, id).await?;
                println!("Marked {} read", id);
                Ok(())
            }

            NotifySubcommand::ReadAll => {
                let count = hub.notifications.mark_all_read(session).await?;
                println!("Marked {} notification(s) read", count);
                Ok(())
            }

            NotifySubcommand::Delete { id } => {
                hub.notifications.delete(session, id).await?;
                println!("Deleted notification {}", id);
                Ok(())
            }

            NotifySubcommand::Watch => {
                let mut stream = hub.notifications.watch(session).await;
                eprintln!("Watching for notifications (Ctrl-C to stop)");
                while let Some(notification) = stream.next().await? {
                    println!("{}", notification);
                }
                Ok(())
            }
        }
    }
}
