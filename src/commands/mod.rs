mod auth;
mod club;
mod config_cmd;
mod event;
mod friend;
mod lost_found;
mod market;
mod notification;
mod placement;
mod post;
mod profile;
mod study;

pub use auth::{require_session, AuthCommand};
pub use club::{ChatCommand, ClubCommand};
pub use config_cmd::ConfigCommand;
pub use event::EventCommand;
pub use friend::FriendCommand;
pub use lost_found::LostCommand;
pub use market::MarketCommand;
pub use notification::NotifyCommand;
pub use placement::PlacementCommand;
pub use post::PostCommand;
pub use profile::{DirectoryCommand, ProfileCommand};
pub use study::StudyCommand;

use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Display;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints one record as pretty JSON or with its `Display` impl.
pub(crate) fn print_one<T: Serialize + Display>(value: &T, format: &OutputFormat) -> CommandResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", value),
    }
    Ok(())
}

/// Prints a list as pretty JSON, or as text rows via `row`.
pub(crate) fn print_list<T, F>(items: &[T], format: &OutputFormat, noun: &str, row: F) -> CommandResult
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No {} found", noun);
                return Ok(());
            }
            for item in items {
                println!("{}", row(item));
            }
            println!("\nTotal: {} {}", items.len(), noun);
        }
    }
    Ok(())
}

/// Truncates to `max` characters for table output.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Rejects blank free-text input.
pub(crate) fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, String> {
    match value.trim() {
        "" => Err(format!("{} cannot be empty", what)),
        trimmed => Ok(trimmed),
    }
}
