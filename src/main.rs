use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use campus_hub::config::Config;
use campus_hub::CampusHub;
use commands::{
    require_session, AuthCommand, ChatCommand, ClubCommand, ConfigCommand, DirectoryCommand,
    EventCommand, FriendCommand, LostCommand, MarketCommand, NotifyCommand, PlacementCommand,
    PostCommand, ProfileCommand, StudyCommand,
};

#[derive(Parser)]
#[command(name = "campus")]
#[command(version)]
#[command(about = "Campus social network from the command line", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in and out
    Auth(AuthCommand),

    /// View and edit profiles
    Profile(ProfileCommand),

    /// Search the student directory
    Directory(DirectoryCommand),

    /// Read and write the feed
    Post(PostCommand),

    /// Campus events and RSVPs
    Event(EventCommand),

    /// Buy and sell items
    Market(MarketCommand),

    /// Share study materials
    Study(StudyCommand),

    /// Lost and found reports
    Lost(LostCommand),

    /// Friends and friend requests
    Friend(FriendCommand),

    /// Notifications
    Notify(NotifyCommand),

    /// Clubs and memberships
    Club(ClubCommand),

    /// Club and direct messages
    Chat(ChatCommand),

    /// Placement board
    Placement(PlacementCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus=warn,campus_hub=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let hub = CampusHub::open(&config).await?;

    match command {
        Commands::Auth(cmd) => cmd.run(&hub, &config).await?,
        Commands::Directory(cmd) => cmd.run(&hub).await?,
        Commands::Profile(cmd) => {
            let session = require_session(&hub, &config).await?;
            cmd.run(&hub, session).await?
        }
        other => {
            let session = require_session(&hub, &config).await?;
            match other {
                Commands::Post(cmd) => cmd.run(&hub, &session).await?,
                Commands::Event(cmd) => cmd.run(&hub, &session).await?,
                Commands::Market(cmd) => cmd.run(&hub, &session).await?,
                Commands::Study(cmd) => cmd.run(&hub, &session).await?,
                Commands::Lost(cmd) => cmd.run(&hub, &session).await?,
                Commands::Friend(cmd) => cmd.run(&hub, &session).await?,
                Commands::Notify(cmd) => cmd.run(&hub, &session).await?,
                Commands::Club(cmd) => cmd.run(&hub, &session).await?,
                Commands::Chat(cmd) => cmd.run(&hub, &session).await?,
                Commands::Placement(cmd) => cmd.run(&hub, &session).await?,
                Commands::Auth(_)
                | Commands::Directory(_)
                | Commands::Profile(_)
                | Commands::Config(_) => {}
            }
        }
    }

    Ok(())
}
