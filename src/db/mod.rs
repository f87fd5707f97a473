mod changes;
mod documents;
mod ops;
mod query;

pub use changes::{Change, ChangeHub, ChangeKind, Watch};
pub use documents::DocumentStore;
pub use ops::{FieldOp, Write};
pub use query::{Filter, Order, Query};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;

/// Named collections in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Posts,
    Comments,
    Events,
    Marketplace,
    StudyMaterials,
    LostFound,
    Notifications,
    Placements,
    FriendRequests,
    Clubs,
    Messages,
}

impl Collection {
    /// Returns the stored collection name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
            Collection::Events => "events",
            Collection::Marketplace => "marketplace",
            Collection::StudyMaterials => "studyMaterials",
            Collection::LostFound => "lostFound",
            Collection::Notifications => "notifications",
            Collection::Placements => "placements",
            Collection::FriendRequests => "friendRequests",
            Collection::Clubs => "clubs",
            Collection::Messages => "messages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;

    tracing::debug!("Opened database at {}", path.display());

    Ok(pool)
}
