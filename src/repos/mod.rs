mod chat_repo;
mod club_repo;
mod event_repo;
mod friend_repo;
mod lost_found_repo;
mod marketplace_repo;
mod material_repo;
mod notification_repo;
mod placement_repo;
mod post_repo;
mod user_repo;

pub use chat_repo::{ChatRepository, MessageStream};
pub use club_repo::ClubRepository;
pub use event_repo::EventRepository;
pub use friend_repo::FriendRepository;
pub use lost_found_repo::LostFoundRepository;
pub use marketplace_repo::MarketplaceRepository;
pub use material_repo::MaterialRepository;
pub use notification_repo::{NotificationRepository, NotificationStream};
pub use placement_repo::PlacementRepository;
pub use post_repo::PostRepository;
pub use user_repo::{DirectoryFilter, UserRepository};

use serde::Serialize;

use crate::blob::BlobRef;
use crate::db::{Collection, DocumentStore};
use crate::error::Result;

/// Inserts a document whose blob was uploaded first.
///
/// If the insert fails the blob stays behind; that is logged, not undone.
async fn insert_after_upload<T: Serialize>(
    store: &DocumentStore,
    collection: Collection,
    id: &str,
    doc: &T,
    blob: Option<&BlobRef>,
) -> Result<()> {
    let result = store.insert(collection, id, doc).await;
    if let (Err(e), Some(blob)) = (&result, blob) {
        tracing::warn!(
            "Write to {}/{} failed after uploading {}, blob is orphaned: {}",
            collection,
            id,
            blob.path.as_str(),
            e
        );
    }
    result
}
