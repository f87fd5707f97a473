//! Live change feed for the document store.
//!
//! Each collection gets its own broadcast channel, created on first
//! subscription. Writes publish after their transaction commits.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use super::Collection;
use crate::error::{Error, Result};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A committed change to one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
    /// The document as committed; `None` for deletes.
    pub data: Option<Value>,
}

impl Change {
    /// Decodes the committed document, `None` for deletes.
    pub fn document<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.data
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|source| Error::Corrupt {
                collection: self.collection,
                id: self.id.clone(),
                source,
            })
    }
}

/// Tracks subscribers per collection.
#[derive(Debug, Default)]
pub struct ChangeHub {
    channels: RwLock<HashMap<Collection, broadcast::Sender<Change>>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to changes in a collection.
    pub async fn subscribe(&self, collection: Collection) -> Watch {
        let mut channels = self.channels.write().await;

        let receiver = match channels.get(&collection) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
                channels.insert(collection, sender);
                receiver
            }
        };

        Watch {
            collection,
            receiver,
        }
    }

    /// Publishes a change to current subscribers of its collection.
    pub async fn publish(&self, change: Change) {
        let channels = self.channels.read().await;

        if let Some(sender) = channels.get(&change.collection) {
            // No receivers is not an error
            let _ = sender.send(change);
        }
    }
}

/// Receiving half of a collection subscription.
#[derive(Debug)]
pub struct Watch {
    collection: Collection,
    receiver: broadcast::Receiver<Change>,
}

impl Watch {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Waits for the next change. Returns `None` once every handle to the
    /// store has been dropped.
    pub async fn next(&mut self) -> Option<Change> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Subscriber on {} lagged, skipped {} change(s)",
                        self.collection,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(collection: Collection, id: &str) -> Change {
        Change {
            collection,
            id: id.to_string(),
            kind: ChangeKind::Created,
            data: None,
        }
    }

    #[tokio::test]
    async fn test_subscribers_only_see_their_collection() {
        let hub = ChangeHub::new();
        let mut posts = hub.subscribe(Collection::Posts).await;
        let _events = hub.subscribe(Collection::Events).await;

        hub.publish(change(Collection::Events, "e1")).await;
        hub.publish(change(Collection::Posts, "p1")).await;

        let received = posts.next().await.unwrap();
        assert_eq!(received.id, "p1");
        assert_eq!(posts.collection(), Collection::Posts);
    }

    #[test]
    fn test_document_decodes_payload() {
        let mut created = change(Collection::Posts, "p1");
        created.data = Some(serde_json::json!({"content": "hi"}));
        let doc: Option<Value> = created.document().unwrap();
        assert_eq!(doc.unwrap()["content"], "hi");

        let bad: Result<Option<Vec<String>>> = created.document();
        assert!(matches!(bad, Err(Error::Corrupt { .. })));

        let deleted: Option<Value> = change(Collection::Posts, "p1").document().unwrap();
        assert!(deleted.is_none());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let hub = ChangeHub::new();
        hub.publish(change(Collection::Posts, "p1")).await;
    }

    #[tokio::test]
    async fn test_watch_ends_when_hub_is_dropped() {
        let hub = ChangeHub::new();
        let mut watch = hub.subscribe(Collection::Clubs).await;
        drop(hub);
        assert!(watch.next().await.is_none());
    }
}
