use crate::blob::{BlobKind, BlobStore, Upload};
use crate::db::{Collection, DocumentStore, Order, Query};
use crate::error::Result;
use crate::models::{Event, NewEvent};
use crate::repos::insert_after_upload;
use crate::session::Session;

pub struct EventRepository {
    store: DocumentStore,
    blobs: BlobStore,
    page_size: i64,
}

impl EventRepository {
    pub fn new(store: DocumentStore, blobs: BlobStore, page_size: i64) -> Self {
        Self {
            store,
            blobs,
            page_size,
        }
    }

    pub async fn create(
        &self,
        session: &Session,
        mut new: NewEvent,
        image: Option<&Upload>,
    ) -> Result<Event> {
        let blob = match image {
            Some(upload) => Some(self.blobs.upload_file(BlobKind::Event, upload).await?),
            None => None,
        };
        if let Some(blob) = &blob {
            new.image_url = Some(blob.url.clone());
        }

        let event = Event::new(new, session.uid(), session.display_name());
        insert_after_upload(&self.store, Collection::Events, &event.id, &event, blob.as_ref()).await?;
        tracing::info!("Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Event>> {
        self.store.get(Collection::Events, id).await
    }

    /// Events ordered by date, soonest first.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Event>> {
        self.store
            .query(
                &Query::new(Collection::Events)
                    .where_eq_ignore_case_opt("category", category)
                    .order_by(Order::FieldAsc("date".into()))
                    .limit(self.page_size),
            )
            .await
    }

    pub async fn attending(&self, uid: &str) -> Result<Vec<Event>> {
        self.store
            .query(
                &Query::new(Collection::Events)
                    .where_contains("attendees", uid)
                    .order_by(Order::FieldAsc("date".into())),
            )
            .await
    }

    /// Adds the caller to the attendees.
    ///
    /// Fails with `EventFull` when the event is at capacity. RSVPing twice
    /// is a no-op.
    pub async fn rsvp(&self, session: &Session, event_id: &str) -> Result<Event> {
        let (event, added) = self
            .store
            .modify(Collection::Events, event_id, |event: &mut Event| {
                event.rsvp(session.uid())
            })
            .await?;

        if added {
            tracing::info!("{} is attending {}", session.uid(), event_id);
        }
        Ok(event)
    }

    /// Removes the caller from the attendees; a no-op if they weren't attending.
    pub async fn cancel_rsvp(&self, session: &Session, event_id: &str) -> Result<Event> {
        let (event, _) = self
            .store
            .modify(Collection::Events, event_id, |event: &mut Event| {
                Ok(event.cancel_rsvp(session.uid()))
            })
            .await?;
        Ok(event)
    }

    pub async fn delete(&self, session: &Session, event_id: &str) -> Result<()> {
        let event: Event = self.store.fetch(Collection::Events, event_id).await?;
        session.require_owner(&event.organizer_id, "delete this event")?;
        self.store.delete(Collection::Events, event_id).await
    }
}
