use crate::blob::{BlobKind, BlobStore, Upload};
use crate::db::{Collection, DocumentStore, FieldOp, Order, Query};
use crate::error::Result;
use crate::models::{LostFoundItem, LostFoundType, NewLostFoundItem};
use crate::repos::insert_after_upload;
use crate::session::Session;

pub struct LostFoundRepository {
    store: DocumentStore,
    blobs: BlobStore,
    page_size: i64,
}

impl LostFoundRepository {
    pub fn new(store: DocumentStore, blobs: BlobStore, page_size: i64) -> Self {
        Self {
            store,
            blobs,
            page_size,
        }
    }

    pub async fn report(
        &self,
        session: &Session,
        mut new: NewLostFoundItem,
        image: Option<&Upload>,
    ) -> Result<LostFoundItem> {
        let blob = match image {
            Some(upload) => Some(self.blobs.upload_file(BlobKind::LostFound, upload).await?),
            None => None,
        };
        if let Some(blob) = &blob {
            new.image_url = Some(blob.url.clone());
        }

        let item = LostFoundItem::new(new, session.uid(), session.display_name());
        insert_after_upload(&self.store, Collection::LostFound, &item.id, &item, blob.as_ref())
            .await?;
        tracing::info!("Reported {} item {}", item.kind, item.id);
        Ok(item)
    }

    pub async fn get(&self, id: &str) -> Result<Option<LostFoundItem>> {
        self.store.get(Collection::LostFound, id).await
    }

    /// Newest reports first. Resolved reports are left out unless `include_resolved`.
    pub async fn list(
        &self,
        kind: Option<LostFoundType>,
        include_resolved: bool,
    ) -> Result<Vec<LostFoundItem>> {
        let mut query = Query::new(Collection::LostFound)
            .where_eq_opt("type", kind.map(|k| k.to_string()))
            .order_by(Order::NewestFirst)
            .limit(self.page_size);
        if !include_resolved {
            query = query.where_eq("resolved", false);
        }
        self.store.query(&query).await
    }

    /// Only the reporter may resolve; resolving twice is harmless.
    pub async fn mark_resolved(&self, session: &Session, id: &str) -> Result<()> {
        let item: LostFoundItem = self.store.fetch(Collection::LostFound, id).await?;
        session.require_owner(&item.reporter_id, "resolve this report")?;

        self.store
            .update(Collection::LostFound, id, vec![FieldOp::set("resolved", true)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::blob::Upload;
    use crate::error::ErrorKind;
    use crate::models::{LostFoundType, NewLostFoundItem};
    use crate::test_support::{setup_hub, sign_up};

    fn umbrella(kind: LostFoundType) -> NewLostFoundItem {
        NewLostFoundItem {
            title: "Blue umbrella".into(),
            description: String::new(),
            kind,
            category: "accessories".into(),
            location: "Library".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            contact: Some("asha@campus.edu".into()),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_payload_cannot_set_server_fields() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let payload: NewLostFoundItem = serde_json::from_value(serde_json::json!({
            "title": "Keys",
            "type": "lost",
            "category": "keys",
            "location": "Canteen",
            "date": "2026-10-02",
            "id": "forged",
            "resolved": true,
            "reporterId": "someone-else",
            "reporterName": "Dean",
            "createdAt": "2001-01-01T00:00:00Z",
        }))
        .unwrap();
        let item = ctx.hub.lost_found.report(&asha, payload, None).await.unwrap();

        let stored = ctx.hub.lost_found.get(&item.id).await.unwrap().unwrap();
        assert_ne!(stored.id, "forged");
        assert!(!stored.resolved);
        assert_eq!(stored.kind, LostFoundType::Lost);
        assert_eq!(stored.reporter_id, asha.uid());
        assert_eq!(stored.reporter_name, "Asha");
        assert!(stored.created_at.timestamp() > 1_700_000_000);
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let lost_found = &ctx.hub.lost_found;

        lost_found.report(&asha, umbrella(LostFoundType::Lost), None).await.unwrap();
        lost_found.report(&asha, umbrella(LostFoundType::Found), None).await.unwrap();

        let lost = lost_found.list(Some(LostFoundType::Lost), false).await.unwrap();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].kind, LostFoundType::Lost);
        assert_eq!(lost_found.list(None, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_resolved_twice() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let lost_found = &ctx.hub.lost_found;

        let item = lost_found
            .report(&asha, umbrella(LostFoundType::Lost), None)
            .await
            .unwrap();
        lost_found.mark_resolved(&asha, &item.id).await.unwrap();
        lost_found.mark_resolved(&asha, &item.id).await.unwrap();

        assert!(lost_found.get(&item.id).await.unwrap().unwrap().resolved);
        assert!(lost_found.list(None, false).await.unwrap().is_empty());
        assert_eq!(lost_found.list(None, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_reporter_resolves() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let lost_found = &ctx.hub.lost_found;

        let item = lost_found
            .report(&asha, umbrella(LostFoundType::Found), None)
            .await
            .unwrap();
        let err = lost_found.mark_resolved(&ravi, &item.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_report_with_photo() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let photo = Upload::new("umbrella.png", vec![0x89, 0x50, 0x4e, 0x47]);
        let item = ctx
            .hub
            .lost_found
            .report(&asha, umbrella(LostFoundType::Found), Some(&photo))
            .await
            .unwrap();
        assert!(item.image_url.unwrap().contains("/lostfound/"));
    }
}
