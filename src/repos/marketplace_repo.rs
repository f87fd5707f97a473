use crate::blob::{BlobKind, BlobStore, Upload};
use crate::db::{Collection, DocumentStore, FieldOp, Order, Query};
use crate::error::Result;
use crate::models::{MarketplaceItem, NewMarketplaceItem};
use crate::repos::insert_after_upload;
use crate::session::Session;

pub struct MarketplaceRepository {
    store: DocumentStore,
    blobs: BlobStore,
    page_size: i64,
}

impl MarketplaceRepository {
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
        mut new: NewMarketplaceItem,
        image: Option<&Upload>,
    ) -> Result<MarketplaceItem> {
        let blob = match image {
            Some(upload) => Some(self.blobs.upload_file(BlobKind::Marketplace, upload).await?),
            None => None,
        };
        if let Some(blob) = &blob {
            new.image_url = Some(blob.url.clone());
        }

        let item = MarketplaceItem::new(new, session.uid(), session.display_name());
        insert_after_upload(&self.store, Collection::Marketplace, &item.id, &item, blob.as_ref())
            .await?;
        tracing::info!("Listed item {} for {:.2}", item.id, item.price);
        Ok(item)
    }

    pub async fn get(&self, id: &str) -> Result<Option<MarketplaceItem>> {
        self.store.get(Collection::Marketplace, id).await
    }

    /// Newest listings first. Sold items are left out unless `include_sold`.
    pub async fn list(
        &self,
        category: Option<&str>,
        include_sold: bool,
    ) -> Result<Vec<MarketplaceItem>> {
        let mut query = Query::new(Collection::Marketplace)
            .where_eq_ignore_case_opt("category", category)
            .order_by(Order::NewestFirst)
            .limit(self.page_size);
        if !include_sold {
            query = query.where_eq("sold", false);
        }
        self.store.query(&query).await
    }

    pub async fn by_seller(&self, seller_id: &str) -> Result<Vec<MarketplaceItem>> {
        self.store
            .query(
                &Query::new(Collection::Marketplace)
                    .where_eq("sellerId", seller_id)
                    .order_by(Order::NewestFirst),
            )
            .await
    }

    /// Marks an item sold. Only the seller may; marking twice is harmless.
    pub async fn mark_sold(&self, session: &Session, id: &str) -> Result<()> {
        let item: MarketplaceItem = self.store.fetch(Collection::Marketplace, id).await?;
        session.require_owner(&item.seller_id, "mark this item sold")?;

        self.store
            .update(Collection::Marketplace, id, vec![FieldOp::set("sold", true)])
            .await
    }

    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        let item: MarketplaceItem = self.store.fetch(Collection::Marketplace, id).await?;
        session.require_owner(&item.seller_id, "delete this listing")?;
        self.store.delete(Collection::Marketplace, id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::{ItemCondition, NewMarketplaceItem};
    use crate::test_support::{setup_hub, sign_up};

    fn calculator() -> NewMarketplaceItem {
        NewMarketplaceItem {
            title: "Scientific calculator".into(),
            description: "Barely used".into(),
            price: 15.0,
            category: "electronics".into(),
            condition: ItemCondition::LikeNew,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_payload_cannot_set_server_fields() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let payload: NewMarketplaceItem = serde_json::from_value(serde_json::json!({
            "title": "Desk lamp",
            "price": 8.0,
            "category": "home",
            "id": "forged",
            "sold": true,
            "sellerId": "someone-else",
            "sellerName": "Dean",
            "createdAt": "2001-01-01T00:00:00Z",
        }))
        .unwrap();
        let item = ctx.hub.marketplace.create(&asha, payload, None).await.unwrap();

        let stored = ctx.hub.marketplace.get(&item.id).await.unwrap().unwrap();
        assert_ne!(stored.id, "forged");
        assert!(!stored.sold);
        assert_eq!(stored.seller_id, asha.uid());
        assert_eq!(stored.seller_name, "Asha");
        assert!(stored.created_at.timestamp() > 1_700_000_000);
        assert_eq!(ctx.hub.marketplace.list(Some("Home"), false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_sold_twice() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let market = &ctx.hub.marketplace;

        let item = market.create(&asha, calculator(), None).await.unwrap();
        market.mark_sold(&asha, &item.id).await.unwrap();
        market.mark_sold(&asha, &item.id).await.unwrap();

        assert!(market.get(&item.id).await.unwrap().unwrap().sold);
        assert!(market.list(None, false).await.unwrap().is_empty());
        assert_eq!(market.list(None, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_seller_marks_sold() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let market = &ctx.hub.marketplace;

        let item = market.create(&asha, calculator(), None).await.unwrap();
        let err = market.mark_sold(&ravi, &item.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!market.get(&item.id).await.unwrap().unwrap().sold);
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let market = &ctx.hub.marketplace;

        market.create(&asha, calculator(), None).await.unwrap();
        let mut book = calculator();
        book.title = "Linear Algebra".into();
        book.category = "books".into();
        market.create(&asha, book, None).await.unwrap();

        let books = market.list(Some("books"), false).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Linear Algebra");
        assert_eq!(books[0].seller_name, "Asha");
        assert!(market.list(Some("furniture"), false).await.unwrap().is_empty());
        assert_eq!(market.by_seller(asha.uid()).await.unwrap().len(), 2);
    }
}
