use crate::db::{Collection, DocumentStore, Order, Query};
use crate::error::Result;
use crate::models::{NewPlacement, Placement};
use crate::session::Session;

pub struct PlacementRepository {
    store: DocumentStore,
    page_size: i64,
}

impl PlacementRepository {
    pub fn new(store: DocumentStore, page_size: i64) -> Self {
        Self { store, page_size }
    }

    pub async fn create(&self, session: &Session, new: NewPlacement) -> Result<Placement> {
        let placement = Placement::new(new, session.uid());
        self.store
            .insert(Collection::Placements, &placement.id, &placement)
            .await?;
        Ok(placement)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Placement>> {
        self.store.get(Collection::Placements, id).await
    }

    pub async fn list(&self) -> Result<Vec<Placement>> {
        self.store
            .query(
                &Query::new(Collection::Placements)
                    .order_by(Order::NewestFirst)
                    .limit(self.page_size),
            )
            .await
    }

    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        let placement: Placement = self.store.fetch(Collection::Placements, id).await?;
        session.require_owner(&placement.posted_by, "delete this placement")?;
        self.store.delete(Collection::Placements, id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::NewPlacement;
    use crate::test_support::{setup_hub, sign_up};

    fn internship() -> NewPlacement {
        NewPlacement {
            company: "Acme".into(),
            role: "Backend intern".into(),
            description: String::new(),
            location: Some("Bengaluru".into()),
            package: None,
            deadline: None,
            apply_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let placements = &ctx.hub.placements;

        let placement = placements.create(&asha, internship()).await.unwrap();
        assert_eq!(placements.list().await.unwrap().len(), 1);

        let err = placements.delete(&ravi, &placement.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        placements.delete(&asha, &placement.id).await.unwrap();
        assert!(placements.list().await.unwrap().is_empty());
    }
}
