use crate::db::{Collection, DocumentStore, FieldOp, Order, Query};
use crate::error::{Error, Result};
use crate::models::Club;
use crate::session::Session;

pub struct ClubRepository {
    store: DocumentStore,
}

impl ClubRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        session: &Session,
        name: &str,
        category: &str,
        description: &str,
    ) -> Result<Club> {
        let club = Club::new(name, category, session.uid()).with_description(description);
        self.store.insert(Collection::Clubs, &club.id, &club).await?;
        tracing::info!("Created club {} ({})", club.id, club.name);
        Ok(club)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Club>> {
        self.store.get(Collection::Clubs, id).await
    }

    /// Clubs ordered by name.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Club>> {
        self.store
            .query(
                &Query::new(Collection::Clubs)
                    .where_eq_ignore_case_opt("category", category)
                    .order_by(Order::FieldAsc("name".into())),
            )
            .await
    }

    pub async fn memberships(&self, uid: &str) -> Result<Vec<Club>> {
        self.store
            .query(
                &Query::new(Collection::Clubs)
                    .where_contains("members", uid)
                    .order_by(Order::FieldAsc("name".into())),
            )
            .await
    }

    pub async fn join(&self, session: &Session, club_id: &str) -> Result<Club> {
        self.store
            .update(
                Collection::Clubs,
                club_id,
                vec![FieldOp::array_union("members", session.uid())],
            )
            .await?;
        self.store.fetch(Collection::Clubs, club_id).await
    }

    /// Leaves a club. The creator stays a member.
    pub async fn leave(&self, session: &Session, club_id: &str) -> Result<Club> {
        let club: Club = self.store.fetch(Collection::Clubs, club_id).await?;
        if club.created_by == session.uid() {
            return Err(Error::Invalid(
                "The club creator cannot leave the club".to_string(),
            ));
        }

        self.store
            .update(
                Collection::Clubs,
                club_id,
                vec![FieldOp::array_remove("members", session.uid())],
            )
            .await?;
        self.store.fetch(Collection::Clubs, club_id).await
    }
}
