use crate::blob::{BlobPath, BlobStore, Upload};
use crate::db::{Collection, DocumentStore, FieldOp, Order, Query};
use crate::error::{Error, Result};
use crate::identity::AuthUser;
use crate::models::{ProfileUpdate, UserProfile};
use crate::session::Session;

/// Filters for browsing the student directory. Empty fields match everyone.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    pub department: Option<String>,
    pub batch: Option<String>,
    /// Case-insensitive substring of display name or email.
    pub search: Option<String>,
}

pub struct UserRepository {
    store: DocumentStore,
    blobs: BlobStore,
    page_size: i64,
}

impl UserRepository {
    pub fn new(store: DocumentStore, blobs: BlobStore, page_size: i64) -> Self {
        Self {
            store,
            blobs,
            page_size,
        }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.store.get(Collection::Users, uid).await
    }

    /// Returns the user's profile, creating it on first sign-in.
    pub async fn ensure(&self, user: &AuthUser) -> Result<UserProfile> {
        if let Some(profile) = self.get(&user.uid).await? {
            return Ok(profile);
        }

        let profile = UserProfile::from_auth(user);
        match self.store.insert(Collection::Users, &user.uid, &profile).await {
            Ok(()) => {
                tracing::info!("Created profile for {}", user.uid);
                Ok(profile)
            }
            // Another sign-in created it first
            Err(Error::AlreadyExists { .. }) => self.store.fetch(Collection::Users, &user.uid).await,
            Err(e) => Err(e),
        }
    }

    /// Applies a self-service edit and refreshes the session's profile.
    pub async fn update(&self, session: &mut Session, update: &ProfileUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(Error::Invalid("Nothing to update".to_string()));
        }

        let (profile, _) = self
            .store
            .modify(Collection::Users, session.uid(), |profile: &mut UserProfile| {
                update.apply(profile);
                Ok(())
            })
            .await?;

        session.set_profile(profile.clone());
        Ok(profile)
    }

    /// Replaces the profile picture at `profilePics/{uid}`.
    pub async fn upload_photo(&self, session: &mut Session, upload: &Upload) -> Result<UserProfile> {
        let path = BlobPath::profile_pic(session.uid())?;
        let blob = self.blobs.upload(path, &upload.bytes).await?;

        let (profile, _) = self
            .store
            .modify(Collection::Users, session.uid(), |profile: &mut UserProfile| {
                profile.photo_url = Some(blob.url.clone());
                profile.updated_at = chrono::Utc::now();
                Ok(())
            })
            .await?;

        session.set_profile(profile.clone());
        Ok(profile)
    }

    /// Profiles matching `filter`, ordered by display name.
    pub async fn directory(&self, filter: &DirectoryFilter) -> Result<Vec<UserProfile>> {
        let profiles: Vec<UserProfile> = self
            .store
            .query(
                &Query::new(Collection::Users)
                    .where_eq_ignore_case_opt("department", filter.department.as_deref())
                    .where_eq_ignore_case_opt("batch", filter.batch.as_deref())
                    .order_by(Order::FieldAsc("displayName".into())),
            )
            .await?;

        let matched = profiles
            .into_iter()
            .filter(|p| filter.search.as_deref().map_or(true, |term| p.matches(term)))
            .take(self.page_size.max(0) as usize)
            .collect();
        Ok(matched)
    }

    /// Profiles of `uid`'s friends. Friends whose profile is gone are skipped.
    pub async fn friends(&self, uid: &str) -> Result<Vec<UserProfile>> {
        let profile: UserProfile = self.store.fetch(Collection::Users, uid).await?;

        let mut friends = Vec::with_capacity(profile.friends.len());
        for friend_id in &profile.friends {
            match self.get(friend_id).await? {
                Some(friend) => friends.push(friend),
                None => tracing::debug!("Skipping missing friend profile {}", friend_id),
            }
        }
        Ok(friends)
    }

    /// Clears a stale photo URL, e.g. after the blob was removed.
    pub async fn clear_photo(&self, session: &mut Session) -> Result<()> {
        self.blobs.delete(&BlobPath::profile_pic(session.uid())?).await?;
        self.store
            .update(
                Collection::Users,
                session.uid(),
                vec![FieldOp::set("photoURL", serde_json::Value::Null)],
            )
            .await?;

        let profile = self.store.fetch(Collection::Users, session.uid()).await?;
        session.set_profile(profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DirectoryFilter;
    use crate::blob::Upload;
    use crate::error::ErrorKind;
    use crate::models::ProfileUpdate;
    use crate::test_support::{setup_hub, sign_up};

    #[tokio::test]
    async fn test_profile_created_on_sign_up() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let profile = ctx.hub.users.get(asha.uid()).await.unwrap().unwrap();
        assert_eq!(profile.email, "asha@campus.edu");
        assert_eq!(profile.display_name, "Asha");
        assert!(profile.friends.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let first = ctx.hub.users.ensure(asha.user()).await.unwrap();
        let second = ctx.hub.users.ensure(asha.user()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_refreshes_session() {
        let ctx = setup_hub().await;
        let mut asha = sign_up(&ctx.hub, "asha").await;

        let update = ProfileUpdate {
            display_name: Some("Asha K".into()),
            department: Some("CSE".into()),
            ..Default::default()
        };
        let profile = ctx.hub.users.update(&mut asha, &update).await.unwrap();

        assert_eq!(profile.department.as_deref(), Some("CSE"));
        assert_eq!(asha.display_name(), "Asha K");
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let ctx = setup_hub().await;
        let mut asha = sign_up(&ctx.hub, "asha").await;

        let err = ctx
            .hub
            .users
            .update(&mut asha, &ProfileUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_upload_and_clear_photo() {
        let ctx = setup_hub().await;
        let mut asha = sign_up(&ctx.hub, "asha").await;

        let upload = Upload::new("me.jpg", b"jpeg".to_vec());
        let profile = ctx.hub.users.upload_photo(&mut asha, &upload).await.unwrap();
        let url = profile.photo_url.unwrap();
        assert!(url.ends_with(&format!("/profilePics/{}", asha.uid())));

        ctx.hub.users.clear_photo(&mut asha).await.unwrap();
        assert!(asha.profile().photo_url.is_none());
    }

    #[tokio::test]
    async fn test_directory_filters() {
        let ctx = setup_hub().await;
        let mut asha = sign_up(&ctx.hub, "asha").await;
        let mut ravi = sign_up(&ctx.hub, "ravi").await;
        sign_up(&ctx.hub, "meera").await;

        let cse = ProfileUpdate {
            department: Some("CSE".into()),
            ..Default::default()
        };
        ctx.hub.users.update(&mut asha, &cse).await.unwrap();
        ctx.hub.users.update(&mut ravi, &cse).await.unwrap();

        let users = &ctx.hub.users;
        let all = users.directory(&DirectoryFilter::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Meera", "Ravi"]);

        let in_cse = users
            .directory(&DirectoryFilter {
                department: Some("CSE".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_cse.len(), 2);

        let searched = users
            .directory(&DirectoryFilter {
                search: Some("RAV".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].uid, ravi.uid());
    }
}
