use std::path::Path;

use crate::blob::{BlobStore, Upload};
use crate::config::Config;
use crate::db::{init_db, DocumentStore};
use crate::error::Result;
use crate::identity::{AuthUser, FederatedCredential, IdentityService};
use crate::models::UserProfile;
use crate::repos::{
    ChatRepository, ClubRepository, EventRepository, FriendRepository, LostFoundRepository,
    MarketplaceRepository, MaterialRepository, NotificationRepository, PlacementRepository,
    PostRepository, UserRepository,
};
use crate::session::Session;

/// Entry point bundling the stores, the identity service and every repository.
pub struct CampusHub {
    store: DocumentStore,
    blobs: BlobStore,
    pub identity: IdentityService,
    pub users: UserRepository,
    pub posts: PostRepository,
    pub events: EventRepository,
    pub marketplace: MarketplaceRepository,
    pub materials: MaterialRepository,
    pub lost_found: LostFoundRepository,
    pub notifications: NotificationRepository,
    pub friends: FriendRepository,
    pub placements: PlacementRepository,
    pub clubs: ClubRepository,
    pub chat: ChatRepository,
}

impl CampusHub {
    pub async fn open(config: &Config) -> Result<Self> {
        Self::open_at(
            &config.database_path.value,
            &config.blob_dir.value,
            &config.public_base_url.value,
            config.page_size.value,
        )
        .await
    }

    pub async fn open_at(
        database_path: &Path,
        blob_dir: &Path,
        public_base_url: &str,
        page_size: i64,
    ) -> Result<Self> {
        let pool = init_db(database_path).await?;
        let store = DocumentStore::new(pool.clone());
        let blobs = BlobStore::new(blob_dir, public_base_url);

        tracing::debug!("Opened campus hub at {}", database_path.display());

        Ok(Self {
            identity: IdentityService::new(pool),
            users: UserRepository::new(store.clone(), blobs.clone(), page_size),
            posts: PostRepository::new(store.clone(), blobs.clone(), page_size),
            events: EventRepository::new(store.clone(), blobs.clone(), page_size),
            marketplace: MarketplaceRepository::new(store.clone(), blobs.clone(), page_size),
            materials: MaterialRepository::new(store.clone(), blobs.clone(), page_size),
            lost_found: LostFoundRepository::new(store.clone(), blobs.clone(), page_size),
            notifications: NotificationRepository::new(store.clone(), page_size),
            friends: FriendRepository::new(store.clone()),
            placements: PlacementRepository::new(store.clone(), page_size),
            clubs: ClubRepository::new(store.clone()),
            chat: ChatRepository::new(store.clone(), page_size),
            store,
            blobs,
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session> {
        let user = self.identity.sign_up(email, password, display_name).await?;
        self.start_session(user).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let user = self.identity.sign_in(email, password).await?;
        self.start_session(user).await
    }

    pub async fn sign_in_with_provider(&self, credential: &FederatedCredential) -> Result<Session> {
        let user = self.identity.sign_in_with_provider(credential).await?;
        self.start_session(user).await
    }

    /// Restores a session for a uid remembered from an earlier sign-in.
    pub async fn resume(&self, uid: &str) -> Result<Session> {
        let user = self.identity.resume(uid).await?;
        self.start_session(user).await
    }

    pub fn sign_out(&self, session: Session) {
        tracing::info!("Signed out {}", session.uid());
        self.identity.sign_out();
    }

    /// Replaces the profile picture on both the profile and the account.
    pub async fn upload_profile_photo(&self, session: &mut Session, upload: &Upload) -> Result<UserProfile> {
        let profile = self.users.upload_photo(session, upload).await?;
        if let Some(url) = &profile.photo_url {
            self.identity.set_photo_url(session.uid(), url).await?;
        }
        Ok(profile)
    }

    async fn start_session(&self, user: AuthUser) -> Result<Session> {
        let profile = self.users.ensure(&user).await?;
        Ok(Session::new(user, profile))
    }
}

#[cfg(test)]
mod tests {
    use crate::blob::Upload;
    use crate::error::{Error, ErrorKind};
    use crate::identity::FederatedCredential;
    use crate::test_support::{setup_hub, sign_up};

    #[tokio::test]
    async fn test_sign_in_restores_profile() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        ctx.hub.sign_out(asha);
        assert!(ctx.hub.identity.current_user().is_none());

        let again = ctx.hub.sign_in("ASHA@campus.edu", "secret123").await.unwrap();
        assert_eq!(again.display_name(), "Asha");
        assert_eq!(again.profile().email, "asha@campus.edu");
        assert_eq!(
            ctx.hub.identity.current_user().map(|u| u.uid),
            Some(again.uid().to_string())
        );
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let ctx = setup_hub().await;
        sign_up(&ctx.hub, "asha").await;

        let err = ctx.hub.sign_in("asha@campus.edu", "nope-nope").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_provider_sign_in_links_existing_account() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;

        let credential = FederatedCredential {
            provider: "google".into(),
            subject: "g-123".into(),
            email: "asha@campus.edu".into(),
            display_name: "Asha G".into(),
            photo_url: None,
        };
        let linked = ctx.hub.sign_in_with_provider(&credential).await.unwrap();
        assert_eq!(linked.uid(), asha.uid());
        assert_eq!(linked.display_name(), "Asha");
    }

    #[tokio::test]
    async fn test_resume_unknown_uid() {
        let ctx = setup_hub().await;
        let err = ctx.hub.resume("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotSignedIn));
    }

    #[tokio::test]
    async fn test_profile_photo_updates_account() {
        let ctx = setup_hub().await;
        let mut asha = sign_up(&ctx.hub, "asha").await;

        let upload = Upload::new("me.png", b"png".to_vec());
        let profile = ctx.hub.upload_profile_photo(&mut asha, &upload).await.unwrap();

        let account = ctx.hub.identity.resume(asha.uid()).await.unwrap();
        assert_eq!(account.photo_url, profile.photo_url);
    }
}
