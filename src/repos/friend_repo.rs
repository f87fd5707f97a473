use chrono::Utc;

use crate::db::{Collection, DocumentStore, FieldOp, Order, Query, Write};
use crate::error::{Error, Result};
use crate::models::{
    FriendRequest, FriendRequestStatus, Notification, NotificationType, UserProfile,
};
use crate::session::Session;

/// Friend requests and the symmetric `friends` lists on profiles.
///
/// Answering a request is a single batch guarded on the request still being
/// pending, so a request can be accepted or declined at most once. Sending
/// checks for a pending request in either direction inside its own batch.
pub struct FriendRepository {
    store: DocumentStore,
}

impl FriendRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn send_request(&self, session: &Session, recipient_id: &str) -> Result<FriendRequest> {
        if recipient_id == session.uid() {
            return Err(Error::Invalid(
                "You cannot send a friend request to yourself".to_string(),
            ));
        }

        let recipient: UserProfile = self.store.fetch(Collection::Users, recipient_id).await?;
        if recipient.is_friend(session.uid()) {
            return Err(Error::Invalid(format!(
                "You are already friends with {}",
                recipient.display_name
            )));
        }

        let request = FriendRequest::new(session.uid(), session.display_name(), recipient_id);
        let notification = Notification::new(
            NotificationType::FriendRequest,
            recipient_id,
            session.uid(),
            session.display_name(),
            format!("{} sent you a friend request", session.display_name()),
        )
        .with_request_id(&request.id);

        let already_pending = "A friend request is already pending";
        self.store
            .batch(vec![
                Write::absent(pending(session.uid(), recipient_id), already_pending),
                Write::absent(pending(recipient_id, session.uid()), already_pending),
                Write::insert(Collection::FriendRequests, &request.id, &request)?,
                Write::insert(Collection::Notifications, &notification.id, &notification)?,
            ])
            .await?;

        tracing::info!("Friend request {} from {} to {}", request.id, session.uid(), recipient_id);
        Ok(request)
    }

    /// Accepts a request addressed to the caller; both users become friends.
    pub async fn accept(&self, session: &Session, request_id: &str) -> Result<FriendRequest> {
        self.respond(session, request_id, FriendRequestStatus::Accepted).await
    }

    pub async fn decline(&self, session: &Session, request_id: &str) -> Result<FriendRequest> {
        self.respond(session, request_id, FriendRequestStatus::Declined).await
    }

    async fn respond(
        &self,
        session: &Session,
        request_id: &str,
        status: FriendRequestStatus,
    ) -> Result<FriendRequest> {
        let request: FriendRequest = self.store.fetch(Collection::FriendRequests, request_id).await?;
        if request.recipient_id != session.uid() {
            return Err(Error::PermissionDenied(
                "Only the recipient can answer this friend request".to_string(),
            ));
        }
        if request.status != FriendRequestStatus::Pending {
            return Err(already_answered(request.status));
        }

        let notifications: Vec<Notification> = self
            .store
            .query(&Query::new(Collection::Notifications).where_eq("requestId", request_id))
            .await?;

        let mut writes = vec![Write::update(
            Collection::FriendRequests,
            request_id,
            vec![
                FieldOp::set("status", status.as_str()),
                FieldOp::set("respondedAt", Utc::now().to_rfc3339()),
            ],
        )
        .when("status", FriendRequestStatus::Pending.as_str())];

        writes.extend(notifications.iter().map(|n| {
            Write::update(Collection::Notifications, &n.id, vec![FieldOp::set("read", true)])
                .if_exists()
        }));

        if status == FriendRequestStatus::Accepted {
            writes.push(Write::update(
                Collection::Users,
                &request.sender_id,
                vec![FieldOp::array_union("friends", request.recipient_id.as_str())],
            ));
            writes.push(Write::update(
                Collection::Users,
                &request.recipient_id,
                vec![FieldOp::array_union("friends", request.sender_id.as_str())],
            ));
        }

        self.store.batch(writes).await.map_err(|e| match e {
            // Answered concurrently between our read and the batch
            Error::PreconditionFailed { .. } => {
                Error::Invalid("Friend request was already answered".to_string())
            }
            other => other,
        })?;

        tracing::info!("Friend request {} {}", request_id, status);
        self.store.fetch(Collection::FriendRequests, request_id).await
    }

    /// Removes the friendship from both profiles.
    pub async fn unfriend(&self, session: &Session, friend_id: &str) -> Result<()> {
        let profile: UserProfile = self.store.fetch(Collection::Users, session.uid()).await?;
        if !profile.is_friend(friend_id) {
            return Err(Error::Invalid("You are not friends with this user".to_string()));
        }

        self.store
            .batch(vec![
                Write::update(
                    Collection::Users,
                    session.uid(),
                    vec![FieldOp::array_remove("friends", friend_id)],
                ),
                Write::update(
                    Collection::Users,
                    friend_id,
                    vec![FieldOp::array_remove("friends", session.uid())],
                ),
            ])
            .await
    }

    /// Pending requests addressed to the caller, newest first.
    pub async fn incoming(&self, session: &Session) -> Result<Vec<FriendRequest>> {
        self.store
            .query(
                &Query::new(Collection::FriendRequests)
                    .where_eq("recipientId", session.uid())
                    .where_eq("status", FriendRequestStatus::Pending.as_str())
                    .order_by(Order::NewestFirst),
            )
            .await
    }

    /// Pending requests the caller has sent.
    pub async fn outgoing(&self, session: &Session) -> Result<Vec<FriendRequest>> {
        self.store
            .query(
                &Query::new(Collection::FriendRequests)
                    .where_eq("senderId", session.uid())
                    .where_eq("status", FriendRequestStatus::Pending.as_str())
                    .order_by(Order::NewestFirst),
            )
            .await
    }
}

fn pending(sender_id: &str, recipient_id: &str) -> Query {
    Query::new(Collection::FriendRequests)
        .where_eq("senderId", sender_id)
        .where_eq("recipientId", recipient_id)
        .where_eq("status", FriendRequestStatus::Pending.as_str())
}

fn already_answered(status: FriendRequestStatus) -> Error {
    Error::Invalid(format!("Friend request was already {}", status))
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::{FriendRequestStatus, NotificationType};
    use crate::test_support::{setup_hub, sign_up};

    #[tokio::test]
    async fn test_send_and_accept() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let request = friends.send_request(&asha, ravi.uid()).await.unwrap();
        assert_eq!(request.status, FriendRequestStatus::Pending);
        assert_eq!(friends.incoming(&ravi).await.unwrap().len(), 1);
        assert_eq!(friends.outgoing(&asha).await.unwrap().len(), 1);

        let notes = ctx.hub.notifications.list(&ravi).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationType::FriendRequest);
        assert_eq!(notes[0].request_id.as_deref(), Some(request.id.as_str()));

        let accepted = friends.accept(&ravi, &request.id).await.unwrap();
        assert_eq!(accepted.status, FriendRequestStatus::Accepted);
        assert!(accepted.responded_at.is_some());

        let asha_profile = ctx.hub.users.get(asha.uid()).await.unwrap().unwrap();
        let ravi_profile = ctx.hub.users.get(ravi.uid()).await.unwrap().unwrap();
        assert!(asha_profile.is_friend(ravi.uid()));
        assert!(ravi_profile.is_friend(asha.uid()));

        assert_eq!(ctx.hub.notifications.unread_count(&ravi).await.unwrap(), 0);
        assert!(friends.incoming(&ravi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decline_keeps_users_apart() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let request = friends.send_request(&asha, ravi.uid()).await.unwrap();
        let declined = friends.decline(&ravi, &request.id).await.unwrap();
        assert_eq!(declined.status, FriendRequestStatus::Declined);

        let profile = ctx.hub.users.get(asha.uid()).await.unwrap().unwrap();
        assert!(profile.friends.is_empty());

        // A declined request can't be accepted afterwards
        let err = friends.accept(&ravi, &request.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let err = friends.send_request(&asha, asha.uid()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let err = friends.send_request(&asha, "nobody").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        friends.send_request(&asha, ravi.uid()).await.unwrap();
        let err = friends.send_request(&asha, ravi.uid()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        let err = friends.send_request(&ravi, asha.uid()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_opposite_requests_race_to_one() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let (a, b) = tokio::join!(
            friends.send_request(&asha, ravi.uid()),
            friends.send_request(&ravi, asha.uid())
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let err = a.err().or(b.err()).unwrap();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let pending = friends.outgoing(&asha).await.unwrap().len()
            + friends.outgoing(&ravi).await.unwrap().len();
        assert_eq!(pending, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_accept_survives_deleted_notification() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let request = friends.send_request(&asha, ravi.uid()).await.unwrap();
        let note = ctx.hub.notifications.list(&ravi).await.unwrap().remove(0);

        let (accepted, deleted) = tokio::join!(
            friends.accept(&ravi, &request.id),
            ctx.hub.notifications.delete(&ravi, &note.id)
        );
        assert_eq!(accepted.unwrap().status, FriendRequestStatus::Accepted);
        deleted.unwrap();

        let profile = ctx.hub.users.get(asha.uid()).await.unwrap().unwrap();
        assert!(profile.is_friend(ravi.uid()));
        assert!(ctx.hub.notifications.list(&ravi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_recipient_answers() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let request = friends.send_request(&asha, ravi.uid()).await.unwrap();
        let err = friends.accept(&asha, &request.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_apply_once() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let request = friends.send_request(&asha, ravi.uid()).await.unwrap();
        let (a, b) = tokio::join!(
            friends.accept(&ravi, &request.id),
            friends.decline(&ravi, &request.id)
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn test_unfriend() {
        let ctx = setup_hub().await;
        let asha = sign_up(&ctx.hub, "asha").await;
        let ravi = sign_up(&ctx.hub, "ravi").await;
        let friends = &ctx.hub.friends;

        let request = friends.send_request(&asha, ravi.uid()).await.unwrap();
        friends.accept(&ravi, &request.id).await.unwrap();
        assert_eq!(ctx.hub.users.friends(asha.uid()).await.unwrap().len(), 1);

        friends.unfriend(&asha, ravi.uid()).await.unwrap();
        assert!(ctx.hub.users.friends(asha.uid()).await.unwrap().is_empty());
        assert!(ctx.hub.users.friends(ravi.uid()).await.unwrap().is_empty());

        let err = friends.unfriend(&asha, ravi.uid()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
}
