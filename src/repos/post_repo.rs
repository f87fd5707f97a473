use crate::blob::{BlobKind, BlobStore, Upload};
use crate::db::{Collection, DocumentStore, FieldOp, Order, Query, Write};
use crate::error::Result;
use crate::models::{Comment, NewPost, Notification, NotificationType, Post};
use crate::repos::{insert_after_upload, NotificationRepository};
use crate::session::Session;

/// Feed posts and their comments.
///
/// Likes and comment counters are kept consistent with their sources:
/// a like is a read-modify-write of the post, and a comment is inserted
/// in the same batch that bumps `commentCount`.
pub struct PostRepository {
    store: DocumentStore,
    blobs: BlobStore,
    notifications: NotificationRepository,
    page_size: i64,
}

impl PostRepository {
    pub fn new(store: DocumentStore, blobs: BlobStore, page_size: i64) -> Self {
        Self {
            notifications: NotificationRepository::new(store.clone(), page_size),
            store,
            blobs,
            page_size,
        }
    }

    /// Publishes a post, uploading `image` first when given.
    pub async fn create(
        &self,
        session: &Session,
        new: NewPost,
        image: Option<&Upload>,
    ) -> Result<Post> {
        let mut post = Post::new(session.uid(), session.display_name(), new.content)
            .with_category(new.category)
            .with_hide_likes(new.hide_likes);

        let blob = match image {
            Some(upload) => Some(self.blobs.upload_file(BlobKind::Post, upload).await?),
            None => None,
        };
        if let Some(url) = blob.as_ref().map(|b| b.url.clone()).or(new.image_url) {
            post = post.with_image_url(url);
        }

        insert_after_upload(&self.store, Collection::Posts, &post.id, &post, blob.as_ref()).await?;
        tracing::info!("Created post {} by {}", post.id, post.author_id);
        Ok(post)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Post>> {
        self.store.get(Collection::Posts, id).await
    }

    /// Newest posts first, optionally in one category.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Post>> {
        self.store
            .query(
                &Query::new(Collection::Posts)
                    .where_eq_ignore_case_opt("category", category)
                    .order_by(Order::NewestFirst)
                    .limit(self.page_size),
            )
            .await
    }

    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        self.store
            .query(
                &Query::new(Collection::Posts)
                    .where_eq("authorId", author_id)
                    .order_by(Order::NewestFirst)
                    .limit(self.page_size),
            )
            .await
    }

    /// Likes a post. Liking twice is a no-op.
    pub async fn like(&self, session: &Session, post_id: &str) -> Result<Post> {
        let (post, added) = self
            .store
            .modify(Collection::Posts, post_id, |post: &mut Post| {
                Ok(post.add_like(session.uid()))
            })
            .await?;

        if added && post.author_id != session.uid() {
            let notification = Notification::new(
                NotificationType::Like,
                &post.author_id,
                session.uid(),
                session.display_name(),
                format!("{} liked your post", session.display_name()),
            )
            .with_post_id(&post.id);
            self.notifications.notify(notification).await;
        }
        Ok(post)
    }

    /// Removes the caller's like. Unliking a post they never liked is a no-op.
    pub async fn unlike(&self, session: &Session, post_id: &str) -> Result<Post> {
        let (post, _) = self
            .store
            .modify(Collection::Posts, post_id, |post: &mut Post| {
                Ok(post.remove_like(session.uid()))
            })
            .await?;
        Ok(post)
    }

    /// Deletes a post and all of its comments. Only the author may delete.
    pub async fn delete(&self, session: &Session, post_id: &str) -> Result<()> {
        let post: Post = self.store.fetch(Collection::Posts, post_id).await?;
        session.require_owner(&post.author_id, "delete this post")?;

        self.store
            .batch(vec![
                Write::delete(Collection::Posts, post_id),
                Write::delete_where(Collection::Comments, "postId", post_id),
            ])
            .await?;

        tracing::info!("Deleted post {}", post_id);
        Ok(())
    }

    pub async fn add_comment(
        &self,
        session: &Session,
        post_id: &str,
        content: &str,
    ) -> Result<Comment> {
        let post: Post = self.store.fetch(Collection::Posts, post_id).await?;
        let comment = Comment::new(post_id, session.uid(), session.display_name(), content);

        self.store
            .batch(vec![
                Write::insert(Collection::Comments, &comment.id, &comment)?,
                Write::update(
                    Collection::Posts,
                    post_id,
                    vec![FieldOp::increment("commentCount", 1)],
                ),
            ])
            .await?;

        if post.author_id != session.uid() {
            let notification = Notification::new(
                NotificationType::Comment,
                &post.author_id,
                session.uid(),
                session.display_name(),
                format!("{} commented on your post", session.display_name()),
            )
            .with_post_id(post_id);
            self.notifications.notify(notification).await;
        }
        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.store
            .query(
                &Query::new(Collection::Comments)
                    .where_eq("postId", post_id)
                    .order_by(Order::OldestFirst),
            )
            .await
    }

    /// Deletes a comment. Only its author may delete it.
    pub async fn delete_comment(&self, session: &Session, comment_id: &str) -> Result<()> {
        let comment: Comment = self.store.fetch(Collection::Comments, comment_id).await?;
        session.require_owner(&comment.author_id, "delete this comment")?;

        self.store
            .batch(vec![
                Write::delete(Collection::Comments, comment_id),
                Write::update(
                    Collection::Posts,
                    &comment.post_id,
                    vec![FieldOp::increment("commentCount", -1)],
                ),
            ])
            .await
    }

    /// Recomputes `likeCount` and `commentCount` from `likes` and `comments`.
    pub async fn repair_counters(&self, post_id: &str) -> Result<Post> {
        let comments = Query::new(Collection::Comments).where_eq("postId", post_id);
        let (post, _) = self
            .store
            .modify_with_count(Collection::Posts, post_id, &comments, |post: &mut Post, n| {
                post.like_count = post.likes.len() as i64;
                post.comment_count = n;
                Ok(())
            })
            .await?;

        tracing::info!(
            "Repaired counters for post {}: {} like(s), {} comment(s)",
            post_id,
            post.like_count,
            post.comment_count
        );
        Ok(post)
    }
}
