use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

const MAX_TEXT_LEN: usize = 255;

fn validate_text(field: &str, value: &str) -> Result<(), PostError> {
    if value.trim().is_empty() {
        return Err(PostError::InvalidInput(format!("{field} is required")));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(PostError::InvalidInput(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

pub struct RealPostService {
    post_repo: Arc<dyn PostRepo>,
    comment_repo: Arc<dyn CommentRepo>,
    like_repo: Arc<dyn LikeRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealPostService {
    pub fn new(
        post_repo: Arc<dyn PostRepo>,
        comment_repo: Arc<dyn CommentRepo>,
        like_repo: Arc<dyn LikeRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            like_repo,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl PostService for RealPostService {
    async fn create_post(
        &self,
        author: UserId,
        title: &str,
        content: &str,
    ) -> Result<PostId, PostError> {
        validate_text("title", title)?;
        validate_text("content", content)?;

        let post = self.post_repo.insert(author, title, content).await?;

        debug!(post_id = post.post_id.0, %author, "post created");
        Ok(post.post_id)
    }

    async fn list_posts(&self, author: UserId) -> Result<Vec<Post>, PostError> {
        self.post_repo.list_by_author(author).await
    }

    async fn add_comment(
        &self,
        author: UserId,
        post_id: PostId,
        content: &str,
    ) -> Result<CommentId, PostError> {
        validate_text("content", content)?;

        if self.post_repo.get(post_id).await?.is_none() {
            return Err(PostError::PostNotFound);
        }

        let comment = self.comment_repo.insert(post_id, author, content).await?;
        Ok(comment.comment_id)
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, PostError> {
        self.comment_repo.list_by_post(post_id).await
    }

    async fn delete_comment(
        &self,
        acting: UserId,
        comment_id: CommentId,
    ) -> Result<(), PostError> {
        let comment = self
            .comment_repo
            .get(comment_id)
            .await?
            .ok_or(PostError::CommentNotFound)?;

        if comment.author != acting {
            warn!(%acting, comment_id = comment_id.0, "refused to delete another user's comment");
            return Err(PostError::Forbidden);
        }

        if !self.comment_repo.delete(comment_id).await? {
            return Err(PostError::CommentNotFound);
        }
        Ok(())
    }

    async fn toggle_like(&self, user_id: UserId, post_id: PostId) -> Result<LikeToggle, PostError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| PostError::Store(e.to_string()))?;

        if !self.post_repo.exists_in_tx(tx.as_mut(), post_id).await? {
            return Err(PostError::PostNotFound);
        }

        let toggle = if self
            .like_repo
            .exists_in_tx(tx.as_mut(), post_id, user_id)
            .await?
        {
            self.like_repo
                .delete_in_tx(tx.as_mut(), post_id, user_id)
                .await?;
            LikeToggle::Unliked
        } else {
            self.like_repo
                .insert_in_tx(tx.as_mut(), post_id, user_id)
                .await?;
            LikeToggle::Liked
        };

        tx.commit()
            .await
            .map_err(|e| PostError::Store(e.to_string()))?;

        Ok(toggle)
    }

    async fn like_count(&self, post_id: PostId) -> Result<i64, PostError> {
        self.like_repo.count(post_id).await
    }

    async fn has_liked(&self, user_id: UserId, post_id: PostId) -> Result<bool, PostError> {
        self.like_repo.exists(post_id, user_id).await
    }
}
