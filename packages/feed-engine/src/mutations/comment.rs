use alumni_api::{CommentResponse, PostId, Result as ApiResult};
use async_trait::async_trait;

use crate::error::{FeedError, Result};
use crate::mutation::{OptimisticMutation, Reconciliation};
use crate::store::{MutationKind, PostStore};
use crate::traits::BaseFeedApi;

/// Add a comment, bumping the visible count ahead of the server.
pub struct AddComment {
    id: PostId,
    text: String,
}

impl AddComment {
    /// Rejects blank comments before anything touches the store.
    pub fn new(id: PostId, text: impl Into<String>) -> Result<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(FeedError::Validation("Comment cannot be empty.".into()));
        }
        Ok(Self { id, text })
    }
}

#[async_trait]
impl OptimisticMutation for AddComment {
    /// Previous comment count.
    type Snapshot = u64;
    type Response = CommentResponse;

    fn kind(&self) -> MutationKind {
        MutationKind::Comment
    }

    fn post_id(&self) -> &PostId {
        &self.id
    }

    fn capture(&self, store: &PostStore) -> Option<u64> {
        store.get(&self.id).map(|post| post.comment_count)
    }

    fn apply(&self, store: &mut PostStore, _previous: &u64) {
        store.apply_comment_delta(&self.id, 1);
    }

    async fn request(&self, api: &dyn BaseFeedApi, _previous: &u64) -> ApiResult<CommentResponse> {
        api.add_comment(&self.id, &self.text).await
    }

    fn reconcile(&self, store: &mut PostStore, _previous: &u64, response: CommentResponse) -> Reconciliation {
        let mut outcome = Reconciliation::AsPredicted;
        store.update(&self.id, |post| {
            if post.comment_count != response.comments_count {
                post.comment_count = response.comments_count;
                outcome = Reconciliation::Corrected;
            }
        });
        outcome
    }

    fn rollback(&self, store: &mut PostStore, previous: u64) {
        store.update(&self.id, |post| post.comment_count = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comment_is_rejected() {
        assert!(matches!(
            AddComment::new(PostId::new("1"), "   "),
            Err(FeedError::Validation(_))
        ));
        assert!(AddComment::new(PostId::new("1"), " congrats! ").is_ok());
    }
}
