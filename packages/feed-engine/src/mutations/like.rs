use alumni_api::{LikeResponse, PostId, Result as ApiResult};
use async_trait::async_trait;

use crate::mutation::{OptimisticMutation, Reconciliation};
use crate::store::{MutationKind, PostStore};
use crate::traits::BaseFeedApi;

/// Flip the current user's like on a post.
pub struct ToggleLike {
    id: PostId,
}

impl ToggleLike {
    pub fn new(id: PostId) -> Self {
        Self { id }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LikeSnapshot {
    pub was_liked: bool,
    pub like_count: u64,
}

#[async_trait]
impl OptimisticMutation for ToggleLike {
    type Snapshot = LikeSnapshot;
    type Response = LikeResponse;

    fn kind(&self) -> MutationKind {
        MutationKind::Like
    }

    fn post_id(&self) -> &PostId {
        &self.id
    }

    fn capture(&self, store: &PostStore) -> Option<LikeSnapshot> {
        store.get(&self.id).map(|post| LikeSnapshot {
            was_liked: post.liked_by_current_user,
            like_count: post.like_count,
        })
    }

    fn apply(&self, store: &mut PostStore, snapshot: &LikeSnapshot) {
        let delta = if snapshot.was_liked { -1 } else { 1 };
        store.apply_like_delta(&self.id, delta, !snapshot.was_liked);
    }

    async fn request(
        &self,
        api: &dyn BaseFeedApi,
        snapshot: &LikeSnapshot,
    ) -> ApiResult<LikeResponse> {
        api.set_like(&self.id, !snapshot.was_liked).await
    }

    fn reconcile(
        &self,
        store: &mut PostStore,
        _snapshot: &LikeSnapshot,
        response: LikeResponse,
    ) -> Reconciliation {
        let mut outcome = Reconciliation::AsPredicted;
        store.update(&self.id, |post| {
            if post.like_count != response.likes_count {
                post.like_count = response.likes_count;
                outcome = Reconciliation::Corrected;
            }
        });
        outcome
    }

    fn rollback(&self, store: &mut PostStore, snapshot: LikeSnapshot) {
        store.update(&self.id, |post| {
            post.like_count = snapshot.like_count;
            post.liked_by_current_user = snapshot.was_liked;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_api::{Post, PostStatus, PostType, UserId};
    use chrono::Utc;

    fn store_with(likes: u64, liked: bool) -> PostStore {
        let mut store = PostStore::new();
        store.upsert_many(vec![Post {
            id: PostId::new("1"),
            author_id: UserId::new("u"),
            author_name: None,
            author_company: None,
            university_id: None,
            post_type: PostType::Text,
            tag: None,
            content: "hello".into(),
            media: Vec::new(),
            like_count: likes,
            comment_count: 0,
            liked_by_current_user: liked,
            created_at: Utc::now(),
            job: None,
            status: PostStatus::Active,
            is_pinned: false,
        }]);
        store
    }

    #[test]
    fn test_apply_then_rollback_restores_exact_values() {
        let mut store = store_with(3, false);
        let like = ToggleLike::new(PostId::new("1"));

        let snapshot = like.capture(&store).unwrap();
        like.apply(&mut store, &snapshot);
        let post = store.get(&PostId::new("1")).unwrap();
        assert_eq!(post.like_count, 4);
        assert!(post.liked_by_current_user);

        like.rollback(&mut store, snapshot);
        let post = store.get(&PostId::new("1")).unwrap();
        assert_eq!(post.like_count, 3);
        assert!(!post.liked_by_current_user);
    }

    #[test]
    fn test_unlike_at_zero_stays_at_zero() {
        let mut store = store_with(0, true);
        let like = ToggleLike::new(PostId::new("1"));

        let snapshot = like.capture(&store).unwrap();
        like.apply(&mut store, &snapshot);

        let post = store.get(&PostId::new("1")).unwrap();
        assert_eq!(post.like_count, 0);
        assert!(!post.liked_by_current_user);
    }

    #[test]
    fn test_reconcile_takes_server_count() {
        let mut store = store_with(3, false);
        let like = ToggleLike::new(PostId::new("1"));
        let snapshot = like.capture(&store).unwrap();
        like.apply(&mut store, &snapshot);

        assert_eq!(
            like.reconcile(&mut store, &snapshot, LikeResponse { likes_count: 4 }),
            Reconciliation::AsPredicted
        );
        assert_eq!(
            like.reconcile(&mut store, &snapshot, LikeResponse { likes_count: 6 }),
            Reconciliation::Corrected
        );

        let post = store.get(&PostId::new("1")).unwrap();
        assert_eq!(post.like_count, 6);
        assert!(post.liked_by_current_user);
    }
}
