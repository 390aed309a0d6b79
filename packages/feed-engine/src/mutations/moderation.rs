//! Moderator actions: pin, hide, restore.
//!
//! The server answers each with a partial post. Whatever it reports wins over
//! the local prediction.

use alumni_api::{ModerationFragment, PostId, PostStatus, Result as ApiResult};
use async_trait::async_trait;

use crate::mutation::{OptimisticMutation, Reconciliation};
use crate::store::{MutationKind, PostStore};
use crate::traits::BaseFeedApi;

/// Flip a post's pinned flag.
pub struct TogglePin {
    id: PostId,
}

impl TogglePin {
    pub fn new(id: PostId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl OptimisticMutation for TogglePin {
    /// Previous pinned flag.
    type Snapshot = bool;
    type Response = ModerationFragment;

    fn kind(&self) -> MutationKind {
        MutationKind::Pin
    }

    fn post_id(&self) -> &PostId {
        &self.id
    }

    fn capture(&self, store: &PostStore) -> Option<bool> {
        store.get(&self.id).map(|post| post.is_pinned)
    }

    fn apply(&self, store: &mut PostStore, was_pinned: &bool) {
        let pinned = !*was_pinned;
        store.update(&self.id, |post| post.is_pinned = pinned);
    }

    async fn request(&self, api: &dyn BaseFeedApi, was_pinned: &bool) -> ApiResult<ModerationFragment> {
        api.pin_post(&self.id, !*was_pinned).await
    }

    fn reconcile(
        &self,
        store: &mut PostStore,
        _was_pinned: &bool,
        fragment: ModerationFragment,
    ) -> Reconciliation {
        reconcile_fragment(store, &self.id, fragment)
    }

    fn rollback(&self, store: &mut PostStore, was_pinned: bool) {
        store.update(&self.id, |post| post.is_pinned = was_pinned);
    }
}

/// Which status transition a [`SetStatus`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusChange {
    Hide,
    Restore,
}

/// Hide a post from the public feed, or restore a hidden one.
pub struct SetStatus {
    id: PostId,
    change: StatusChange,
}

impl SetStatus {
    pub fn hide(id: PostId) -> Self {
        Self {
            id,
            change: StatusChange::Hide,
        }
    }

    pub fn restore(id: PostId) -> Self {
        Self {
            id,
            change: StatusChange::Restore,
        }
    }

    fn target(&self) -> PostStatus {
        match self.change {
            StatusChange::Hide => PostStatus::Hidden,
            StatusChange::Restore => PostStatus::Active,
        }
    }
}

#[async_trait]
impl OptimisticMutation for SetStatus {
    /// Previous status.
    type Snapshot = PostStatus;
    type Response = ModerationFragment;

    fn kind(&self) -> MutationKind {
        MutationKind::Status
    }

    fn post_id(&self) -> &PostId {
        &self.id
    }

    fn capture(&self, store: &PostStore) -> Option<PostStatus> {
        store.get(&self.id).map(|post| post.status)
    }

    fn apply(&self, store: &mut PostStore, _previous: &PostStatus) {
        let status = self.target();
        store.update(&self.id, |post| post.status = status);
    }

    async fn request(&self, api: &dyn BaseFeedApi, _previous: &PostStatus) -> ApiResult<ModerationFragment> {
        match self.change {
            StatusChange::Hide => api.hide_post(&self.id).await,
            StatusChange::Restore => api.restore_post(&self.id).await,
        }
    }

    fn reconcile(
        &self,
        store: &mut PostStore,
        _previous: &PostStatus,
        fragment: ModerationFragment,
    ) -> Reconciliation {
        reconcile_fragment(store, &self.id, fragment)
    }

    fn rollback(&self, store: &mut PostStore, previous: PostStatus) {
        store.update(&self.id, |post| post.status = previous);
    }
}

fn reconcile_fragment(store: &mut PostStore, id: &PostId, fragment: ModerationFragment) -> Reconciliation {
    let mut outcome = Reconciliation::AsPredicted;
    store.update(id, |post| {
        if let Some(pinned) = fragment.is_pinned {
            if post.is_pinned != pinned {
                post.is_pinned = pinned;
                outcome = Reconciliation::Corrected;
            }
        }
        if let Some(status) = fragment.status {
            if post.status != status {
                post.status = status;
                outcome = Reconciliation::Corrected;
            }
        }
    });
    outcome
}
