//! Authoring: draft validation, edit and delete.

use alumni_api::{Post, PostDraft, PostId, PostType, Result as ApiResult};
use async_trait::async_trait;

use crate::error::{FeedError, Result};
use crate::mutation::{OptimisticMutation, Reconciliation};
use crate::store::{MutationKind, PostStore};
use crate::traits::BaseFeedApi;

/// Reject drafts the server would refuse, before any request is made.
pub fn validate_draft(draft: &PostDraft) -> Result<()> {
    if draft.content.trim().is_empty() && draft.media.is_empty() {
        return Err(FeedError::Validation(
            "Write something or attach media before posting.".into(),
        ));
    }

    match (&draft.post_type, &draft.job) {
        (PostType::Job, None) => Err(FeedError::Validation(
            "Job posts need a title and a company.".into(),
        )),
        (PostType::Job, Some(job)) if job.title.trim().is_empty() || job.company.trim().is_empty() => {
            Err(FeedError::Validation("Job posts need a title and a company.".into()))
        }
        (post_type, Some(_)) if *post_type != PostType::Job => Err(FeedError::Validation(
            "Only job posts can carry job details.".into(),
        )),
        _ => Ok(()),
    }
}

/// Replace a post's authored fields.
pub struct EditPost {
    id: PostId,
    draft: PostDraft,
}

impl EditPost {
    pub fn new(id: PostId, draft: PostDraft) -> Result<Self> {
        validate_draft(&draft)?;
        Ok(Self { id, draft })
    }
}

fn copy_authored(target: &mut Post, source: &Post) {
    target.post_type = source.post_type;
    target.tag = source.tag;
    target.content = source.content.clone();
    target.media = source.media.clone();
    target.job = source.job.clone();
}

fn same_authored(a: &Post, b: &Post) -> bool {
    a.post_type == b.post_type
        && a.tag == b.tag
        && a.content == b.content
        && a.media == b.media
        && a.job == b.job
}

#[async_trait]
impl OptimisticMutation for EditPost {
    /// The post as it was before the edit.
    type Snapshot = Post;
    type Response = Post;

    fn kind(&self) -> MutationKind {
        MutationKind::Edit
    }

    fn post_id(&self) -> &PostId {
        &self.id
    }

    fn capture(&self, store: &PostStore) -> Option<Post> {
        store.get(&self.id).cloned()
    }

    fn apply(&self, store: &mut PostStore, _previous: &Post) {
        let draft = &self.draft;
        store.update(&self.id, |post| {
            post.post_type = draft.post_type;
            post.tag = draft.tag;
            post.content = draft.content.clone();
            post.media = draft.media.clone();
            post.job = draft.job.clone();
        });
    }

    async fn request(&self, api: &dyn BaseFeedApi, _previous: &Post) -> ApiResult<Post> {
        api.update_post(&self.id, &self.draft).await
    }

    fn reconcile(&self, store: &mut PostStore, _previous: &Post, updated: Post) -> Reconciliation {
        // Deleted while the edit was in flight
        if !store.contains(&self.id) || updated.id != self.id {
            return Reconciliation::AsPredicted;
        }
        let corrected = store
            .get(&self.id)
            .map_or(false, |predicted| !same_authored(predicted, &updated));
        store.upsert_many(vec![updated]);
        if corrected {
            Reconciliation::Corrected
        } else {
            Reconciliation::AsPredicted
        }
    }

    fn rollback(&self, store: &mut PostStore, previous: Post) {
        store.update(&self.id, |post| copy_authored(post, &previous));
    }
}

/// Remove a post, restoring it at its old position if the server refuses.
pub struct DeletePost {
    id: PostId,
}

impl DeletePost {
    pub fn new(id: PostId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl OptimisticMutation for DeletePost {
    /// Former position and value.
    type Snapshot = (usize, Post);
    type Response = ();

    fn kind(&self) -> MutationKind {
        MutationKind::Delete
    }

    fn post_id(&self) -> &PostId {
        &self.id
    }

    fn capture(&self, store: &PostStore) -> Option<(usize, Post)> {
        let index = store.position(&self.id)?;
        store.get(&self.id).map(|post| (index, post.clone()))
    }

    fn apply(&self, store: &mut PostStore, _snapshot: &(usize, Post)) {
        store.remove(&self.id);
    }

    async fn request(&self, api: &dyn BaseFeedApi, _snapshot: &(usize, Post)) -> ApiResult<()> {
        api.delete_post(&self.id).await
    }

    fn reconcile(&self, _store: &mut PostStore, _snapshot: &(usize, Post), _response: ()) -> Reconciliation {
        Reconciliation::AsPredicted
    }

    fn rollback(&self, store: &mut PostStore, (index, post): (usize, Post)) {
        store.insert_at(index, post);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_api::{JobDetails, MediaKind, MediaRef, PostStatus, PostTag, UserId};
    use chrono::Utc;

    fn job(title: &str, company: &str) -> JobDetails {
        JobDetails {
            title: title.into(),
            company: company.into(),
            location: None,
        }
    }

    fn post(id: &str) -> Post {
        Post {
            id: PostId::new(id),
            author_id: UserId::new("me"),
            author_name: None,
            author_company: None,
            university_id: None,
            post_type: PostType::Text,
            tag: None,
            content: format!("post {}", id),
            media: Vec::new(),
            like_count: 2,
            comment_count: 1,
            liked_by_current_user: false,
            created_at: Utc::now(),
            job: None,
            status: PostStatus::Active,
            is_pinned: false,
        }
    }

    #[test]
    fn test_validate_draft() {
        assert!(validate_draft(&PostDraft::text("hello")).is_ok());
        assert!(validate_draft(&PostDraft::text("  ")).is_err());
        assert!(validate_draft(&PostDraft::text("").with_media(MediaRef {
            url: "https://cdn.example.com/a.png".into(),
            kind: MediaKind::Image,
        }))
        .is_ok());

        assert!(validate_draft(&PostDraft::text("Hiring").with_job(job("Engineer", "Acme"))).is_ok());
        assert!(validate_draft(&PostDraft::text("Hiring").with_job(job("", "Acme"))).is_err());

        let mut job_less = PostDraft::text("Hiring");
        job_less.post_type = PostType::Job;
        assert!(validate_draft(&job_less).is_err());

        let mut mismatched = PostDraft::text("Hiring").with_job(job("Engineer", "Acme"));
        mismatched.post_type = PostType::Text;
        assert!(validate_draft(&mismatched).is_err());
    }

    #[test]
    fn test_edit_rollback_keeps_counters() {
        let mut store = PostStore::new();
        store.upsert_many(vec![post("1")]);
        let edit = EditPost::new(PostId::new("1"), PostDraft::text("rewritten")).unwrap();

        let previous = edit.capture(&store).unwrap();
        edit.apply(&mut store, &previous);
        assert_eq!(store.get(&PostId::new("1")).unwrap().content, "rewritten");

        // A like lands while the edit is pending
        store.apply_like_delta(&PostId::new("1"), 1, true);
        edit.rollback(&mut store, previous);

        let post = store.get(&PostId::new("1")).unwrap();
        assert_eq!(post.content, "post 1");
        assert_eq!(post.like_count, 3);
    }

    #[test]
    fn test_edit_reconciles_server_changes() {
        let mut store = PostStore::new();
        store.upsert_many(vec![post("1")]);
        let edit = EditPost::new(PostId::new("1"), PostDraft::text("rewritten")).unwrap();
        let previous = edit.capture(&store).unwrap();
        edit.apply(&mut store, &previous);

        let mut echoed = post("1");
        echoed.content = "rewritten".into();
        assert_eq!(
            edit.reconcile(&mut store, &previous, echoed.clone()),
            Reconciliation::AsPredicted
        );

        // Same text, but the server attached a tag of its own
        let mut tagged = echoed;
        tagged.tag = Some(PostTag::Achievement);
        tagged.like_count = 9;
        assert_eq!(
            edit.reconcile(&mut store, &previous, tagged),
            Reconciliation::Corrected
        );
        let post = store.get(&PostId::new("1")).unwrap();
        assert_eq!(post.content, "rewritten");
        assert_eq!(post.tag, Some(PostTag::Achievement));
        assert_eq!(post.like_count, 9);
    }

    #[test]
    fn test_delete_rollback_restores_position() {
        let mut store = PostStore::new();
        store.upsert_many(vec![post("1"), post("2"), post("3")]);
        let delete = DeletePost::new(PostId::new("2"));

        let snapshot = delete.capture(&store).unwrap();
        delete.apply(&mut store, &snapshot);
        assert!(!store.contains(&PostId::new("2")));

        delete.rollback(&mut store, snapshot);
        assert_eq!(store.position(&PostId::new("2")), Some(1));
    }
}
