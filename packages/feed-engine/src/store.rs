//! Ordered, id-unique post collection with per-post mutation locks.
//!
//! The store is the only owner of post state. Order is whatever the server
//! returned (recency for the feed, pinned-first for moderation) and local
//! mutations never reorder it.
//!
//! # Merge rule
//!
//! While a mutation is in flight for a post, the fields that mutation owns keep
//! their local value when a fetched copy of the same post is merged in. The
//! mutation's own reconcile step is what eventually writes the server's value.
//! A post with a delete in flight is not resurrected by a merge.

use std::collections::HashSet;
use std::fmt;

use alumni_api::{Post, PostId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of optimistic mutation, the second half of a lock key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Like,
    Pin,
    /// Hide and restore. Both write `status`, so they share one lock.
    Status,
    Comment,
    Edit,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Like => "like",
            MutationKind::Pin => "pin",
            MutationKind::Status => "status",
            MutationKind::Comment => "comment",
            MutationKind::Edit => "edit",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct PostStore {
    posts: IndexMap<PostId, Post>,
    locks: HashSet<(PostId, MutationKind)>,
}

impl PostStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.posts.contains_key(id)
    }

    pub fn position(&self, id: &PostId) -> Option<usize> {
        self.posts.get_index_of(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.posts.keys().cloned().collect()
    }

    /// Owned copy of the collection in display order.
    pub fn snapshot(&self) -> Vec<Post> {
        self.posts.values().cloned().collect()
    }

    // =========================================================================
    // Merges
    // =========================================================================

    /// Merge fetched posts by id. Existing posts are updated in place, new ones
    /// are appended in the given order. Returns how many posts were new.
    pub fn upsert_many(&mut self, incoming: impl IntoIterator<Item = Post>) -> usize {
        let mut added = 0;
        for post in incoming {
            if self.is_locked(&post.id, MutationKind::Delete) {
                continue;
            }
            match self.posts.get_mut(&post.id) {
                Some(existing) => {
                    let merged = merge_preserving(existing, post, &self.locks);
                    *existing = merged;
                }
                None => {
                    self.posts.insert(post.id.clone(), post);
                    added += 1;
                }
            }
        }
        added
    }

    /// Replace the whole collection with a fresh first page, applying the
    /// same preservation rule as [`upsert_many`](Self::upsert_many).
    pub fn replace_all(&mut self, incoming: impl IntoIterator<Item = Post>) {
        let mut next = IndexMap::new();
        for post in incoming {
            if self.is_locked(&post.id, MutationKind::Delete) || next.contains_key(&post.id) {
                continue;
            }
            let post = match self.posts.get(&post.id) {
                Some(existing) => merge_preserving(existing, post, &self.locks),
                None => post,
            };
            next.insert(post.id.clone(), post);
        }
        self.posts = next;
    }

    /// Drop every post. Locks are kept so in-flight mutations still settle.
    pub fn clear(&mut self) {
        self.posts.clear();
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    /// Adjust the like count (clamped at zero) and set the liked flag.
    pub fn apply_like_delta(&mut self, id: &PostId, delta: i64, liked: bool) -> bool {
        self.update(id, |post| {
            post.like_count = post.like_count.saturating_add_signed(delta);
            post.liked_by_current_user = liked;
        })
    }

    /// Adjust the comment count, clamped at zero.
    pub fn apply_comment_delta(&mut self, id: &PostId, delta: i64) -> bool {
        self.update(id, |post| {
            post.comment_count = post.comment_count.saturating_add_signed(delta);
        })
    }

    /// Apply `f` to the post in place.
    pub fn update(&mut self, id: &PostId, f: impl FnOnce(&mut Post)) -> bool {
        match self.posts.get_mut(id) {
            Some(post) => {
                f(post);
                true
            }
            None => false,
        }
    }

    /// Swap in a new version of a post at the same position. The id must not
    /// change: a post is never recreated under a new id.
    pub fn replace(&mut self, id: &PostId, post: Post) -> bool {
        if post.id != *id {
            return false;
        }
        match self.posts.get_mut(id) {
            Some(existing) => {
                *existing = post;
                true
            }
            None => false,
        }
    }

    /// Remove a post, returning its former position and value.
    pub fn remove(&mut self, id: &PostId) -> Option<(usize, Post)> {
        self.posts
            .shift_remove_full(id)
            .map(|(index, _, post)| (index, post))
    }

    /// Insert a post at `index` (clamped to the end). Used to roll back a delete.
    pub fn insert_at(&mut self, index: usize, post: Post) {
        if self.posts.contains_key(&post.id) {
            return;
        }
        let index = index.min(self.posts.len());
        self.posts.shift_insert(index, post.id.clone(), post);
    }

    /// Put a newly created post at the top of the feed.
    pub fn prepend(&mut self, post: Post) {
        match self.posts.get_index_of(&post.id) {
            Some(_) => {
                let id = post.id.clone();
                self.replace(&id, post);
            }
            None => self.insert_at(0, post),
        }
    }

    // =========================================================================
    // Mutation locks
    // =========================================================================

    /// Take the lock for `(id, kind)`. Returns false if it is already held.
    pub fn try_lock(&mut self, id: &PostId, kind: MutationKind) -> bool {
        self.locks.insert((id.clone(), kind))
    }

    pub fn unlock(&mut self, id: &PostId, kind: MutationKind) {
        self.locks.remove(&(id.clone(), kind));
    }

    pub fn is_locked(&self, id: &PostId, kind: MutationKind) -> bool {
        self.locks.contains(&(id.clone(), kind))
    }

    /// Number of mutations currently in flight.
    pub fn locks_held(&self) -> usize {
        self.locks.len()
    }
}

/// Take the server's copy, except for fields owned by an in-flight mutation.
fn merge_preserving(local: &Post, mut incoming: Post, locks: &HashSet<(PostId, MutationKind)>) -> Post {
    let held = |kind| locks.contains(&(local.id.clone(), kind));

    if held(MutationKind::Like) {
        incoming.like_count = local.like_count;
        incoming.liked_by_current_user = local.liked_by_current_user;
    }
    if held(MutationKind::Comment) {
        incoming.comment_count = local.comment_count;
    }
    if held(MutationKind::Pin) {
        incoming.is_pinned = local.is_pinned;
    }
    if held(MutationKind::Status) {
        incoming.status = local.status;
    }
    if held(MutationKind::Edit) {
        incoming.post_type = local.post_type;
        incoming.tag = local.tag;
        incoming.content = local.content.clone();
        incoming.media = local.media.clone();
        incoming.job = local.job.clone();
    }
    incoming
}
