//! Immutable views of feed state handed to presentation.

use alumni_api::{Post, PostId};
use serde::{Deserialize, Serialize};

use crate::ads::FeedItem;
use crate::filter::FilterCriteria;
use crate::mutation::MutationPhase;
use crate::store::MutationKind;

/// Which fetch a load error belongs to, and so what `retry` repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    FirstPage,
    NextPage,
}

/// A failed fetch. Already loaded posts stay visible alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchErrorState {
    pub kind: FetchKind,
    pub message: String,
    pub retryable: bool,
}

/// A dismissible user-facing message, e.g. a rolled-back like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Loaded posts passing the active criteria, in display order.
    pub posts: Vec<Post>,
    /// `posts` with sponsored content interleaved.
    pub items: Vec<FeedItem>,
    pub criteria: FilterCriteria,
    /// Last successfully loaded page.
    pub cursor: u32,
    pub has_more: bool,
    pub is_loading: bool,
    pub total: u64,
    pub error: Option<FetchErrorState>,
    pub notices: Vec<Notice>,
    pub generation: u64,
}

impl FeedSnapshot {
    /// Nothing to show and nothing coming: render the empty state.
    pub fn is_empty_result(&self) -> bool {
        self.posts.is_empty() && !self.is_loading && self.error.is_none()
    }

    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }
}

/// Things that happened, for consumers that react rather than render.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    PageLoaded {
        page: u32,
        added: usize,
        has_more: bool,
    },
    StaleDiscarded {
        generation: u64,
    },
    FetchFailed {
        kind: FetchKind,
        retryable: bool,
    },
    Mutation {
        id: PostId,
        kind: MutationKind,
        phase: MutationPhase,
    },
    PostCreated {
        id: PostId,
    },
    AdsLoaded {
        count: usize,
        fallback: bool,
    },
}
