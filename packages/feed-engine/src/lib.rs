//! # Feed Engine
//!
//! Client-held state for the alumni portal feed: a paginated, filterable,
//! continuously appended collection of posts, kept consistent with the server
//! despite out-of-order responses, repeated taps and background refresh.
//!
//! ## Data flow
//!
//! ```text
//! search input ─► SearchDebouncer ─┐
//! scroll sentinel ─────────────────┤
//! refresh timer ───────────────────┤
//!                                  ▼
//!                           FeedController ─► fetch_page ─► BaseFeedApi
//!                                  │                            │
//!                                  ▼                            │
//!                              PostStore ◄──── merge ───────────┘
//!                                  │
//!                                  ▼
//!                     interleave(posts, ads) ─► FeedSnapshot (watch)
//!
//! like / pin / hide / comment / edit / delete
//!     ─► OptimisticMutator ─► PostStore (now) ─► BaseFeedApi ─► reconcile or roll back
//! ```
//!
//! ## Key invariants
//!
//! 1. **Post ids are unique** in the store, and local mutations never reorder it
//! 2. **Stale pages are dropped**: a fetch completing for a superseded query
//!    generation changes nothing
//! 3. **One load at a time**: next-page and refresh share one `is_loading` flag;
//!    refresh also requires the cursor to be on page 1
//! 4. **One mutation per (post, kind)**: a repeat is rejected, not queued
//! 5. **Failures never clear content**: a failed fetch keeps loaded pages, a
//!    failed mutation restores the exact pre-action values
//! 6. **Counters never go negative**
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use feed_engine::{CurrentUser, FeedConfig, FeedContext, FeedController, FilterCriteria};
//!
//! let config = FeedConfig::from_env()?;
//! let api = Arc::new(config.api_client()?);
//! let feed = FeedController::new(api, FeedContext::public(CurrentUser::alumnus("42")), config.settings);
//!
//! feed.start().await;
//! feed.load_first_page(FilterCriteria::all()).await?;
//! let mut snapshots = feed.subscribe();
//! ```

pub mod ads;
pub mod capabilities;
pub mod config;
pub mod context;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod mutation;
pub mod mutations;
pub mod snapshot;
pub mod store;
pub mod traits;

pub use ads::{fallback_ads, interleave, FeedItem, DEFAULT_AD_EVERY};
pub use capabilities::{allowed_actions, PostAction, PostActions};
pub use config::{FeedConfig, FeedSettings};
pub use context::{CurrentUser, FeedContext, FeedSource, Role};
pub use controller::{FeedController, LoadOutcome};
pub use debounce::{SearchDebouncer, DEFAULT_SEARCH_DEBOUNCE};
pub use error::{FeedError, Result};
pub use fetcher::{fetch_page, FeedPage};
pub use filter::{matches, FilterCriteria};
pub use mutation::{MutationPhase, OptimisticMutation, OptimisticMutator, Reconciliation};
pub use snapshot::{FeedEvent, FeedSnapshot, FetchErrorState, FetchKind, Notice};
pub use store::{MutationKind, PostStore};
pub use traits::BaseFeedApi;

pub use alumni_api;
