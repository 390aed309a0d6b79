//! The feed controller: the one externally visible entry point.
//!
//! `FeedController` owns the store, the paging state, the ads, the search
//! debouncer and the background tasks for one feed view. It is cheap to clone
//! and every clone drives the same feed.
//!
//! # Paging
//!
//! A single `is_loading` flag makes page loads mutually exclusive. Every fetch
//! carries the generation it was started under; a first-page load bumps the
//! generation, so any completion that arrives for an older one is dropped.
//! The cursor only moves when a page actually lands, and a failed fetch
//! leaves the loaded posts untouched. When a first page for new criteria
//! fails, paging is parked on page 1 until a first page succeeds.
//!
//! # Lock order
//!
//! `state` before `store` before `ads`. The mutator only ever takes `store`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use alumni_api::{Ad, Post, PostDraft, PostId, PostStatus};
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::ads::{self, interleave};
use crate::capabilities::{allowed_actions, PostAction, PostActions};
use crate::config::FeedSettings;
use crate::context::{FeedContext, FeedSource};
use crate::debounce::SearchDebouncer;
use crate::error::{FeedError, Result};
use crate::fetcher::{fetch_page, FeedPage};
use crate::filter::FilterCriteria;
use crate::mutation::{MutationPhase, OptimisticMutation, OptimisticMutator, Reconciliation};
use crate::mutations::{validate_draft, AddComment, DeletePost, EditPost, SetStatus, ToggleLike, TogglePin};
use crate::snapshot::{FeedEvent, FeedSnapshot, FetchErrorState, FetchKind, Notice};
use crate::store::{MutationKind, PostStore};
use crate::traits::BaseFeedApi;

const EVENT_CAPACITY: usize = 64;

/// Result of a page load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { page: u32, added: usize },
    /// Nothing was fetched: a load was already running, there were no more
    /// pages, or a refresh would have raced pagination.
    Skipped,
}

#[derive(Debug)]
struct FeedState {
    criteria: FilterCriteria,
    /// Criteria the loaded pages belong to.
    loaded_criteria: FilterCriteria,
    generation: u64,
    cursor: u32,
    is_loading: bool,
    has_more: bool,
    total: u64,
    error: Option<FetchErrorState>,
    notices: Vec<Notice>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::all(),
            loaded_criteria: FilterCriteria::all(),
            generation: 0,
            cursor: 1,
            is_loading: false,
            has_more: false,
            total: 0,
            error: None,
            notices: Vec::new(),
        }
    }
}

struct Inner {
    api: Arc<dyn BaseFeedApi>,
    context: FeedContext,
    settings: FeedSettings,
    store: Arc<RwLock<PostStore>>,
    state: RwLock<FeedState>,
    ads: RwLock<Vec<Ad>>,
    alive: Arc<AtomicBool>,
    mutator: OptimisticMutator,
    snapshots: watch::Sender<Arc<FeedSnapshot>>,
    events: broadcast::Sender<FeedEvent>,
    debouncer: Mutex<SearchDebouncer>,
    search_commits: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    next_notice_id: AtomicU64,
}

#[derive(Clone)]
pub struct FeedController {
    inner: Arc<Inner>,
}

impl FeedController {
    pub fn new(api: Arc<dyn BaseFeedApi>, context: FeedContext, settings: FeedSettings) -> Self {
        let store = Arc::new(RwLock::new(PostStore::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let mutator = OptimisticMutator::new(store.clone(), api.clone(), alive.clone());
        let (debouncer, search_commits) = SearchDebouncer::new(settings.search_debounce);
        let (snapshots, _) = watch::channel(Arc::new(FeedSnapshot::default()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                api,
                context,
                settings,
                store,
                state: RwLock::new(FeedState::default()),
                ads: RwLock::new(Vec::new()),
                alive,
                mutator,
                snapshots,
                events,
                debouncer: Mutex::new(debouncer),
                search_commits: Mutex::new(Some(search_commits)),
                tasks: Mutex::new(Vec::new()),
                next_notice_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn context(&self) -> &FeedContext {
        &self.inner.context
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.inner.settings
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn the periodic refresh and the search commit listener.
    ///
    /// Both tasks hold only a weak reference to the feed and stop once every
    /// controller clone is dropped. Calling `start` twice is a no-op.
    pub async fn start(&self) {
        let mut tasks = self.inner.tasks.lock().await;
        if !tasks.is_empty() || !self.is_alive() {
            return;
        }

        let refresh_interval = self.inner.settings.refresh_interval;
        if !refresh_interval.is_zero() {
            let weak = Arc::downgrade(&self.inner);
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(refresh_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let Some(controller) = Self::upgrade(&weak) else {
                        break;
                    };
                    if let Err(e) = controller.refresh_if_idle().await {
                        if e.is_user_visible() {
                            warn!(error = %e, "Background refresh failed");
                        }
                    }
                }
            }));
        }

        if let Some(mut commits) = self.inner.search_commits.lock().await.take() {
            let weak = Arc::downgrade(&self.inner);
            tasks.push(tokio::spawn(async move {
                while let Some(search) = commits.recv().await {
                    let Some(controller) = Self::upgrade(&weak) else {
                        break;
                    };
                    // A newer commit must be able to supersede this one mid-flight
                    tokio::spawn(async move {
                        if let Err(e) = controller.commit_search(search).await {
                            debug!(error = %e, "Search commit did not load");
                        }
                    });
                }
            }));
        }

        info!(
            refresh_secs = refresh_interval.as_secs(),
            page_size = self.inner.settings.page_size,
            "Feed started"
        );
    }

    /// Tear the feed down. Timers and the pending search commit are released;
    /// requests already in flight may finish but their results are ignored.
    pub async fn shutdown(&self) {
        if !self.inner.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        for task in self.inner.tasks.lock().await.drain(..) {
            task.abort();
        }
        self.inner.debouncer.lock().await.cancel();
        info!("Feed shut down");
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade()
            .map(|inner| Self { inner })
            .filter(|controller| controller.is_alive())
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(FeedError::ShutDown)
        }
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Start over on page 1 of `criteria`. Supersedes any fetch in flight.
    pub async fn load_first_page(&self, criteria: FilterCriteria) -> Result<LoadOutcome> {
        self.ensure_alive()?;
        let criteria = criteria.first_page();
        let generation = {
            let mut state = self.inner.state.write().await;
            state.generation += 1;
            state.criteria = criteria.clone();
            state.is_loading = true;
            state.error = None;
            state.generation
        };
        self.publish().await;

        debug!(generation, search = criteria.search(), "Loading first page");
        let result = self.fetch(&criteria).await;
        self.complete_fetch(generation, FetchKind::FirstPage, result).await
    }

    /// Append the page after the cursor. Skipped while a load is running or
    /// once the last page has been seen.
    pub async fn load_next_page(&self) -> Result<LoadOutcome> {
        self.ensure_alive()?;
        let (generation, criteria) = {
            let mut state = self.inner.state.write().await;
            if state.is_loading || !state.has_more {
                debug!(
                    is_loading = state.is_loading,
                    has_more = state.has_more,
                    "Skipping next page"
                );
                return Ok(LoadOutcome::Skipped);
            }
            state.is_loading = true;
            state.error = None;
            (state.generation, state.criteria.clone().at_page(state.cursor + 1))
        };
        self.publish().await;

        debug!(generation, page = criteria.page(), "Loading next page");
        let result = self.fetch(&criteria).await;
        self.complete_fetch(generation, FetchKind::NextPage, result).await
    }

    /// Reload page 1 of the active criteria, but only when nothing is loading
    /// and the user has not paged past the first page.
    pub async fn refresh_if_idle(&self) -> Result<LoadOutcome> {
        self.ensure_alive()?;
        let (generation, criteria) = {
            let mut state = self.inner.state.write().await;
            if state.is_loading || state.cursor != 1 {
                debug!(
                    is_loading = state.is_loading,
                    cursor = state.cursor,
                    "Skipping refresh"
                );
                return Ok(LoadOutcome::Skipped);
            }
            state.generation += 1;
            state.is_loading = true;
            (state.generation, state.criteria.clone().first_page())
        };
        self.publish().await;

        debug!(generation, "Refreshing first page");
        let result = self.fetch(&criteria).await;
        self.complete_fetch(generation, FetchKind::FirstPage, result).await
    }

    /// The end-of-list sentinel came into view. Edge-triggered: repeated
    /// signals while a page is loading do nothing.
    pub async fn scroll_sentinel_reached(&self) -> Result<LoadOutcome> {
        self.load_next_page().await
    }

    /// Repeat whatever fetch last failed.
    pub async fn retry(&self) -> Result<LoadOutcome> {
        let (failed, criteria) = {
            let state = self.inner.state.read().await;
            (state.error.as_ref().map(|e| e.kind), state.criteria.clone())
        };
        match failed {
            Some(FetchKind::FirstPage) => self.load_first_page(criteria).await,
            Some(FetchKind::NextPage) => self.load_next_page().await,
            None => Ok(LoadOutcome::Skipped),
        }
    }

    /// Replace the active filters and reload from page 1.
    pub async fn set_criteria(&self, criteria: FilterCriteria) -> Result<LoadOutcome> {
        self.load_first_page(criteria).await
    }

    /// Feed a keystroke to the search debouncer. The query is committed once
    /// input has been quiet for the configured delay.
    pub async fn set_search_input(&self, text: impl Into<String>) -> Result<()> {
        self.ensure_alive()?;
        self.inner.debouncer.lock().await.on_input(text);
        Ok(())
    }

    /// Apply a settled search string and reload from page 1.
    pub async fn commit_search(&self, search: impl AsRef<str>) -> Result<LoadOutcome> {
        let criteria = self.inner.state.read().await.criteria.clone();
        self.load_first_page(criteria.with_search(search)).await
    }

    async fn fetch(&self, criteria: &FilterCriteria) -> Result<FeedPage> {
        fetch_page(
            self.inner.api.as_ref(),
            &self.inner.context.source,
            criteria,
            self.inner.settings.page_size,
        )
        .await
    }

    async fn complete_fetch(
        &self,
        generation: u64,
        kind: FetchKind,
        result: Result<FeedPage>,
    ) -> Result<LoadOutcome> {
        self.ensure_alive()?;

        let outcome = {
            let mut state = self.inner.state.write().await;
            if state.generation != generation {
                debug!(
                    generation,
                    current = state.generation,
                    "Discarding stale page"
                );
                drop(state);
                self.emit(FeedEvent::StaleDiscarded { generation });
                return Err(FeedError::StaleResultDiscarded { generation });
            }
            state.is_loading = false;

            match result {
                Ok(page) => {
                    let has_more = page.has_more();
                    let page_no = page.page;
                    let mut store = self.inner.store.write().await;
                    let added = match kind {
                        FetchKind::FirstPage => {
                            store.replace_all(page.posts);
                            state.loaded_criteria = state.criteria.clone();
                            store.len()
                        }
                        FetchKind::NextPage => store.upsert_many(page.posts),
                    };
                    state.cursor = page_no;
                    state.has_more = has_more;
                    state.total = page.total;
                    state.error = None;
                    debug!(page = page_no, added, has_more, total = page.total, "Page loaded");
                    Ok((page_no, added, has_more))
                }
                Err(e) => {
                    warn!(error = %e, ?kind, "Failed to load feed page");
                    // The kept posts belong to other criteria; paging on from
                    // them would mix two queries. Only a page 1 may load next.
                    if kind == FetchKind::FirstPage
                        && !state.criteria.same_filters(&state.loaded_criteria)
                    {
                        state.cursor = 1;
                        state.has_more = false;
                    }
                    state.error = Some(FetchErrorState {
                        kind,
                        message: e.safe_message().into_owned(),
                        retryable: e.is_retryable(),
                    });
                    Err(e)
                }
            }
        };
        self.publish().await;

        match outcome {
            Ok((page, added, has_more)) => {
                self.emit(FeedEvent::PageLoaded {
                    page,
                    added,
                    has_more,
                });
                Ok(LoadOutcome::Loaded { page, added })
            }
            Err(e) => {
                self.emit(FeedEvent::FetchFailed {
                    kind,
                    retryable: e.is_retryable(),
                });
                Err(e)
            }
        }
    }

    // =========================================================================
    // Post actions
    // =========================================================================

    /// Actions the current user may take on a loaded post.
    pub async fn allowed_actions(&self, id: &PostId) -> Option<PostActions> {
        let store = self.inner.store.read().await;
        store
            .get(id)
            .map(|post| allowed_actions(post, &self.inner.context.user))
    }

    /// Whether a mutation of `kind` is pending for the post.
    pub async fn mutation_phase(&self, id: &PostId, kind: MutationKind) -> MutationPhase {
        if self.inner.store.read().await.is_locked(id, kind) {
            MutationPhase::Pending
        } else {
            MutationPhase::Idle
        }
    }

    pub async fn toggle_like(&self, id: &PostId) -> Result<Reconciliation> {
        self.run_mutation(ToggleLike::new(id.clone())).await
    }

    pub async fn add_comment(&self, id: &PostId, text: impl Into<String>) -> Result<Reconciliation> {
        let mutation = match AddComment::new(id.clone(), text) {
            Ok(mutation) => mutation,
            Err(e) => return self.reject(e).await,
        };
        self.run_mutation(mutation).await
    }

    pub async fn toggle_pin(&self, id: &PostId) -> Result<Reconciliation> {
        let pinned = self.inner.store.read().await.get(id).map(|post| post.is_pinned);
        let action = match pinned {
            Some(true) => PostAction::Unpin,
            Some(false) => PostAction::Pin,
            None => return self.reject(FeedError::NotFound(id.clone())).await,
        };
        self.check_allowed(id, action).await?;
        self.run_mutation(TogglePin::new(id.clone())).await
    }

    pub async fn hide_post(&self, id: &PostId) -> Result<Reconciliation> {
        self.check_allowed(id, PostAction::Hide).await?;
        self.run_mutation(SetStatus::hide(id.clone())).await
    }

    pub async fn restore_post(&self, id: &PostId) -> Result<Reconciliation> {
        self.check_allowed(id, PostAction::Restore).await?;
        self.run_mutation(SetStatus::restore(id.clone())).await
    }

    pub async fn edit_post(&self, id: &PostId, draft: PostDraft) -> Result<Reconciliation> {
        self.check_allowed(id, PostAction::Edit).await?;
        let mutation = match EditPost::new(id.clone(), draft) {
            Ok(mutation) => mutation,
            Err(e) => return self.reject(e).await,
        };
        self.run_mutation(mutation).await
    }

    pub async fn delete_post(&self, id: &PostId) -> Result<Reconciliation> {
        self.check_allowed(id, PostAction::Delete).await?;
        self.run_mutation(DeletePost::new(id.clone())).await
    }

    /// Publish a new post and put it at the top of the feed.
    ///
    /// Not optimistic: the server assigns the id. Never retried, since
    /// creation is the one request that is not idempotent.
    pub async fn create_post(&self, draft: PostDraft) -> Result<Post> {
        self.ensure_alive()?;
        if let Err(e) = validate_draft(&draft) {
            return self.reject(e).await;
        }

        let created = match self.inner.api.create_post(&draft).await {
            Ok(post) => post,
            Err(e) => return self.reject(e.into()).await,
        };
        self.ensure_alive()?;

        self.inner.store.write().await.prepend(created.clone());
        info!(post_id = %created.id, post_type = created.post_type.as_str(), "Post created");
        self.publish().await;
        self.emit(FeedEvent::PostCreated {
            id: created.id.clone(),
        });
        Ok(created)
    }

    async fn check_allowed(&self, id: &PostId, action: PostAction) -> Result<()> {
        self.ensure_alive()?;
        let allowed = self.allowed_actions(id).await;
        match allowed {
            Some(actions) if actions.contains(action) => Ok(()),
            Some(_) => {
                self.reject(FeedError::NotPermitted {
                    id: id.clone(),
                    action,
                })
                .await
            }
            None => self.reject(FeedError::NotFound(id.clone())).await,
        }
    }

    async fn run_mutation<M: OptimisticMutation>(&self, mutation: M) -> Result<Reconciliation> {
        self.ensure_alive()?;
        let id = mutation.post_id().clone();
        let kind = mutation.kind();

        let snapshot = match self.inner.mutator.begin(&mutation).await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.reject(e).await,
        };
        self.publish().await;
        self.emit(FeedEvent::Mutation {
            id: id.clone(),
            kind,
            phase: MutationPhase::Pending,
        });

        let result = self.inner.mutator.complete(&mutation, snapshot).await;
        if matches!(result, Err(FeedError::ShutDown)) {
            return result;
        }
        let phase = match &result {
            Ok(_) => MutationPhase::Confirmed,
            Err(e) => {
                self.push_notice(e).await;
                MutationPhase::RolledBack
            }
        };
        self.publish().await;
        self.emit(FeedEvent::Mutation { id, kind, phase });
        result
    }

    /// Surface `err` if the user should see it, then return it.
    async fn reject<T>(&self, err: FeedError) -> Result<T> {
        if err.is_user_visible() && self.is_alive() {
            self.push_notice(&err).await;
            self.publish().await;
        }
        Err(err)
    }

    // =========================================================================
    // Notices and sponsored content
    // =========================================================================

    async fn push_notice(&self, err: &FeedError) {
        if !err.is_user_visible() {
            return;
        }
        let notice = Notice {
            id: self.inner.next_notice_id.fetch_add(1, Ordering::Relaxed),
            message: err.safe_message().into_owned(),
        };
        debug!(notice_id = notice.id, error = %err, "Surfacing notice");
        self.inner.state.write().await.notices.push(notice);
    }

    /// Remove a notice. Returns false if it was already gone.
    pub async fn dismiss_notice(&self, notice_id: u64) -> bool {
        let removed = {
            let mut state = self.inner.state.write().await;
            let before = state.notices.len();
            state.notices.retain(|notice| notice.id != notice_id);
            state.notices.len() != before
        };
        if removed {
            self.publish().await;
        }
        removed
    }

    /// Load sponsored content for the user's university. Never fails; falls
    /// back to the built-in list. Returns how many ads are now active.
    pub async fn load_ads(&self) -> Result<usize> {
        self.ensure_alive()?;
        let (ads, fallback) = ads::load_ads(self.inner.api.as_ref(), self.inner.context.university_id()).await;
        self.ensure_alive()?;

        let count = ads.len();
        *self.inner.ads.write().await = ads;
        self.publish().await;
        self.emit(FeedEvent::AdsLoaded { count, fallback });
        Ok(count)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// The current state of the feed.
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.inner.snapshots.borrow().clone()
    }

    /// A receiver that sees every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.inner.snapshots.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<FeedEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    async fn publish(&self) {
        if !self.is_alive() {
            return;
        }

        let snapshot = {
            let state = self.inner.state.read().await;
            let store = self.inner.store.read().await;
            let ads = self.inner.ads.read().await;

            let public = matches!(self.inner.context.source, FeedSource::Public);
            let posts: Vec<Post> = store
                .iter()
                .filter(|post| !public || post.status == PostStatus::Active)
                .filter(|post| state.criteria.matches(post))
                .cloned()
                .collect();
            let ad_every = if public { self.inner.settings.ad_every } else { 0 };
            let items = interleave(&posts, &ads, ad_every);

            FeedSnapshot {
                posts,
                items,
                criteria: state.criteria.clone(),
                cursor: state.cursor,
                has_more: state.has_more,
                is_loading: state.is_loading,
                total: state.total,
                error: state.error.clone(),
                notices: state.notices.clone(),
                generation: state.generation,
            }
        };

        self.inner.snapshots.send_replace(Arc::new(snapshot));
    }
}
