//! Optimistic mutation protocol.
//!
//! Every user action on a loaded post goes through the same five steps:
//!
//! 1. capture the fields the action will touch,
//! 2. take the `(post, kind)` lock and apply the predicted change locally,
//! 3. issue the request with no store lock held,
//! 4. release the lock,
//! 5. reconcile with the server's answer, or restore the captured fields.
//!
//! Steps 1-2 and 4-5 each run under a single store write guard, so no reader
//! ever sees a half-applied change. A second action of the same kind on the
//! same post is rejected while the first is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alumni_api::{PostId, Result as ApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FeedError, Result};
use crate::store::{MutationKind, PostStore};
use crate::traits::BaseFeedApi;

/// How the server's answer compared to the local prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    AsPredicted,
    /// The server's value differed and was written over the prediction.
    Corrected,
}

/// Lifecycle of one optimistic mutation, as reported in feed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Idle,
    Pending,
    Confirmed,
    RolledBack,
}

/// One optimistic action on one post.
#[async_trait]
pub trait OptimisticMutation: Send + Sync {
    /// Pre-mutation values needed for rollback and for building the request.
    type Snapshot: Send + Sync;
    type Response: Send;

    fn kind(&self) -> MutationKind;

    fn post_id(&self) -> &PostId;

    /// Read what the mutation needs. `None` means the post is not loaded.
    fn capture(&self, store: &PostStore) -> Option<Self::Snapshot>;

    /// Write the predicted outcome.
    fn apply(&self, store: &mut PostStore, snapshot: &Self::Snapshot);

    async fn request(
        &self,
        api: &dyn BaseFeedApi,
        snapshot: &Self::Snapshot,
    ) -> ApiResult<Self::Response>;

    /// Fold the server's answer into the store. The mutation's lock has
    /// already been released.
    fn reconcile(
        &self,
        store: &mut PostStore,
        snapshot: &Self::Snapshot,
        response: Self::Response,
    ) -> Reconciliation;

    /// Restore exactly the captured values.
    fn rollback(&self, store: &mut PostStore, snapshot: Self::Snapshot);
}

/// Runs optimistic mutations against a shared store.
#[derive(Clone)]
pub struct OptimisticMutator {
    store: Arc<RwLock<PostStore>>,
    api: Arc<dyn BaseFeedApi>,
    alive: Arc<AtomicBool>,
}

impl OptimisticMutator {
    pub fn new(store: Arc<RwLock<PostStore>>, api: Arc<dyn BaseFeedApi>, alive: Arc<AtomicBool>) -> Self {
        Self { store, api, alive }
    }

    /// Run `mutation` to completion.
    ///
    /// Returns `MutationInFlight` without touching anything if the same kind
    /// is already pending for the post, and `NotFound` if the post is not
    /// loaded. A failed request is rolled back and its error returned.
    pub async fn run<M: OptimisticMutation>(&self, mutation: M) -> Result<Reconciliation> {
        let snapshot = self.begin(&mutation).await?;
        self.complete(&mutation, snapshot).await
    }

    /// Capture, lock and apply. On success the predicted state is visible in
    /// the store and the lock is held until [`complete`](Self::complete).
    pub async fn begin<M: OptimisticMutation>(&self, mutation: &M) -> Result<M::Snapshot> {
        let id = mutation.post_id();
        let kind = mutation.kind();

        let mut store = self.store.write().await;
        if store.is_locked(id, kind) {
            debug!(post_id = %id, %kind, "Mutation already in flight, rejecting");
            return Err(FeedError::MutationInFlight {
                id: id.clone(),
                kind,
            });
        }
        let snapshot = mutation
            .capture(&store)
            .ok_or_else(|| FeedError::NotFound(id.clone()))?;
        store.try_lock(id, kind);
        mutation.apply(&mut store, &snapshot);

        debug!(post_id = %id, %kind, "Optimistic update applied");
        Ok(snapshot)
    }

    /// Issue the request, release the lock, then reconcile or roll back.
    pub async fn complete<M: OptimisticMutation>(
        &self,
        mutation: &M,
        snapshot: M::Snapshot,
    ) -> Result<Reconciliation> {
        let id = mutation.post_id();
        let kind = mutation.kind();

        let outcome = mutation.request(self.api.as_ref(), &snapshot).await;

        let mut store = self.store.write().await;
        store.unlock(id, kind);

        if !self.alive.load(Ordering::SeqCst) {
            debug!(post_id = %id, %kind, "Feed shut down, ignoring mutation result");
            return Err(FeedError::ShutDown);
        }

        match outcome {
            Ok(response) => {
                let reconciliation = mutation.reconcile(&mut store, &snapshot, response);
                if reconciliation == Reconciliation::Corrected {
                    debug!(post_id = %id, %kind, "Server value differed from prediction");
                }
                Ok(reconciliation)
            }
            Err(e) => {
                warn!(post_id = %id, %kind, error = %e, "Mutation failed, rolling back");
                mutation.rollback(&mut store, snapshot);
                Err(e.into())
            }
        }
    }
}
