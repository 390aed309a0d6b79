//! Shared test fixtures: an in-memory portal server with scripted failures
//! and request gates.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use feed_engine::alumni_api::{
    Ad, AdId, AdminPostsQuery, ApiError, CommentResponse, FeedQuery, LikeResponse,
    ModerationFragment, Post, PostDraft, PostId, PostStatus, PostTag, PostType, PostsPage, Result,
    UniversityId, UserId,
};
use feed_engine::{BaseFeedApi, CurrentUser, FeedContext, FeedController, FeedSettings};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Feed,
    AdminPosts,
    Like,
    Create,
    Update,
    Delete,
    Comment,
    Hide,
    Restore,
    Pin,
    Ads,
}

#[derive(Default)]
struct MockState {
    posts: Vec<Post>,
    ads: Vec<Ad>,
    failures: HashMap<Op, VecDeque<ApiError>>,
    gates: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<Op>,
    feed_queries: Vec<FeedQuery>,
    admin_queries: Vec<AdminPostsQuery>,
    /// Likes other users add on the server whenever we like a post.
    concurrent_likes: u64,
    /// Tag the server stamps on every updated post.
    update_tag: Option<PostTag>,
    created: u64,
}

#[derive(Default)]
pub struct MockFeedApi {
    state: Mutex<MockState>,
}

impl MockFeedApi {
    pub fn with_posts(posts: Vec<Post>) -> Arc<Self> {
        let api = Self::default();
        api.state.lock().unwrap().posts = posts;
        Arc::new(api)
    }

    pub fn set_ads(&self, ads: Vec<Ad>) {
        self.state.lock().unwrap().ads = ads;
    }

    /// The next call to `op` fails with `err`.
    pub fn fail_next(&self, op: Op, err: ApiError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// The next call to `op` blocks until the returned sender fires or drops.
    pub fn hold_next(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .gates
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn set_concurrent_likes(&self, extra: u64) {
        self.state.lock().unwrap().concurrent_likes = extra;
    }

    pub fn set_update_tag(&self, tag: PostTag) {
        self.state.lock().unwrap().update_tag = Some(tag);
    }

    pub fn call_count(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    pub fn feed_queries(&self) -> Vec<FeedQuery> {
        self.state.lock().unwrap().feed_queries.clone()
    }

    pub fn admin_queries(&self) -> Vec<AdminPostsQuery> {
        self.state.lock().unwrap().admin_queries.clone()
    }

    pub fn server_post(&self, id: &str) -> Option<Post> {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
    }

    /// Wait until `op` has been called at least `n` times.
    pub async fn wait_for_calls(&self, op: Op, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.call_count(op) < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for calls");
    }

    /// Record the call, wait on its gate if one is set, then pop a failure.
    async fn enter(&self, op: Op) -> Result<()> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op);
            state.gates.get_mut(&op).and_then(|q| q.pop_front())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let failure = self
            .state
            .lock()
            .unwrap()
            .failures
            .get_mut(&op)
            .and_then(|q| q.pop_front());
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn paginate(posts: Vec<Post>, page: u32, page_size: u32) -> PostsPage {
        let total = posts.len() as u64;
        let start = ((page.max(1) - 1) * page_size) as usize;
        let page_posts: Vec<Post> = posts
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        PostsPage {
            posts: page_posts,
            total,
            total_pages: total.div_ceil(u64::from(page_size.max(1))),
        }
    }

    fn with_post<T>(&self, id: &PostId, f: impl FnOnce(&mut Post) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        match state.posts.iter_mut().find(|p| &p.id == id) {
            Some(post) => Ok(f(post)),
            None => Err(ApiError::Server {
                status: 404,
                message: format!("post {} not found", id),
            }),
        }
    }
}

#[async_trait]
impl BaseFeedApi for MockFeedApi {
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<PostsPage> {
        self.state.lock().unwrap().feed_queries.push(query.clone());
        self.enter(Op::Feed).await?;

        let posts: Vec<Post> = {
            let state = self.state.lock().unwrap();
            state
                .posts
                .iter()
                .filter(|p| p.status == PostStatus::Active)
                .filter(|p| query.types.is_empty() || query.types.contains(&p.post_type))
                .filter(|p| match &query.search {
                    Some(search) => p.content.to_lowercase().contains(&search.to_lowercase()),
                    None => true,
                })
                .cloned()
                .collect()
        };
        Ok(Self::paginate(posts, query.page, query.page_size))
    }

    async fn fetch_admin_posts(&self, query: &AdminPostsQuery) -> Result<PostsPage> {
        self.state.lock().unwrap().admin_queries.push(query.clone());
        self.enter(Op::AdminPosts).await?;

        let mut posts: Vec<Post> = {
            let state = self.state.lock().unwrap();
            state
                .posts
                .iter()
                .filter(|p| query.status_filter.map_or(true, |s| p.status == s))
                .cloned()
                .collect()
        };
        // Pinned first, stable otherwise
        posts.sort_by_key(|p| !p.is_pinned);
        Ok(Self::paginate(posts, query.page, query.page_size))
    }

    async fn set_like(&self, id: &PostId, liked: bool) -> Result<LikeResponse> {
        self.enter(Op::Like).await?;
        let extra = self.state.lock().unwrap().concurrent_likes;
        self.with_post(id, |post| {
            if liked && !post.liked_by_current_user {
                post.like_count += 1 + extra;
            } else if !liked && post.liked_by_current_user {
                post.like_count = post.like_count.saturating_sub(1) + extra;
            }
            post.liked_by_current_user = liked;
            LikeResponse {
                likes_count: post.like_count,
            }
        })
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        self.enter(Op::Create).await?;
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        let post = Post {
            id: PostId::new(format!("new-{}", state.created)),
            author_id: UserId::new("me"),
            author_name: Some("Me".into()),
            author_company: None,
            university_id: None,
            post_type: draft.post_type,
            tag: draft.tag,
            content: draft.content.clone(),
            media: draft.media.clone(),
            like_count: 0,
            comment_count: 0,
            liked_by_current_user: false,
            created_at: Utc::now(),
            job: draft.job.clone(),
            status: PostStatus::Active,
            is_pinned: false,
        };
        state.posts.insert(0, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<Post> {
        self.enter(Op::Update).await?;
        let update_tag = self.state.lock().unwrap().update_tag;
        self.with_post(id, |post| {
            post.post_type = draft.post_type;
            post.tag = update_tag.or(draft.tag);
            post.content = draft.content.clone();
            post.media = draft.media.clone();
            post.job = draft.job.clone();
            post.clone()
        })
    }

    async fn delete_post(&self, id: &PostId) -> Result<()> {
        self.enter(Op::Delete).await?;
        self.state.lock().unwrap().posts.retain(|p| &p.id != id);
        Ok(())
    }

    async fn add_comment(&self, id: &PostId, _text: &str) -> Result<CommentResponse> {
        self.enter(Op::Comment).await?;
        self.with_post(id, |post| {
            post.comment_count += 1;
            CommentResponse {
                comments_count: post.comment_count,
            }
        })
    }

    async fn hide_post(&self, id: &PostId) -> Result<ModerationFragment> {
        self.enter(Op::Hide).await?;
        self.with_post(id, |post| {
            post.status = PostStatus::Hidden;
            ModerationFragment {
                is_pinned: None,
                status: Some(post.status),
            }
        })
    }

    async fn restore_post(&self, id: &PostId) -> Result<ModerationFragment> {
        self.enter(Op::Restore).await?;
        self.with_post(id, |post| {
            post.status = PostStatus::Active;
            ModerationFragment {
                is_pinned: None,
                status: Some(post.status),
            }
        })
    }

    async fn pin_post(&self, id: &PostId, pinned: bool) -> Result<ModerationFragment> {
        self.enter(Op::Pin).await?;
        self.with_post(id, |post| {
            post.is_pinned = pinned;
            ModerationFragment {
                is_pinned: Some(pinned),
                status: None,
            }
        })
    }

    async fn fetch_ads(&self, _university_id: Option<&UniversityId>) -> Result<Vec<Ad>> {
        self.enter(Op::Ads).await?;
        Ok(self.state.lock().unwrap().ads.clone())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Post `n`, authored by `author-n`, newest first when numbered ascending.
pub fn make_post(n: u64) -> Post {
    Post {
        id: PostId::from(n),
        author_id: UserId::new(format!("author-{}", n)),
        author_name: Some(format!("Author {}", n)),
        author_company: None,
        university_id: None,
        post_type: PostType::Text,
        tag: None,
        content: format!("Post number {}", n),
        media: Vec::new(),
        like_count: 0,
        comment_count: 0,
        liked_by_current_user: false,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
            - chrono::Duration::minutes(n as i64),
        job: None,
        status: PostStatus::Active,
        is_pinned: false,
    }
}

/// Posts `1..=n`.
pub fn make_posts(n: u64) -> Vec<Post> {
    (1..=n).map(make_post).collect()
}

pub fn make_ad(n: u64) -> Ad {
    Ad {
        id: AdId::from(n),
        title: format!("Sponsor {}", n),
        description: String::new(),
        image_url: None,
        link: format!("https://sponsor.example.com/{}", n),
    }
}

pub fn settings() -> FeedSettings {
    FeedSettings::default()
}

/// A public feed for an ordinary alumnus called `me`.
pub fn public_feed(api: Arc<MockFeedApi>) -> FeedController {
    FeedController::new(api, FeedContext::public(CurrentUser::alumnus("me")), settings())
}

pub fn public_feed_with_page_size(api: Arc<MockFeedApi>, page_size: u32) -> FeedController {
    FeedController::new(
        api,
        FeedContext::public(CurrentUser::alumnus("me")),
        settings().with_page_size(page_size),
    )
}

pub fn server_error(status: u16) -> ApiError {
    ApiError::Server {
        status,
        message: "upstream failure".into(),
    }
}

pub fn network_error() -> ApiError {
    ApiError::Network("connection refused".into())
}

pub fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.to_string()).collect()
}
