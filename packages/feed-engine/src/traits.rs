// Trait definitions for dependency injection
//
// The engine talks to the portal only through BaseFeedApi. Production code
// hands it an AlumniApiClient; tests hand it a scripted in-memory server.

use alumni_api::{
    Ad, AdminPostsQuery, AlumniApiClient, CommentResponse, FeedQuery, LikeResponse,
    ModerationFragment, Post, PostDraft, PostId, PostsPage, Result, UniversityId,
};
use async_trait::async_trait;

// =============================================================================
// Feed API Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseFeedApi: Send + Sync {
    /// One page of the public feed
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<PostsPage>;

    /// One page of the moderation listing
    async fn fetch_admin_posts(&self, query: &AdminPostsQuery) -> Result<PostsPage>;

    /// Set the current user's like to `liked`; returns the authoritative count
    async fn set_like(&self, id: &PostId, liked: bool) -> Result<LikeResponse>;

    async fn create_post(&self, draft: &PostDraft) -> Result<Post>;

    async fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<Post>;

    async fn delete_post(&self, id: &PostId) -> Result<()>;

    async fn add_comment(&self, id: &PostId, text: &str) -> Result<CommentResponse>;

    async fn hide_post(&self, id: &PostId) -> Result<ModerationFragment>;

    async fn restore_post(&self, id: &PostId) -> Result<ModerationFragment>;

    async fn pin_post(&self, id: &PostId, pinned: bool) -> Result<ModerationFragment>;

    /// Sponsored content, optionally scoped to a university
    async fn fetch_ads(&self, university_id: Option<&UniversityId>) -> Result<Vec<Ad>>;
}

#[async_trait]
impl BaseFeedApi for AlumniApiClient {
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<PostsPage> {
        AlumniApiClient::fetch_feed(self, query).await
    }

    async fn fetch_admin_posts(&self, query: &AdminPostsQuery) -> Result<PostsPage> {
        AlumniApiClient::fetch_admin_posts(self, query).await
    }

    async fn set_like(&self, id: &PostId, liked: bool) -> Result<LikeResponse> {
        if liked {
            self.like_post(id).await
        } else {
            self.unlike_post(id).await
        }
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        AlumniApiClient::create_post(self, draft).await
    }

    async fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<Post> {
        AlumniApiClient::update_post(self, id, draft).await
    }

    async fn delete_post(&self, id: &PostId) -> Result<()> {
        AlumniApiClient::delete_post(self, id).await
    }

    async fn add_comment(&self, id: &PostId, text: &str) -> Result<CommentResponse> {
        AlumniApiClient::add_comment(self, id, text).await
    }

    async fn hide_post(&self, id: &PostId) -> Result<ModerationFragment> {
        AlumniApiClient::hide_post(self, id).await
    }

    async fn restore_post(&self, id: &PostId) -> Result<ModerationFragment> {
        AlumniApiClient::restore_post(self, id).await
    }

    async fn pin_post(&self, id: &PostId, pinned: bool) -> Result<ModerationFragment> {
        AlumniApiClient::pin_post(self, id, pinned).await
    }

    async fn fetch_ads(&self, university_id: Option<&UniversityId>) -> Result<Vec<Ad>> {
        AlumniApiClient::fetch_ads(self, university_id).await
    }
}
