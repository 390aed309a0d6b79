//! Pure alumni portal REST client
//!
//! A thin client over the portal's paginated REST contract: the public feed,
//! post mutations (like, create, edit, delete, comment), the moderation
//! listing and its pin/hide/restore actions, and university-scoped sponsored
//! content. It holds no state beyond connection settings.
//!
//! # Example
//!
//! ```rust,ignore
//! use alumni_api::{AlumniApiClient, FeedQuery};
//!
//! let client = AlumniApiClient::new("https://alumni.example.edu/api").with_token(token);
//!
//! let page = client.fetch_feed(&FeedQuery::new(1, 10)).await?;
//! let liked = client.like_post(&page.posts[0].id).await?;
//! ```

pub mod error;
pub mod id;
pub mod types;

pub use error::{ApiError, Result};
pub use id::{AdId, Id, PostId, UniversityId, UserId};
pub use types::*;

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Alumni portal API client.
#[derive(Clone)]
pub struct AlumniApiClient {
    http_client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl AlumniApiClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            ..Self::new(base_url)
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Feed
    // =========================================================================

    /// Fetch one page of the public feed.
    pub async fn fetch_feed(&self, query: &FeedQuery) -> Result<PostsPage> {
        let request = self.request(Method::GET, "/feed").query(&query.to_params());
        let page: PostsPage = self.send_json(request).await?;

        debug!(
            page = query.page,
            returned = page.posts.len(),
            total = page.total,
            "Fetched feed page"
        );
        Ok(page)
    }

    // =========================================================================
    // Post mutations
    // =========================================================================

    /// Like a post. Returns the authoritative like count.
    pub async fn like_post(&self, id: &PostId) -> Result<LikeResponse> {
        let request = self.request(Method::POST, &format!("/posts/{}/like", id));
        self.send_json(request).await
    }

    /// Remove the current user's like. Returns the authoritative like count.
    pub async fn unlike_post(&self, id: &PostId) -> Result<LikeResponse> {
        let request = self.request(Method::DELETE, &format!("/posts/{}/like", id));
        self.send_json(request).await
    }

    /// Create a post. Not idempotent: callers must not retry blindly.
    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        let request = self.request(Method::POST, "/posts").json(draft);
        self.send_json(request).await
    }

    pub async fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<Post> {
        let request = self
            .request(Method::PUT, &format!("/posts/{}", id))
            .json(draft);
        self.send_json(request).await
    }

    pub async fn delete_post(&self, id: &PostId) -> Result<()> {
        let request = self.request(Method::DELETE, &format!("/posts/{}", id));
        self.send_empty(request).await
    }

    /// Add a comment. Returns the authoritative comment count.
    pub async fn add_comment(&self, id: &PostId, text: &str) -> Result<CommentResponse> {
        #[derive(Serialize)]
        struct Body<'a> {
            content: &'a str,
        }

        let request = self
            .request(Method::POST, &format!("/posts/{}/comments", id))
            .json(&Body { content: text });
        self.send_json(request).await
    }

    // =========================================================================
    // Moderation
    // =========================================================================

    /// Fetch one page of the moderation listing.
    pub async fn fetch_admin_posts(&self, query: &AdminPostsQuery) -> Result<PostsPage> {
        let request = self
            .request(Method::GET, "/admin/posts")
            .query(&query.to_params());
        self.send_json(request).await
    }

    pub async fn hide_post(&self, id: &PostId) -> Result<ModerationFragment> {
        let request = self.request(Method::POST, &format!("/admin/posts/{}/hide", id));
        self.send_json(request).await
    }

    pub async fn restore_post(&self, id: &PostId) -> Result<ModerationFragment> {
        let request = self.request(Method::POST, &format!("/admin/posts/{}/restore", id));
        self.send_json(request).await
    }

    /// Set the pin state. The target state is sent so retries stay idempotent.
    pub async fn pin_post(&self, id: &PostId, pinned: bool) -> Result<ModerationFragment> {
        #[derive(Serialize)]
        struct Body {
            pinned: bool,
        }

        let request = self
            .request(Method::POST, &format!("/admin/posts/{}/pin", id))
            .json(&Body { pinned });
        self.send_json(request).await
    }

    // =========================================================================
    // Sponsored content
    // =========================================================================

    /// Fetch sponsored content, scoped to a university when given.
    pub async fn fetch_ads(&self, university_id: Option<&UniversityId>) -> Result<Vec<Ad>> {
        let mut request = self.request(Method::GET, "/ads");
        if let Some(university_id) = university_id {
            request = request.query(&[("university_id", university_id.as_str())]);
        }
        self.send_json(request).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json");

        if let Some(token) = &self.auth_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Alumni API request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "Alumni API error");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await.map(|_| ())
    }
}
