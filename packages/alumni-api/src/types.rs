//! Alumni portal API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AdId, PostId, UniversityId, UserId};

// =============================================================================
// Post
// =============================================================================

/// Kind of feed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Image,
    Video,
    Job,
    Announcement,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
            PostType::Video => "video",
            PostType::Job => "job",
            PostType::Announcement => "announcement",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostType::Text => "Post",
            PostType::Image => "Photo",
            PostType::Video => "Video",
            PostType::Job => "Job",
            PostType::Announcement => "Announcement",
        }
    }

    pub fn variants() -> &'static [PostType] {
        &[
            PostType::Text,
            PostType::Image,
            PostType::Video,
            PostType::Job,
            PostType::Announcement,
        ]
    }
}

/// Optional story tag attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostTag {
    SuccessStory,
    CareerMilestone,
    Achievement,
    LearningJourney,
    Volunteering,
}

impl PostTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostTag::SuccessStory => "success_story",
            PostTag::CareerMilestone => "career_milestone",
            PostTag::Achievement => "achievement",
            PostTag::LearningJourney => "learning_journey",
            PostTag::Volunteering => "volunteering",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostTag::SuccessStory => "Success Story",
            PostTag::CareerMilestone => "Career Milestone",
            PostTag::Achievement => "Achievement",
            PostTag::LearningJourney => "Learning Journey",
            PostTag::Volunteering => "Volunteering",
        }
    }
}

/// Moderation status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Active,
    Hidden,
    Deleted,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Hidden => "hidden",
            PostStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

/// A media attachment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
}

/// Job-specific fields, only meaningful when the post type is `job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A feed post as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_company: Option<String>,
    #[serde(default)]
    pub university_id: Option<UniversityId>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[serde(default)]
    pub tag: Option<PostTag>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default, alias = "likes_count")]
    pub like_count: u64,
    #[serde(default, alias = "comments_count")]
    pub comment_count: u64,
    #[serde(default, alias = "is_liked")]
    pub liked_by_current_user: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobDetails>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Post {
    /// Job fields, present only for job posts.
    pub fn job(&self) -> Option<&JobDetails> {
        match self.post_type {
            PostType::Job => self.job.as_ref(),
            _ => None,
        }
    }

    /// Company used for filtering: the job's company, else the author's.
    pub fn company(&self) -> Option<&str> {
        self.job()
            .map(|job| job.company.as_str())
            .or(self.author_company.as_deref())
    }
}

/// Body for creating or editing a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<PostTag>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobDetails>,
}

impl PostDraft {
    /// A plain text draft.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Text,
            tag: None,
            content: content.into(),
            media: Vec::new(),
            job: None,
        }
    }

    pub fn with_tag(mut self, tag: PostTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media.push(media);
        self
    }

    /// Turn the draft into a job post.
    pub fn with_job(mut self, job: JobDetails) -> Self {
        self.post_type = PostType::Job;
        self.job = Some(job);
        self
    }
}

// =============================================================================
// Listing queries
// =============================================================================

/// Query for `GET /feed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub page: u32,
    pub page_size: u32,
    pub types: Vec<PostType>,
    pub tags: Vec<PostTag>,
    pub search: Option<String>,
}

impl FeedQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            types: Vec::new(),
            tags: Vec::new(),
            search: None,
        }
    }

    /// Query-string pairs. Multi-valued dimensions are comma-joined and
    /// empty dimensions are omitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if !self.types.is_empty() {
            let joined: Vec<&str> = self.types.iter().map(PostType::as_str).collect();
            params.push(("type", joined.join(",")));
        }
        if !self.tags.is_empty() {
            let joined: Vec<&str> = self.tags.iter().map(PostTag::as_str).collect();
            params.push(("tag", joined.join(",")));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }
}

/// Query for the moderation listing `GET /admin/posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPostsQuery {
    pub page: u32,
    pub page_size: u32,
    pub status_filter: Option<PostStatus>,
    pub search: Option<String>,
    pub university_id: Option<UniversityId>,
}

impl AdminPostsQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(status) = self.status_filter {
            params.push(("status_filter", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(university_id) = &self.university_id {
            params.push(("university_id", university_id.to_string()));
        }
        params
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Paginated posts envelope shared by the feed and moderation listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    pub total: u64,
    #[serde(default)]
    pub total_pages: u64,
}

/// Authoritative like count after a like/unlike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub likes_count: u64,
}

/// Authoritative comment count after a comment was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub comments_count: u64,
}

/// Partial post state returned by moderation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModerationFragment {
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub status: Option<PostStatus>,
}

// =============================================================================
// Sponsored content
// =============================================================================

/// A sponsored item shown between posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: AdId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    pub link: String,
}
