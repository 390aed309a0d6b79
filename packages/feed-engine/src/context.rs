//! Read-only ambient context handed to the feed engine.
//!
//! Session storage and authentication live outside the engine. Whatever owns
//! them builds a `FeedContext` once and passes it to the controller, so the
//! engine never reaches for process-wide state.

use alumni_api::{PostStatus, UniversityId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Alumnus,
    Moderator,
    Admin,
}

impl Role {
    /// Moderators and admins may pin, hide and restore any post.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// The signed-in user, as far as the feed needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub university_id: Option<UniversityId>,
}

impl CurrentUser {
    pub fn alumnus(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            role: Role::Alumnus,
            university_id: None,
        }
    }

    pub fn moderator(id: impl Into<UserId>) -> Self {
        Self {
            role: Role::Moderator,
            ..Self::alumnus(id)
        }
    }

    pub fn with_university(mut self, university_id: UniversityId) -> Self {
        self.university_id = Some(university_id);
        self
    }
}

/// Which listing the controller pages through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedSource {
    /// The public feed, `GET /feed`.
    #[default]
    Public,
    /// The moderation listing, `GET /admin/posts`.
    Moderation {
        status_filter: Option<PostStatus>,
        university_id: Option<UniversityId>,
    },
}

#[derive(Debug, Clone)]
pub struct FeedContext {
    pub user: CurrentUser,
    pub source: FeedSource,
}

impl FeedContext {
    pub fn public(user: CurrentUser) -> Self {
        Self {
            user,
            source: FeedSource::Public,
        }
    }

    pub fn moderation(user: CurrentUser, status_filter: Option<PostStatus>) -> Self {
        let university_id = user.university_id.clone();
        Self {
            user,
            source: FeedSource::Moderation {
                status_filter,
                university_id,
            },
        }
    }

    /// University used to scope sponsored content.
    pub fn university_id(&self) -> Option<&UniversityId> {
        self.user.university_id.as_ref()
    }
}
