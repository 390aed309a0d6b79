//! Concrete optimistic mutations.

mod comment;
mod like;
mod moderation;
mod post;

pub use comment::AddComment;
pub use like::{LikeSnapshot, ToggleLike};
pub use moderation::{SetStatus, TogglePin};
pub use post::{validate_draft, DeletePost, EditPost};
