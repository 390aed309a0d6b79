//! Contextual post actions.
//!
//! The set of actions offered on a post (the "three dots" menu) is resolved
//! once per (post, user) pair into a closed set. Presentation renders the set
//! as-is and the controller checks it again before executing anything.

use std::collections::BTreeSet;

use alumni_api::{Post, PostStatus};
use serde::{Deserialize, Serialize};

use crate::context::CurrentUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostAction {
    Edit,
    Delete,
    Report,
    Pin,
    Unpin,
    Hide,
    Restore,
}

impl PostAction {
    pub fn label(&self) -> &'static str {
        match self {
            PostAction::Edit => "Edit post",
            PostAction::Delete => "Delete post",
            PostAction::Report => "Report post",
            PostAction::Pin => "Pin to top",
            PostAction::Unpin => "Unpin",
            PostAction::Hide => "Hide from feed",
            PostAction::Restore => "Restore",
        }
    }
}

/// Allowed actions for one post, in menu order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostActions(BTreeSet<PostAction>);

impl PostActions {
    pub fn contains(&self, action: PostAction) -> bool {
        self.0.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PostAction> + '_ {
        self.0.iter().copied()
    }
}

/// Resolve the actions `user` may take on `post`.
pub fn allowed_actions(post: &Post, user: &CurrentUser) -> PostActions {
    let mut actions = BTreeSet::new();
    let is_owner = post.author_id == user.id;

    if is_owner {
        actions.insert(PostAction::Edit);
        actions.insert(PostAction::Delete);
    } else {
        actions.insert(PostAction::Report);
    }

    if user.role.can_moderate() {
        actions.insert(PostAction::Delete);
        actions.insert(if post.is_pinned {
            PostAction::Unpin
        } else {
            PostAction::Pin
        });
        match post.status {
            PostStatus::Active => {
                actions.insert(PostAction::Hide);
            }
            PostStatus::Hidden | PostStatus::Deleted => {
                actions.insert(PostAction::Restore);
            }
        }
    }

    PostActions(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_api::{PostId, PostType, UserId};
    use chrono::Utc;

    fn post_by(author: &str) -> Post {
        Post {
            id: PostId::new("p"),
            author_id: UserId::new(author),
            author_name: None,
            author_company: None,
            university_id: None,
            post_type: PostType::Text,
            tag: None,
            content: "hi".into(),
            media: Vec::new(),
            like_count: 0,
            comment_count: 0,
            liked_by_current_user: false,
            created_at: Utc::now(),
            job: None,
            status: PostStatus::Active,
            is_pinned: false,
        }
    }

    fn collect(actions: &PostActions) -> Vec<PostAction> {
        actions.iter().collect()
    }

    #[test]
    fn test_owner_can_edit_and_delete() {
        let actions = allowed_actions(&post_by("me"), &CurrentUser::alumnus("me"));
        assert_eq!(collect(&actions), vec![PostAction::Edit, PostAction::Delete]);
    }

    #[test]
    fn test_other_user_can_only_report() {
        let actions = allowed_actions(&post_by("someone"), &CurrentUser::alumnus("me"));
        assert_eq!(collect(&actions), vec![PostAction::Report]);
    }

    #[test]
    fn test_moderator_actions_follow_post_state() {
        let moderator = CurrentUser::moderator("mod");

        let active = allowed_actions(&post_by("someone"), &moderator);
        assert!(active.contains(PostAction::Pin));
        assert!(active.contains(PostAction::Hide));
        assert!(active.contains(PostAction::Delete));
        assert!(!active.contains(PostAction::Restore));

        let mut hidden_pinned = post_by("someone");
        hidden_pinned.status = PostStatus::Hidden;
        hidden_pinned.is_pinned = true;
        let hidden = allowed_actions(&hidden_pinned, &moderator);
        assert!(hidden.contains(PostAction::Unpin));
        assert!(hidden.contains(PostAction::Restore));
        assert!(!hidden.contains(PostAction::Hide));
        assert!(!hidden.contains(PostAction::Edit));
    }
}
