//! Sponsored content: loading with a static fallback, and render-time
//! interleaving into the post sequence.

use alumni_api::{Ad, AdId, Post, UniversityId};
use tracing::{debug, warn};

use crate::traits::BaseFeedApi;

/// An ad follows every `DEFAULT_AD_EVERY`-th post.
pub const DEFAULT_AD_EVERY: usize = 8;

/// A renderable feed entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Post(Post),
    Ad(Ad),
}

impl FeedItem {
    pub fn as_post(&self) -> Option<&Post> {
        match self {
            FeedItem::Post(post) => Some(post),
            FeedItem::Ad(_) => None,
        }
    }

    pub fn as_ad(&self) -> Option<&Ad> {
        match self {
            FeedItem::Ad(ad) => Some(ad),
            FeedItem::Post(_) => None,
        }
    }
}

/// Interleave `ads` into an already-filtered post sequence.
///
/// After the post at index `i`, if `(i + 1) % every == 0`, the ad at
/// `(i / every) % ads.len()` is inserted. With no ads, or `every == 0`, the
/// posts come back unchanged.
pub fn interleave(posts: &[Post], ads: &[Ad], every: usize) -> Vec<FeedItem> {
    let slots = if every == 0 || ads.is_empty() {
        0
    } else {
        posts.len() / every
    };
    let mut items = Vec::with_capacity(posts.len() + slots);

    for (i, post) in posts.iter().enumerate() {
        items.push(FeedItem::Post(post.clone()));
        if slots > 0 && (i + 1) % every == 0 {
            items.push(FeedItem::Ad(ads[(i / every) % ads.len()].clone()));
        }
    }
    items
}

/// Built-in sponsored items used when the ads endpoint has nothing for us.
pub fn fallback_ads() -> Vec<Ad> {
    vec![
        Ad {
            id: AdId::new("fallback-mentorship"),
            title: "Become a Mentor".into(),
            description: "Share your experience with students starting their careers.".into(),
            image_url: None,
            link: "/mentorship".into(),
        },
        Ad {
            id: AdId::new("fallback-events"),
            title: "Alumni Events Near You".into(),
            description: "Reunions, meetups and talks from your alumni network.".into(),
            image_url: None,
            link: "/events".into(),
        },
        Ad {
            id: AdId::new("fallback-giving"),
            title: "Support Student Scholarships".into(),
            description: "Every contribution helps a student finish their degree.".into(),
            image_url: None,
            link: "/giving".into(),
        },
    ]
}

/// Load sponsored content. Never fails: errors and empty responses both fall
/// back to [`fallback_ads`]. Returns the ads and whether the fallback was used.
pub async fn load_ads(api: &dyn BaseFeedApi, university_id: Option<&UniversityId>) -> (Vec<Ad>, bool) {
    match api.fetch_ads(university_id).await {
        Ok(ads) if !ads.is_empty() => {
            debug!(count = ads.len(), "Loaded sponsored content");
            (ads, false)
        }
        Ok(_) => {
            debug!("No sponsored content returned, using fallback");
            (fallback_ads(), true)
        }
        Err(e) => {
            warn!(error = %e, "Failed to load sponsored content, using fallback");
            (fallback_ads(), true)
        }
    }
}
