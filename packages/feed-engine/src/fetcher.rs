//! Stateless page fetching: criteria + page number in, `FeedPage` out.

use alumni_api::Post;
use tracing::warn;

use crate::context::FeedSource;
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::traits::BaseFeedApi;

/// One fetched page.
#[derive(Debug, Clone)]
pub struct FeedPage {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub posts: Vec<Post>,
    /// Total matching posts on the server.
    pub total: u64,
}

impl FeedPage {
    /// A full page that does not reach the server's total means there is more.
    pub fn has_more(&self) -> bool {
        let page_size = u64::from(self.page_size);
        self.posts.len() as u64 == page_size && u64::from(self.page) * page_size < self.total
    }
}

/// Fetch page `criteria.page()` from the given source.
///
/// Posts beyond `page_size` are dropped so `posts.len() <= page_size` always
/// holds, whatever the server sends.
pub async fn fetch_page(
    api: &dyn BaseFeedApi,
    source: &FeedSource,
    criteria: &FilterCriteria,
    page_size: u32,
) -> Result<FeedPage> {
    let response = match source {
        FeedSource::Public => api.fetch_feed(&criteria.feed_query(page_size)).await?,
        FeedSource::Moderation {
            status_filter,
            university_id,
        } => {
            let query = criteria.admin_query(page_size, *status_filter, university_id.clone());
            api.fetch_admin_posts(&query).await?
        }
    };

    let mut posts = response.posts;
    if posts.len() > page_size as usize {
        warn!(
            page = criteria.page(),
            page_size,
            returned = posts.len(),
            "Server returned an oversized page, truncating"
        );
        posts.truncate(page_size as usize);
    }

    Ok(FeedPage {
        page: criteria.page(),
        page_size,
        posts,
        total: response.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_api::{PostId, PostStatus, PostType, UserId};
    use chrono::Utc;

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| Post {
                id: PostId::from(i as u64),
                author_id: UserId::new("u"),
                author_name: None,
                author_company: None,
                university_id: None,
                post_type: PostType::Text,
                tag: None,
                content: String::new(),
                media: Vec::new(),
                like_count: 0,
                comment_count: 0,
                liked_by_current_user: false,
                created_at: Utc::now(),
                job: None,
                status: PostStatus::Active,
                is_pinned: false,
            })
            .collect()
    }

    fn page(page: u32, page_size: u32, returned: usize, total: u64) -> FeedPage {
        FeedPage {
            page,
            page_size,
            posts: posts(returned),
            total,
        }
    }

    #[test]
    fn test_has_more_requires_full_page_below_total() {
        assert!(page(1, 10, 10, 20).has_more());
        assert!(!page(2, 10, 10, 20).has_more());
        assert!(!page(1, 10, 7, 20).has_more());
        assert!(!page(1, 10, 0, 0).has_more());
    }

    #[test]
    fn test_has_more_law_over_sizes() {
        for page_size in 1..=6u32 {
            for total in 0..=20u64 {
                for page_no in 1..=5u32 {
                    let offset = u64::from((page_no - 1) * page_size);
                    let returned = total.saturating_sub(offset).min(u64::from(page_size)) as usize;
                    let p = page(page_no, page_size, returned, total);
                    let expected = returned == page_size as usize
                        && u64::from(page_no) * u64::from(page_size) < total;
                    assert_eq!(p.has_more(), expected, "size={page_size} total={total} page={page_no}");
                }
            }
        }
    }
}
