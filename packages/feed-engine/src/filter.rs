//! Feed query criteria and the local match predicate.
//!
//! Every dimension is a set where an empty set means "any value". Dimensions
//! are ANDed together, values inside a dimension are ORed. The same criteria
//! drive both the server query (type, tag, search) and the local predicate
//! applied when building snapshots (all dimensions, including company and
//! university which the feed endpoint cannot filter on).

use std::collections::BTreeSet;

use alumni_api::{AdminPostsQuery, FeedQuery, Post, PostStatus, PostTag, PostType, UniversityId};
use serde::{Deserialize, Serialize};

/// Immutable description of the active feed query.
///
/// Builder methods consume and return the criteria so a change always produces
/// a new value. Any change to a filter dimension resets the cursor to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    types: BTreeSet<PostType>,
    tags: BTreeSet<PostTag>,
    /// Stored lowercased; company comparison is case-insensitive.
    companies: BTreeSet<String>,
    universities: BTreeSet<UniversityId>,
    search: String,
    page: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            types: BTreeSet::new(),
            tags: BTreeSet::new(),
            companies: BTreeSet::new(),
            universities: BTreeSet::new(),
            search: String::new(),
            page: 1,
        }
    }
}

impl FilterCriteria {
    /// Criteria matching every post, positioned on page 1.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, post_type: PostType) -> Self {
        self.types.insert(post_type);
        self.first_page()
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = PostType>) -> Self {
        self.types = types.into_iter().collect();
        self.first_page()
    }

    pub fn with_tag(mut self, tag: PostTag) -> Self {
        self.tags.insert(tag);
        self.first_page()
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = PostTag>) -> Self {
        self.tags = tags.into_iter().collect();
        self.first_page()
    }

    pub fn with_company(mut self, company: impl AsRef<str>) -> Self {
        let company = company.as_ref().trim().to_lowercase();
        if !company.is_empty() {
            self.companies.insert(company);
        }
        self.first_page()
    }

    pub fn with_university(mut self, university_id: UniversityId) -> Self {
        self.universities.insert(university_id);
        self.first_page()
    }

    /// Replace the free-text query. Surrounding whitespace is ignored.
    pub fn with_search(mut self, search: impl AsRef<str>) -> Self {
        self.search = search.as_ref().trim().to_string();
        self.first_page()
    }

    /// Same filters, cursor moved to `page` (1-based).
    pub fn at_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn first_page(self) -> Self {
        self.at_page(1)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn types(&self) -> &BTreeSet<PostType> {
        &self.types
    }

    pub fn tags(&self) -> &BTreeSet<PostTag> {
        &self.tags
    }

    /// True when no dimension narrows the result.
    pub fn is_wildcard(&self) -> bool {
        self.types.is_empty()
            && self.tags.is_empty()
            && self.companies.is_empty()
            && self.universities.is_empty()
            && self.search.is_empty()
    }

    /// Same filters, ignoring the cursor.
    pub fn same_filters(&self, other: &FilterCriteria) -> bool {
        self.types == other.types
            && self.tags == other.tags
            && self.companies == other.companies
            && self.universities == other.universities
            && self.search == other.search
    }

    /// Whether `post` satisfies every dimension of these criteria.
    pub fn matches(&self, post: &Post) -> bool {
        matches(post, self)
    }

    /// Public feed request for the criteria's page.
    pub fn feed_query(&self, page_size: u32) -> FeedQuery {
        FeedQuery {
            page: self.page,
            page_size,
            types: self.types.iter().copied().collect(),
            tags: self.tags.iter().copied().collect(),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
        }
    }

    /// Moderation listing request for the criteria's page.
    pub fn admin_query(
        &self,
        page_size: u32,
        status_filter: Option<PostStatus>,
        university_id: Option<UniversityId>,
    ) -> AdminPostsQuery {
        AdminPostsQuery {
            page: self.page,
            page_size,
            status_filter,
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            university_id,
        }
    }
}

/// type ∈ types AND tag ∈ tags AND company ∈ companies AND university ∈
/// universities AND search is a case-insensitive substring of content, author,
/// company or job title. Empty dimensions match everything.
pub fn matches(post: &Post, criteria: &FilterCriteria) -> bool {
    if !criteria.types.is_empty() && !criteria.types.contains(&post.post_type) {
        return false;
    }

    if !criteria.tags.is_empty() {
        match post.tag {
            Some(tag) if criteria.tags.contains(&tag) => {}
            _ => return false,
        }
    }

    if !criteria.companies.is_empty() {
        match post.company() {
            Some(company) if criteria.companies.contains(&company.trim().to_lowercase()) => {}
            _ => return false,
        }
    }

    if !criteria.universities.is_empty() {
        match &post.university_id {
            Some(university_id) if criteria.universities.contains(university_id) => {}
            _ => return false,
        }
    }

    if criteria.search.is_empty() {
        return true;
    }

    let query = criteria.search.to_lowercase();
    let haystacks = [
        Some(post.content.as_str()),
        post.author_name.as_deref(),
        post.company(),
        post.job().map(|job| job.title.as_str()),
    ];

    haystacks
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}
