use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlobId, BlobInfo};

/// One filter predicate over blob descriptors.
///
/// The clause set is fixed and enumerated; a filter is data, not a list
/// of arbitrary match functions, so backends can inspect or translate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterClause {
    /// Case-insensitive substring match over name and group
    Search(String),
    Id(BlobId),
    Name(String),
    Group(String),
    Completed(bool),
    /// Expired relative to evaluation time; `false` selects blobs that
    /// never expire or have not yet expired
    Expired(bool),
    /// `create_time >= bound`
    FromCreateTime(DateTime<Utc>),
    /// `create_time < bound`
    ToCreateTime(DateTime<Utc>),
}

impl FilterClause {
    /// Evaluate this clause against a descriptor at the given instant
    pub fn matches(&self, blob: &BlobInfo, now: DateTime<Utc>) -> bool {
        match self {
            Self::Search(search) => {
                let search = search.to_lowercase();
                let name_matches = blob
                    .name
                    .as_deref()
                    .map_or(false, |n| n.to_lowercase().contains(&search));
                name_matches || blob.group.to_lowercase().contains(&search)
            }
            Self::Id(id) => blob.id == *id,
            Self::Name(name) => blob.name.as_deref() == Some(name.as_str()),
            Self::Group(group) => blob.group == *group,
            Self::Completed(completed) => blob.completed == *completed,
            Self::Expired(expired) => blob.is_expired_at(now) == *expired,
            Self::FromCreateTime(from) => blob.create_time >= *from,
            Self::ToCreateTime(to) => blob.create_time < *to,
        }
    }
}

/// Conjunction of filter clauses; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobFilter {
    clauses: Vec<FilterClause>,
}

impl BlobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.clauses.push(FilterClause::Search(search.into()));
        self
    }

    pub fn with_id<I: Into<BlobId>>(mut self, id: I) -> Self {
        self.clauses.push(FilterClause::Id(id.into()));
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.clauses.push(FilterClause::Name(name.into()));
        self
    }

    pub fn with_group<S: Into<String>>(mut self, group: S) -> Self {
        self.clauses.push(FilterClause::Group(group.into()));
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.clauses.push(FilterClause::Completed(completed));
        self
    }

    pub fn with_expired(mut self, expired: bool) -> Self {
        self.clauses.push(FilterClause::Expired(expired));
        self
    }

    pub fn with_from_create_time(mut self, from: DateTime<Utc>) -> Self {
        self.clauses.push(FilterClause::FromCreateTime(from));
        self
    }

    pub fn with_to_create_time(mut self, to: DateTime<Utc>) -> Self {
        self.clauses.push(FilterClause::ToCreateTime(to));
        self
    }

    /// The clauses making up this filter
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Evaluate all clauses against a descriptor at the given instant
    pub fn matches_at(&self, blob: &BlobInfo, now: DateTime<Utc>) -> bool {
        self.clauses.iter().all(|clause| clause.matches(blob, now))
    }

    /// Evaluate all clauses against a descriptor now
    pub fn matches(&self, blob: &BlobInfo) -> bool {
        self.matches_at(blob, Utc::now())
    }
}

/// Skip/take paging over catalog queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagingParams {
    pub skip: usize,
    pub take: Option<usize>,
}

impl PagingParams {
    pub fn new(skip: usize, take: usize) -> Self {
        Self {
            skip,
            take: Some(take),
        }
    }

    pub fn get_skip(&self) -> usize {
        self.skip
    }

    /// Requested page size, bounded by the configured maximum
    pub fn get_take(&self, max_take: usize) -> usize {
        self.take.unwrap_or(max_take).min(max_take)
    }
}

/// One page of query results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPage<T> {
    pub data: Vec<T>,
    /// Total matches across all pages, when the backend can count them
    pub total: Option<u64>,
}

impl<T> DataPage<T> {
    pub fn new(data: Vec<T>, total: Option<u64>) -> Self {
        Self { data, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_blob(group: &str, name: &str) -> BlobInfo {
        BlobInfo::new(group).with_name(name)
    }

    #[test]
    fn empty_filter_matches_everything() {
        let blob = test_blob("photos", "cat.jpg");
        assert!(BlobFilter::new().matches(&blob));
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_group() {
        let blob = test_blob("Photos", "Cat.JPG");

        assert!(BlobFilter::new().with_search("cat").matches(&blob));
        assert!(BlobFilter::new().with_search("PHOTO").matches(&blob));
        assert!(!BlobFilter::new().with_search("dog").matches(&blob));
    }

    #[test]
    fn exact_clauses_require_exact_values() {
        let blob = test_blob("photos", "cat.jpg");

        assert!(BlobFilter::new().with_group("photos").matches(&blob));
        assert!(!BlobFilter::new().with_group("photo").matches(&blob));
        assert!(BlobFilter::new().with_name("cat.jpg").matches(&blob));
        assert!(BlobFilter::new().with_id(blob.id.clone()).matches(&blob));
        assert!(!BlobFilter::new().with_id("other").matches(&blob));
    }

    #[test]
    fn clauses_combine_as_conjunction() {
        let blob = test_blob("photos", "cat.jpg");

        let filter = BlobFilter::new().with_group("photos").with_completed(false);
        assert!(filter.matches(&blob));

        let filter = BlobFilter::new().with_group("photos").with_completed(true);
        assert!(!filter.matches(&blob));
    }

    #[test]
    fn expired_clause_uses_evaluation_time() {
        let now = Utc::now();
        let expired = test_blob("a", "x").with_expire_time(now - Duration::hours(1));
        let alive = test_blob("a", "y").with_expire_time(now + Duration::hours(1));
        let eternal = test_blob("a", "z");

        let wants_expired = BlobFilter::new().with_expired(true);
        let wants_alive = BlobFilter::new().with_expired(false);

        assert!(wants_expired.matches_at(&expired, now));
        assert!(!wants_expired.matches_at(&alive, now));
        assert!(!wants_expired.matches_at(&eternal, now));
        assert!(wants_alive.matches_at(&alive, now));
        assert!(wants_alive.matches_at(&eternal, now));
    }

    #[test]
    fn create_time_range_is_half_open() {
        let blob = test_blob("a", "x");
        let t = blob.create_time;

        assert!(BlobFilter::new().with_from_create_time(t).matches(&blob));
        assert!(!BlobFilter::new().with_to_create_time(t).matches(&blob));
        assert!(BlobFilter::new()
            .with_to_create_time(t + Duration::seconds(1))
            .matches(&blob));
    }

    #[test]
    fn paging_bounds_take_to_maximum() {
        assert_eq!(PagingParams::default().get_take(100), 100);
        assert_eq!(PagingParams::new(0, 10).get_take(100), 10);
        assert_eq!(PagingParams::new(0, 500).get_take(100), 100);
        assert_eq!(PagingParams::new(7, 10).get_skip(), 7);
    }
}
