//! `page` / `per_page` resolution for paged listings.
//!
//! Resolution never fails: a value that does not parse, or is not positive,
//! is replaced by its default.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Upper bound on `per_page`; larger requests are clamped.
pub const MAX_PER_PAGE: u32 = 100;

/// A resolved page request. Both fields are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

impl Pagination {
    /// Resolve raw query values.
    pub fn from_raw(page: Option<&str>, per_page: Option<&str>) -> Self {
        Self {
            page: positive(page).unwrap_or(DEFAULT_PAGE),
            per_page: positive(per_page)
                .unwrap_or(DEFAULT_PER_PAGE)
                .min(MAX_PER_PAGE),
        }
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.per_page as usize)
    }

    pub fn limit(&self) -> usize {
        self.per_page as usize
    }

    /// Number of pages needed for `total` items.
    pub fn total_pages(&self, total: u64) -> u32 {
        let pages = total.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pagination = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
            Ok(Query(params)) => Pagination::from_raw(
                params.get("page").map(String::as_str),
                params.get("per_page").map(String::as_str),
            ),
            Err(_) => Pagination::default(),
        };

        parts.extensions.insert(pagination);
        Ok(pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn defaults_when_absent() {
        assert_eq!(Pagination::from_raw(None, None), Pagination::default());
        assert_eq!(Pagination::default().page, 1);
        assert_eq!(Pagination::default().per_page, 20);
    }

    #[test]
    fn non_positive_values_fall_back() {
        let p = Pagination::from_raw(Some("0"), Some("-5"));
        assert_eq!(p, Pagination { page: 1, per_page: 20 });
    }

    #[test]
    fn garbage_falls_back() {
        let p = Pagination::from_raw(Some("two"), Some("1.5"));
        assert_eq!(p, Pagination::default());
    }

    #[test]
    fn third_page_of_ten() {
        let p = Pagination::from_raw(Some("3"), Some("10"));
        assert_eq!(p.offset(), 20);
        assert_eq!(p.offset() + p.limit(), 30);
    }

    #[test]
    fn per_page_is_clamped() {
        let p = Pagination::from_raw(Some("1"), Some("5000"));
        assert_eq!(p.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let p = Pagination::from_raw(Some("99999999999"), Some("100"));
        assert_eq!(p.page, u32::MAX);
        assert!(p.offset() > 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::from_raw(None, Some("10"));
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(31), 4);
    }

    #[tokio::test]
    async fn extractor_reads_query_string() {
        let (mut parts, _) = Request::builder()
            .uri("/dashboard/publications?page=3&per_page=10")
            .body(())
            .unwrap()
            .into_parts();

        let p = Pagination::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(p, Pagination { page: 3, per_page: 10 });
        assert_eq!(parts.extensions.get::<Pagination>(), Some(&p));
    }

    #[tokio::test]
    async fn extractor_never_rejects() {
        let (mut parts, _) = Request::builder()
            .uri("/dashboard/publications?page=abc&per_page=")
            .body(())
            .unwrap()
            .into_parts();

        let p = Pagination::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(p, Pagination::default());
    }
}
