//! Retrieval of every page of a filtered collection
//!
//! Page 1 is fetched first to learn `total_pages`; without it the range is
//! abandoned (empty result). Pages 2..N follow, sequentially or with bounded
//! concurrency, each through the retrying fetcher. Pages are always consumed
//! in page order so that [`MAX_CONSECUTIVE_PAGE_FAILURES`] failed pages in a
//! row stop the walk while keeping what was already gathered.

use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::pin;
use tracing::{debug, error, info, warn};

use crate::downloader::config::MAX_CONSECUTIVE_PAGE_FAILURES;
use crate::fetcher::retry::{Criticality, RetryingFetcher};
use crate::model::ListPage;

/// How pages after the first are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    /// One page at a time
    #[default]
    Sequential,
    /// Up to N pages in flight, still consumed in order
    Concurrent(usize),
}

/// A filtered, paged collection endpoint
#[derive(Debug, Clone)]
pub struct PageQuery<'a> {
    /// Endpoint path
    pub path: &'a str,
    /// Collection key inside `data`
    pub key: &'a str,
    /// Filters sent with every page
    pub filters: Vec<(&'static str, String)>,
}

impl PageQuery<'_> {
    fn params(&self, page: u32) -> Vec<(&str, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 1);
        params.push(("page", page.to_string()));
        params.extend(self.filters.iter().map(|(k, v)| (*k, v.clone())));
        params
    }
}

/// Page walker over a [`RetryingFetcher`]
pub struct Paginator<'a> {
    fetcher: &'a RetryingFetcher,
    mode: PageMode,
    max_consecutive_failures: u32,
}

impl<'a> Paginator<'a> {
    /// Paginator using `mode`
    pub fn new(fetcher: &'a RetryingFetcher, mode: PageMode) -> Self {
        Self {
            fetcher,
            mode,
            max_consecutive_failures: MAX_CONSECUTIVE_PAGE_FAILURES,
        }
    }

    /// Fetch one page; page fetches are critical
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        query: &PageQuery<'_>,
        page: u32,
    ) -> Option<ListPage<T>> {
        let params = query.params(page);
        let what = format!("{} page {page}", query.path);
        self.fetcher
            .get_page(query.path, query.key, &params, &what, Criticality::Critical)
            .await
    }

    /// Every record of the collection, in page order
    ///
    /// Never fails: a failed first page yields an empty list, later failures
    /// yield partial results.
    pub async fn fetch_all_pages<T: DeserializeOwned>(&self, query: &PageQuery<'_>) -> Vec<T> {
        let Some(first) = self.fetch_page::<T>(query, 1).await else {
            error!(path = query.path, "First page unavailable, abandoning range");
            return Vec::new();
        };

        let total_pages = first.meta.page_count();
        let mut records = first.records;
        info!(
            path = query.path,
            total_pages,
            first_page_records = records.len(),
            "First page fetched"
        );

        if total_pages > 1 {
            let rest = 2..=total_pages;
            let fetch = |page: u32| async move { (page, self.fetch_page::<T>(query, page).await) };
            match self.mode {
                PageMode::Sequential => {
                    let pages = stream::iter(rest).then(fetch);
                    self.collect_pages(pages, total_pages, &mut records, query.path)
                        .await;
                }
                PageMode::Concurrent(limit) => {
                    let pages = stream::iter(rest).map(fetch).buffered(limit.max(1));
                    self.collect_pages(pages, total_pages, &mut records, query.path)
                        .await;
                }
            }
        }

        info!(path = query.path, records = records.len(), "Pagination complete");
        records
    }

    async fn collect_pages<T, S>(&self, pages: S, total_pages: u32, records: &mut Vec<T>, path: &str)
    where
        S: Stream<Item = (u32, Option<ListPage<T>>)>,
    {
        let mut pages = pin!(pages);
        let mut consecutive_failures = 0;
        while let Some((page, result)) = pages.next().await {
            match result {
                Some(list) => {
                    consecutive_failures = 0;
                    debug!(path, page, total_pages, page_records = list.records.len(), "Page fetched");
                    records.extend(list.records);
                }
                None => {
                    consecutive_failures += 1;
                    warn!(path, page, consecutive_failures, "Page unavailable");
                    if consecutive_failures >= self.max_consecutive_failures {
                        error!(
                            path,
                            page,
                            kept = records.len(),
                            "Too many consecutive page failures, stopping"
                        );
                        break;
                    }
                }
            }
        }
    }
}
