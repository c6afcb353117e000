//! Page walking: first-page abort, consecutive-failure stop, page order

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common::{list_body, status};
use dte_extractor::downloader::{RateLimiter, RunStatistics};
use dte_extractor::fetcher::pagination::{PageMode, PageQuery, Paginator};
use dte_extractor::fetcher::retry::{RetryPolicy, RetryingFetcher};
use dte_extractor::fetcher::{ApiTransport, FetchResult};

const TOTAL_PAGES: u32 = 8;

/// Serves `TOTAL_PAGES` pages of one record each (`id` = page number);
/// pages listed in `failing` always answer 500
struct PagedTransport {
    failing: Vec<u32>,
    requested: Mutex<Vec<u32>>,
}

impl PagedTransport {
    fn new(failing: &[u32]) -> Self {
        Self {
            failing: failing.to_vec(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for PagedTransport {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Value> {
        let page: u32 = query
            .iter()
            .find(|(k, _)| *k == "page")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(1);
        self.requested.lock().unwrap().push(page);

        if self.failing.contains(&page) {
            return Err(status(500, path));
        }
        Ok(list_body("dtes", vec![json!({ "id": page })], TOTAL_PAGES))
    }

    fn base_url(&self) -> &str {
        "paged://"
    }
}

fn retrying(transport: Arc<PagedTransport>) -> RetryingFetcher {
    RetryingFetcher::new(
        transport,
        Arc::new(RateLimiter::per_second(1000)),
        Arc::new(RunStatistics::new()),
        RetryPolicy {
            backoff_base: Duration::from_millis(1),
            ..Default::default()
        },
    )
}

fn query() -> PageQuery<'static> {
    PageQuery {
        path: "/dtes",
        key: "dtes",
        filters: vec![("range_date", "01-01-2024 / 31-01-2024".to_string())],
    }
}

/// Record ids gathered with `failing` pages, plus the data loss counted
async fn walk(mode: PageMode, failing: &[u32]) -> (Vec<i64>, u64, Arc<PagedTransport>) {
    let transport = Arc::new(PagedTransport::new(failing));
    let fetcher = retrying(transport.clone());
    let records: Vec<Value> = Paginator::new(&fetcher, mode).fetch_all_pages(&query()).await;
    let ids = records.iter().filter_map(|r| r["id"].as_i64()).collect();
    (ids, fetcher.stats().snapshot().data_loss, transport)
}

const MODES: [PageMode; 2] = [PageMode::Sequential, PageMode::Concurrent(3)];

#[tokio::test(start_paused = true)]
async fn test_all_pages_are_gathered_in_page_order() {
    for mode in MODES {
        let (ids, data_loss, _) = walk(mode, &[]).await;
        assert_eq!(ids, (1..=8).collect::<Vec<i64>>(), "{mode:?}");
        assert_eq!(data_loss, 0, "{mode:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_first_page_abandons_the_range() {
    for mode in MODES {
        let (ids, data_loss, transport) = walk(mode, &[1]).await;
        assert!(ids.is_empty(), "{mode:?}");
        assert_eq!(data_loss, 1, "{mode:?}");
        // three attempts at page 1, nothing beyond it
        assert_eq!(transport.requested(), vec![1, 1, 1], "{mode:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_three_failed_pages_in_a_row_stop_and_keep_earlier_pages() {
    for mode in MODES {
        let (ids, data_loss, transport) = walk(mode, &[3, 4, 5]).await;
        assert_eq!(ids, vec![1, 2], "{mode:?}");
        assert_eq!(data_loss, 3, "{mode:?}");
        if mode == PageMode::Sequential {
            assert!(!transport.requested().contains(&6));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_failures_do_not_stop_the_walk() {
    for mode in MODES {
        let (ids, data_loss, _) = walk(mode, &[3, 4, 6]).await;
        assert_eq!(ids, vec![1, 2, 5, 7, 8], "{mode:?}");
        assert_eq!(data_loss, 3, "{mode:?}");
    }
}
