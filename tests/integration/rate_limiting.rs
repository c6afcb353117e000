//! Request spacing across concurrent callers and error-driven throttling

use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{fetcher, status, ScriptedTransport};
use dte_extractor::fetcher::retry::Criticality;
use dte_extractor::model::City;

fn gaps(transport: &ScriptedTransport) -> Vec<Duration> {
    let calls = transport.calls();
    calls
        .windows(2)
        .map(|pair| pair[1].1.duration_since(pair[0].1))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fetches_share_one_budget() {
    let transport = Arc::new(ScriptedTransport::new(|path, _| {
        let id: i64 = path.rsplit('/').next().unwrap().parse().unwrap();
        Ok(json!({"data": {"id": id, "name": "x"}}))
    }));
    let fetcher = fetcher(transport.clone(), 7, 3, Duration::from_secs(1));
    let interval = fetcher.limiter().base_interval();

    let fetches = (1..=10).map(|id| {
        let fetcher = &fetcher;
        async move {
            let path = format!("/ciudades/{id}");
            fetcher
                .get_entity::<City>(&path, "city", Criticality::NonCritical)
                .await
        }
    });
    let cities = join_all(fetches).await;

    assert!(cities.iter().all(Option::is_some));
    assert_eq!(transport.calls().len(), 10);
    for gap in gaps(&transport) {
        assert!(gap >= interval, "gap {gap:?} shorter than {interval:?}");
    }
    assert_eq!(fetcher.limiter().snapshot().granted, 10);
}

#[tokio::test(start_paused = true)]
async fn test_sustained_errors_double_the_interval() {
    let transport = Arc::new(ScriptedTransport::new(|path, _| Err(status(500, path))));
    let fetcher = fetcher(transport.clone(), 7, 4, Duration::from_millis(1));
    let limiter = fetcher.limiter().clone();
    let base = limiter.base_interval();

    let city: Option<City> = fetcher
        .get_entity("/ciudades/1", "city", Criticality::NonCritical)
        .await;
    assert!(city.is_none());

    // Four failed attempts push the score past the threshold
    assert_eq!(limiter.snapshot().consecutive_errors, 4.0);
    assert_eq!(limiter.effective_interval(), base * 2);

    limiter.record_success();
    limiter.record_success();
    assert_eq!(limiter.snapshot().consecutive_errors, 3.0);
    assert_eq!(limiter.effective_interval(), base);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_spacing_applies_to_following_requests() {
    let transport = Arc::new(ScriptedTransport::new(|path, _| {
        if path == "/ciudades/1" {
            Err(status(403, path))
        } else {
            Ok(json!({"data": {"id": 2, "name": "ok"}}))
        }
    }));
    let fetcher = fetcher(transport.clone(), 10, 4, Duration::from_millis(1));
    let base = fetcher.limiter().base_interval();

    let _: Option<City> = fetcher
        .get_entity("/ciudades/1", "city", Criticality::NonCritical)
        .await;
    let _: Option<City> = fetcher
        .get_entity("/ciudades/2", "city", Criticality::NonCritical)
        .await;

    let gaps = gaps(&transport);
    assert!(*gaps.last().unwrap() >= base * 2);
}
