use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use super::*;
use crate::{
    error::RemoteError,
    test_support::{record_page, FakeRemoteService},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Rec {
    #[serde(rename = "_id")]
    id: String,
}

impl Keyed for Rec {
    fn identity_key(&self) -> &str {
        &self.id
    }
}

fn fetcher(service: &Arc<FakeRemoteService>) -> ListFetcher<Rec> {
    let query = ListQuery::new(20).sorted_desc("createdAt");
    ListFetcher::new(
        Arc::clone(service) as Arc<dyn crate::transport::RemoteService>,
        "orders",
        query,
    )
}

fn ids(items: &[Rec]) -> Vec<&str> {
    items.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn refresh_replaces_accumulator_verbatim() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1", "2"], 2, 20, 0));
    let fetcher = fetcher(&service);

    let outcome = fetcher.refresh().await.expect("refresh");
    assert_eq!(outcome, FetchOutcome::Fetched { appended: 2 });

    let items = fetcher.items().await;
    assert_eq!(ids(&items), vec!["1", "2"]);
    assert!(fetcher.is_exhausted().await);
    assert_eq!(fetcher.next_offset().await, 2);
}

#[tokio::test]
async fn exhaustion_flips_only_on_the_final_page() {
    let service = Arc::new(FakeRemoteService::new());
    let page1: Vec<String> = (0..20).map(|i| format!("a{i}")).collect();
    let page2: Vec<String> = (0..20).map(|i| format!("b{i}")).collect();
    let page3: Vec<String> = (0..5).map(|i| format!("c{i}")).collect();
    fn as_refs(v: &[String]) -> Vec<&str> {
        v.iter().map(String::as_str).collect()
    }
    service.push_page(record_page(&as_refs(&page1), 45, 20, 0));
    service.push_page(record_page(&as_refs(&page2), 45, 20, 20));
    service.push_page(record_page(&as_refs(&page3), 45, 20, 40));
    let fetcher = fetcher(&service);

    fetcher.refresh().await.expect("page 1");
    assert!(!fetcher.is_exhausted().await);
    fetcher.load_more().await.expect("page 2");
    assert!(!fetcher.is_exhausted().await);
    fetcher.load_more().await.expect("page 3");
    assert!(fetcher.is_exhausted().await);

    assert_eq!(fetcher.len().await, 45);
    assert_eq!(fetcher.next_offset().await, 45);
}

#[tokio::test]
async fn overlapping_pages_keep_each_identity_key_once() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1", "2"], 4, 2, 0));
    // Server-side insert shifted the window; "2" reappears on page two.
    service.push_page(record_page(&["2", "3"], 4, 2, 2));
    let fetcher = fetcher(&service);

    fetcher.refresh().await.expect("refresh");
    let outcome = fetcher.load_more().await.expect("load more");

    assert_eq!(outcome, FetchOutcome::Fetched { appended: 1 });
    let items = fetcher.items().await;
    assert_eq!(ids(&items), vec!["1", "2", "3"]);
    // Offset advances by the fetched count, not the appended count.
    assert_eq!(fetcher.next_offset().await, 4);
}

#[tokio::test]
async fn load_more_is_noop_once_exhausted() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1"], 1, 20, 0));
    let fetcher = fetcher(&service);

    fetcher.refresh().await.expect("refresh");
    assert!(fetcher.is_exhausted().await);

    let outcome = fetcher.load_more().await.expect("noop");
    assert_eq!(outcome, FetchOutcome::Skipped);
    assert_eq!(service.find_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_load_more_preserves_partial_list_and_latches() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1", "2"], 4, 2, 0));
    service.push_page_err(RemoteError::Network("connection reset".into()));
    let fetcher = fetcher(&service);

    fetcher.refresh().await.expect("refresh");
    fetcher.load_more().await.expect_err("scripted failure");

    assert_eq!(fetcher.len().await, 2);
    assert!(fetcher.last_error().await.is_some());

    // Latched error: further load_more calls do not hit the network.
    let outcome = fetcher.load_more().await.expect("latched noop");
    assert_eq!(outcome, FetchOutcome::Skipped);
    assert_eq!(service.find_calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn successful_refresh_clears_a_latched_error() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1", "2"], 4, 2, 0));
    service.push_page_err(RemoteError::Network("connection reset".into()));
    service.push_page(record_page(&["9", "8"], 2, 2, 0));
    let fetcher = fetcher(&service);

    fetcher.refresh().await.expect("refresh");
    fetcher.load_more().await.expect_err("scripted failure");

    fetcher.refresh().await.expect("recovering refresh");
    assert!(fetcher.last_error().await.is_none());
    let items = fetcher.items().await;
    assert_eq!(ids(&items), vec!["9", "8"]);
}

#[tokio::test]
async fn failed_refresh_leaves_accumulator_empty() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page_err(RemoteError::Network("dns failure".into()));
    let fetcher = fetcher(&service);

    fetcher.refresh().await.expect_err("scripted failure");
    assert!(fetcher.is_empty().await);
    assert!(fetcher.last_error().await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_more_is_single_flight() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1", "2"], 6, 2, 0));
    let fetcher = Arc::new(fetcher(&service));
    fetcher.refresh().await.expect("refresh");

    *service.find_delay.lock().unwrap() = Some(Duration::from_millis(150));
    service.push_page(record_page(&["3", "4"], 6, 2, 2));

    let background = {
        let fetcher = Arc::clone(&fetcher);
        tokio::spawn(async move { fetcher.load_more().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let second = fetcher.load_more().await.expect("guarded call");
    assert_eq!(second, FetchOutcome::Skipped);

    let first = background.await.expect("join").expect("first call");
    assert_eq!(first, FetchOutcome::Fetched { appended: 2 });
    assert_eq!(service.find_calls.lock().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_discards_an_in_flight_page() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_page(record_page(&["1", "2"], 6, 2, 0));
    let fetcher = Arc::new(fetcher(&service));
    fetcher.refresh().await.expect("refresh");

    *service.find_delay.lock().unwrap() = Some(Duration::from_millis(150));
    service.push_page(record_page(&["3", "4"], 6, 2, 2));

    let token = fetcher.cancellation_token();
    let background = {
        let fetcher = Arc::clone(&fetcher);
        tokio::spawn(async move { fetcher.load_more().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    token.cancel();

    let outcome = background.await.expect("join").expect("cancelled call");
    assert_eq!(outcome, FetchOutcome::Cancelled);

    // The fetched page never touched the state.
    assert_eq!(fetcher.len().await, 2);
    assert_eq!(fetcher.next_offset().await, 2);
}
