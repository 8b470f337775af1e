//! Integration tests for page partitioning and per-worker harvesting.

mod support;

use std::time::Duration;

use harvester_core::{
    Harvester, HttpClient, PAGE_SIZE, PagePartition, RetryPolicy, TransportSettings,
    WorkerContext,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{harvest_config, mount_page, numbered};

fn harvester(server: &MockServer, id: usize, count: usize) -> Harvester {
    let config = harvest_config(server, std::path::Path::new("unused"), count);
    Harvester::new(
        WorkerContext::new(id, count).expect("valid worker"),
        config.endpoint,
        config.parser,
    )
}

fn client() -> HttpClient {
    HttpClient::new(&TransportSettings::default()).expect("client should build")
}

#[test]
fn test_partitions_cover_every_page_once_for_many_pool_sizes() {
    for count in [1, 2, 3, 4, 7, 16, 64] {
        for amount in [1usize, 50, 51, 120, 333, 2500] {
            let total = amount.div_ceil(PAGE_SIZE);
            let mut owners = vec![None; total];
            for worker in WorkerContext::pool(count).expect("pool") {
                for page in PagePartition::for_amount(worker, amount, PAGE_SIZE).pages() {
                    assert!(
                        owners[page].replace(worker.id()).is_none(),
                        "page {page} assigned twice (count={count}, amount={amount})"
                    );
                }
            }
            assert!(
                owners.iter().all(Option::is_some),
                "gap in coverage (count={count}, amount={amount})"
            );
        }
    }
}

#[tokio::test]
async fn test_worker_fetches_only_its_own_pages() {
    let server = MockServer::start().await;
    mount_page(&server, 50, &numbered("P1", 50, 50)).await;
    mount_page(&server, 200, &numbered("P4", 200, 50)).await;

    // worker 1 of 3 owns pages 1, 4 for 250 results; cap is 84.
    let harvest = harvester(&server, 1, 3).harvest(&client(), "topic", 250).await;

    assert_eq!(harvest.pages_fetched, 2);
    assert_eq!(harvest.records.len(), 84);
    assert_eq!(harvest.records[0].title, "P1 50");
    assert_eq!(harvest.records[83].title, "P4 233");
}

#[tokio::test]
async fn test_empty_page_stops_the_worker() {
    let server = MockServer::start().await;
    mount_page(&server, 0, &numbered("P0", 0, 50)).await;
    mount_page(&server, 100, &[]).await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("start", "200"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // worker 0 of 2 owns pages 0, 2, 4 for 250 results.
    let harvest = harvester(&server, 0, 2).harvest(&client(), "topic", 250).await;

    assert!(harvest.exhausted);
    assert_eq!(harvest.records.len(), 50);
}

#[tokio::test]
async fn test_transient_page_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 0, &numbered("Retried", 0, 5)).await;

    let harvest = harvester(&server, 0, 1)
        .with_retry_policy(RetryPolicy::new(
            3,
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
        .harvest(&client(), "topic", 5)
        .await;

    assert_eq!(harvest.failed_pages, 0);
    assert_eq!(harvest.records.len(), 5);
}

#[tokio::test]
async fn test_permanent_page_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let harvest = harvester(&server, 0, 1)
        .with_retry_policy(RetryPolicy::new(3, Duration::ZERO, Duration::ZERO))
        .harvest(&client(), "topic", 10)
        .await;

    assert_eq!(harvest.failed_pages, 1);
    assert!(harvest.records.is_empty());
    assert!(!harvest.exhausted);
}

#[tokio::test]
async fn test_malformed_blocks_are_skipped_without_exhausting() {
    let server = MockServer::start().await;
    let good: String = numbered("Good", 0, 2)
        .iter()
        .map(|block| block.render(&server.uri()))
        .collect();
    let markup = format!(
        r#"<html><body><ol>
<li class="arxiv-result"><p class="authors"><a>Nobody</a></p></li>
{good}
</ol></body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(markup))
        .mount(&server)
        .await;

    let harvest = harvester(&server, 0, 1).harvest(&client(), "topic", 10).await;

    assert!(!harvest.exhausted);
    assert_eq!(harvest.records.len(), 2);
    assert_eq!(harvest.records[1].title, "Good 1");
}
