//! Tests for the JSON-lines reader

use super::*;
use crate::error::Error;
use crate::http::HttpClient;
use crate::types::BatchOrigin;
use futures::{StreamExt, TryStreamExt};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_body(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn reader_for(server: &MockServer) -> JsonLinesReader {
    JsonLinesReader::new(
        HttpClient::new().unwrap(),
        format!("{}/data.jsonl", server.uri()),
    )
}

// ============================================================================
// LineSplitter Tests
// ============================================================================

#[test]
fn test_splitter_across_chunks() {
    let mut splitter = LineSplitter::new();
    splitter.push(b"{\"a\":");
    assert!(splitter.next_line().is_none());

    splitter.push(b"1}\n{\"a\"");
    assert_eq!(splitter.next_line().unwrap().as_ref(), b"{\"a\":1}");
    assert!(splitter.next_line().is_none());

    splitter.push(b":2}\n\n");
    assert_eq!(splitter.next_line().unwrap().as_ref(), b"{\"a\":2}");
    assert_eq!(splitter.next_line().unwrap().as_ref(), b"");
    assert!(splitter.next_line().is_none());
    assert!(splitter.finish().is_none());
}

#[test]
fn test_splitter_finish_returns_unterminated_tail() {
    let mut splitter = LineSplitter::new();
    splitter.push(b"first\nsecond");
    assert_eq!(splitter.next_line().unwrap().as_ref(), b"first");
    assert!(splitter.next_line().is_none());
    assert_eq!(splitter.finish().unwrap().as_ref(), b"second");
    assert!(splitter.finish().is_none());
}

#[test]
fn test_splitter_keeps_carriage_return() {
    let mut splitter = LineSplitter::new();
    splitter.push(b"a\r\nb\r\n");
    assert_eq!(splitter.next_line().unwrap().as_ref(), b"a\r");
    assert_eq!(splitter.next_line().unwrap().as_ref(), b"b\r");
}

// ============================================================================
// Reader Tests
// ============================================================================

#[tokio::test]
async fn test_reader_yields_records_in_order() {
    let server = serve_body("{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n").await;

    let records: Vec<_> = reader_for(&server).records().try_collect().await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_reader_skips_blank_lines() {
    let server = serve_body("\n{\"id\":1}\n   \n\r\n{\"id\":2}\n\n").await;

    let numbered: Vec<_> = reader_for(&server)
        .numbered_records()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(numbered.len(), 2);
    assert_eq!(numbered[0].line_number, 2);
    assert_eq!(numbered[1].line_number, 5);
}

#[tokio::test]
async fn test_reader_parses_final_line_without_newline() {
    let server = serve_body("{\"id\":1}\r\n{\"id\":2}").await;

    let records: Vec<_> = read_json_lines(
        &HttpClient::new().unwrap(),
        &format!("{}/data.jsonl", server.uri()),
    )
    .try_collect()
    .await
    .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["id"], 2);
}

#[tokio::test]
async fn test_reader_malformed_line_after_good_records() {
    let server = serve_body("{\"id\":1}\n{\"id\":2}\n{\"id\":\n{\"id\":4}\n").await;

    let results: Vec<_> = reader_for(&server).records().collect().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap()["id"], 1);
    assert_eq!(results[1].as_ref().unwrap()["id"], 2);
    match &results[2] {
        Err(Error::LineParse {
            line_number, line, ..
        }) => {
            assert_eq!(*line_number, 3);
            assert_eq!(line, "{\"id\":");
        }
        other => panic!("Expected LineParse error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reader_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.jsonl"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let results: Vec<_> = reader_for(&server).records().collect().await;

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(Error::Request { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_reader_is_lazy() {
    let server = serve_body("{\"id\":1}\n").await;
    let stream = reader_for(&server).records();
    drop(stream);

    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Batching Tests
// ============================================================================

#[tokio::test]
async fn test_batch_records_groups_by_size() {
    let body: String = (1..=5).map(|i| format!("{{\"id\":{i}}}\n")).collect();
    let server = serve_body(&body).await;

    let batches: Vec<_> = batch_records(reader_for(&server).numbered_records(), 2)
        .try_collect()
        .await
        .unwrap();

    let sizes: Vec<_> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(batches[0].origin, BatchOrigin::Lines { first: 1, last: 2 });
    assert_eq!(batches[2].origin, BatchOrigin::Lines { first: 5, last: 5 });
}

#[tokio::test]
async fn test_batch_records_flushes_before_error() {
    let server = serve_body("{\"id\":1}\n{\"id\":2}\nnot json\n").await;

    let results: Vec<_> = batch_records(reader_for(&server).numbered_records(), 10)
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().len(), 2);
    assert!(matches!(
        results[1],
        Err(Error::LineParse { line_number: 3, .. })
    ));
}
