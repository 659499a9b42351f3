//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML pipeline → HTTP requests → sink output

use futures::{StreamExt, TryStreamExt};
use pagefeed::config::PipelineConfig;
use pagefeed::http::HttpClient;
use pagefeed::lines::JsonLinesReader;
use pagefeed::sink::{DuckDbSink, MemorySink};
use pagefeed::source::{self, LinesSource};
use pagefeed::{fetch_pages, read_json_lines, run_config, Error, Pipeline, WriteDisposition};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_rides(server: &MockServer, pages: &[Value]) {
    for (i, body) in pages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path("/api/rides"))
            .and(query_param("page", (i + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

fn ride(id: i64, passengers: i64) -> Value {
    json!({
        "vendor_name": "VTS",
        "Trip_Pickup_DateTime": "2009-06-14 23:23:00",
        "Passenger_Count": passengers,
        "id": id,
        "coordinates": {"start": {"lat": 40.64, "lon": -73.78}}
    })
}

// ============================================================================
// Public API Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_pages_until_empty_page() {
    let server = MockServer::start().await;
    mount_rides(
        &server,
        &[json!([ride(1, 1), ride(2, 2)]), json!([ride(3, 1)]), json!([])],
    )
    .await;

    let client = HttpClient::new().unwrap();
    let pages: Vec<_> = fetch_pages(&client, &format!("{}/api/rides", server.uri()))
        .try_collect()
        .await
        .unwrap();

    let numbers: Vec<_> = pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(pages[0].records[1]["coordinates"]["start"]["lat"], 40.64);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_pages_server_error_mid_sequence() {
    let server = MockServer::start().await;
    mount_rides(&server, &[json!([ride(1, 1)])]).await;
    Mock::given(method("GET"))
        .and(path("/api/rides"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let results: Vec<_> = fetch_pages(&client, &format!("{}/api/rides", server.uri()))
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(&results[1], Err(Error::Request { status: 503, body, .. }) if body == "unavailable"));
}

#[tokio::test]
async fn test_read_json_lines_stops_at_bad_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rides.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "{}\n\n{}\n[1,2]\n{}\n",
            ride(1, 1),
            ride(2, 1),
            ride(3, 1)
        )))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let results: Vec<_> = read_json_lines(&client, &format!("{}/rides.jsonl", server.uri()))
        .collect()
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[1].as_ref().unwrap()["id"], 2);
    assert!(matches!(results[2], Err(Error::LineParse { line_number: 4, .. })));
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_yaml_pipeline_pages_into_duckdb() {
    let server = MockServer::start().await;
    mount_rides(
        &server,
        &[json!([ride(1, 1), ride(2, 0)]), json!([ride(3, 4)]), json!([])],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("rides.duckdb");
    let yaml = format!(
        r#"
name: rides
source:
  kind: pages
  url: {}/api/rides
transform:
  normalize_keys: true
  derive_date:
    from: trip_pickup_datetime
    to: pickup_date
  require_positive: [passenger_count]
destination:
  kind: duckdb
  path: {}
  dataset: rides_data
  write_disposition: replace
"#,
        server.uri(),
        db.display()
    );

    let config = PipelineConfig::from_yaml_str(&yaml).unwrap();
    let load = run_config(&config).await.unwrap();

    assert_eq!(load.batches, 2);
    assert_eq!(load.records_read, 3);
    assert_eq!(load.records_filtered, 1);
    assert_eq!(load.records_written, 2);

    let sink = DuckDbSink::open(
        db.to_str().unwrap(),
        "rides_data",
        "rides",
        WriteDisposition::Append,
    )
    .unwrap();
    let docs: Vec<Value> = sink
        .documents()
        .unwrap()
        .iter()
        .map(|d| serde_json::from_str(d).unwrap())
        .collect();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["id"], 1);
    assert_eq!(docs[0]["pickup_date"], "2009-06-14");
    assert_eq!(docs[1]["passenger_count"], 4);
    assert_eq!(docs[1]["coordinates"]["start"]["lon"], -73.78);
}

#[tokio::test]
async fn test_lines_pipeline_with_record_limit() {
    let server = MockServer::start().await;
    let body: String = (1..=10).map(|i| format!("{}\n", ride(i, 1))).collect();
    Mock::given(method("GET"))
        .and(path("/rides.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let reader = JsonLinesReader::new(
        HttpClient::new().unwrap(),
        format!("{}/rides.jsonl", server.uri()),
    );
    let source = LinesSource::new(reader, 4);
    let mut sink = MemorySink::new();

    let load = Pipeline::new("rides")
        .with_max_records(Some(6))
        .run(&source, &mut sink)
        .await
        .unwrap();

    assert!(load.limit_reached);
    assert_eq!(load.records_written, 6);
    let ids: Vec<_> = sink.records().iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_csv_pipeline_into_local_object_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/green_tripdata_2020-10.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "VendorID,lpep_pickup_datetime,passenger_count,trip_distance\n\
             2,2020-10-01 00:09:08,1,0.8\n\
             1,2020-10-01 00:20:00,0,3.1\n",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let lake = dir.path().join("lake");
    let yaml = format!(
        r#"
name: green_taxi
source:
  kind: csv
  urls: ["{}/green_tripdata_2020-10.csv"]
transform:
  normalize_keys: true
  require_positive: [passenger_count]
destination:
  kind: object_store
  url: {}
"#,
        server.uri(),
        lake.display()
    );

    let config = PipelineConfig::from_yaml_str(&yaml).unwrap();
    let load = run_config(&config).await.unwrap();

    assert_eq!(load.records_written, 1);
    let relative = load.destination.trim_start_matches("file://");
    let written = std::fs::read_to_string(lake.join(relative)).unwrap();
    let row: Value = serde_json::from_str(written.trim()).unwrap();
    assert_eq!(row["vendor_id"], 2);
    assert_eq!(row["trip_distance"], 0.8);
}

#[tokio::test]
async fn test_source_from_config_restarts_from_first_page() {
    let server = MockServer::start().await;
    for page in 1..=2 {
        let body = if page == 1 { json!([ride(1, 1)]) } else { json!([]) };
        Mock::given(method("GET"))
            .and(path("/api/rides"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(2)
            .mount(&server)
            .await;
    }

    let config = PipelineConfig::from_yaml_str(&format!(
        "name: rides\nsource:\n  kind: pages\n  url: {}/api/rides\n",
        server.uri()
    ))
    .unwrap();
    let source = source::from_config(&config.source, HttpClient::new().unwrap(), 10);

    for _ in 0..2 {
        let batches: Vec<_> = source.batches().try_collect().await.unwrap();
        assert_eq!(batches.len(), 1);
    }
}
