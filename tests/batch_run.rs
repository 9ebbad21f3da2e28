use avm_batch::config::{Config, InputFormat};
use avm_batch::orchestrator::{App, RunOptions};
use avm_batch::storage::{LocalObjectStore, MemoryObjectStore, ObjectStore};
use avm_batch::utils::RunLog;
use avm_batch::ValuationOutcome;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn portfolio(n: usize) -> String {
    let records: Vec<Value> = (1..=n)
        .map(|i| {
            json!({
                "address": format!("{} Grand Lake Dr, San Antonio, TX", i),
                "propertyType": "Single Family",
                "bedrooms": 3,
                "squareFootage": if i % 2 == 0 { json!(1878) } else { json!(0) },
            })
        })
        .collect();
    serde_json::to_string(&records).unwrap()
}

fn write_secret(dir: &Path, name: &str, key: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), key).unwrap();
    let checksum = hex::encode(Sha256::digest(key.as_bytes()));
    std::fs::write(dir.join(format!("{}.sha256", name)), checksum).unwrap();
}

async fn mount_avm(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/avm/value"))
        .and(query_param("address", "7 Grand Lake Dr, San Antonio, TX"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no comparables"))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/avm/value"))
        .and(header("X-Api-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "price": 250000,
            "priceRangeLow": 199000,
            "priceRangeHigh": 301000,
            "comparables": []
        })))
        .with_priority(5)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_local_run_against_mock_api() {
    let server = MockServer::start().await;
    mount_avm(&server).await;

    let temp_dir = TempDir::new().unwrap();
    let bucket = temp_dir.path().join("bucket");
    let secrets_dir = temp_dir.path().join("secrets");
    write_secret(&secrets_dir, "rentcast-api-key", "secret-key\n");

    let input = bucket.join("avm_input/portfolio.json");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(&input, portfolio(250)).unwrap();

    let config = Config {
        api_base_url: format!("{}/v1", server.uri()),
        storage_root: bucket.display().to_string(),
        secrets_dir: Some(secrets_dir.display().to_string()),
        batch_capacity: 100,
        write_csv: true,
        ..Default::default()
    };

    let app = App::initialize(config, RunOptions::default(), RunLog::default())
        .await
        .unwrap();
    let summary = app.run().await;

    assert_eq!(summary.total, 250);
    assert_eq!(summary.success, 249);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.batches, 3);

    let store = LocalObjectStore::new(&bucket);
    let results = store.list("avm_results/").await.unwrap();
    let json_files: Vec<&String> = results.iter().filter(|k| k.ends_with(".json")).collect();
    assert_eq!(json_files.len(), 3);
    assert!(json_files[0].ends_with("_001.json"));
    assert!(json_files[2].ends_with("_003.json"));
    assert_eq!(results.iter().filter(|k| k.ends_with(".csv")).count(), 3);

    let first: Vec<ValuationOutcome> =
        serde_json::from_str(&store.download_text(json_files[0]).await.unwrap()).unwrap();
    assert_eq!(first.len(), 100);
    assert_eq!(first[0].address(), "1 Grand Lake Dr, San Antonio, TX");
    assert_eq!(
        first[6],
        ValuationOutcome::http_error("7 Grand Lake Dr, San Antonio, TX", 404, "no comparables")
    );

    let last: Vec<ValuationOutcome> =
        serde_json::from_str(&store.download_text(json_files[2]).await.unwrap()).unwrap();
    assert_eq!(last.len(), 50);

    assert!(!input.exists());
    assert_eq!(store.list("avm_processed/").await.unwrap().len(), 1);
    assert_eq!(store.list("avm_logs/").await.unwrap(), vec![app.run_log_key()]);
}

#[tokio::test]
async fn test_square_footage_only_sent_when_positive() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let bucket = temp_dir.path().join("bucket");

    let input = bucket.join("avm_input/portfolio.json");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(&input, portfolio(2)).unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"price": 1})))
        .mount(&server)
        .await;

    let config = Config {
        api_key: Some("explicit".to_string()),
        api_base_url: format!("{}/v1", server.uri()),
        storage_root: bucket.display().to_string(),
        ..Default::default()
    };
    let app = App::initialize(config, RunOptions::default(), RunLog::default())
        .await
        .unwrap();
    app.run().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let has_sqft = |i: usize| {
        requests[i]
            .url
            .query_pairs()
            .any(|(k, _)| k == "squareFootage")
    };
    assert!(!has_sqft(0));
    assert!(has_sqft(1));
    assert_eq!(
        requests[1].headers.get("X-Api-Key").unwrap().to_str().unwrap(),
        "explicit"
    );
}

#[tokio::test]
async fn test_missing_secret_is_setup_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        storage_root: temp_dir.path().join("bucket").display().to_string(),
        secrets_dir: Some(temp_dir.path().join("empty").display().to_string()),
        ..Default::default()
    };

    let result = App::initialize(config, RunOptions::default(), RunLog::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_portfolio_exits_cleanly() {
    let store = MemoryObjectStore::new();
    store
        .upload_text("avm_input/portfolio.json", "{not json", "application/json")
        .await
        .unwrap();

    let app = App::from_parts(
        Config::default(),
        Box::new(store.clone()),
        Box::new(avm_batch::StubValuationClient::new().unwrap()),
        RunLog::default(),
    );
    let summary = app.run().await;

    assert_eq!(summary.total, 0);
    assert!(store.contains("avm_input/portfolio.json"));
    assert!(store.list("avm_results/").await.unwrap().is_empty());
}

#[test]
fn test_config_file_then_dry_run() {
    let temp_dir = TempDir::new().unwrap();
    let bucket = temp_dir.path().join("bucket");
    std::fs::create_dir_all(bucket.join("in")).unwrap();
    std::fs::write(bucket.join("in/addresses.txt"), "1 Main St\n\n2 Oak Ave\n").unwrap();

    let config_path = temp_dir.path().join("avm.toml");
    std::fs::write(
        &config_path,
        format!(
            "storage_root = {:?}\ninput_object = \"in/addresses.txt\"\ninput_format = \"address_list\"\ncomp_count = 40\n",
            bucket.display().to_string()
        ),
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.input_format, InputFormat::AddressList);

    let summary = tokio_test::block_on(async {
        let app = App::initialize(config, RunOptions { dry_run: true }, RunLog::default())
            .await
            .unwrap();
        app.run().await
    });

    assert_eq!(summary.total, 2);
    assert_eq!(summary.success, 2);
    assert!(bucket.join("in/addresses.txt").exists());
}
