//! Integration tests for the fetch-validate-persist pipeline.
//!
//! These tests drive the full pipeline against mock HTTP servers and verify
//! the on-disk artifacts and the metadata store.

use std::time::Duration;

use harvester_core::{
    BROWSER_USER_AGENT, Candidate, Config, DownloadPipeline, DownloadStatus, MetadataRecord,
    MetadataStore,
};
use tempfile::TempDir;
use wiremock::matchers::{headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(dir: &TempDir) -> Config {
    Config {
        download_dir: dir.path().to_path_buf(),
        metadata_path: dir.path().join("records.json"),
        min_size_kb: 10,
        request_timeout: Duration::from_secs(5),
        fallback_transport_enabled: false,
        delay_ms: (0, 0),
        page_range: None,
    }
}

/// A body comfortably above the 10 KiB threshold.
fn pdf_body() -> Vec<u8> {
    let mut body = b"%PDF-1.4\n".to_vec();
    body.resize(50 * 1024, b'x');
    body
}

async fn mount_pdf(server: &MockServer, at: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/pdf"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_download_creates_decoded_filename() {
    // Percent-encoded suggestion, 50 KiB PDF body.
    let server = MockServer::start().await;
    mount_pdf(&server, "/doc", pdf_body()).await;
    let dir = TempDir::new().unwrap();

    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidate = Candidate::new(format!("{}/doc", server.uri()), "doc%20A");
    let result = pipeline.process(&candidate).await;

    assert_eq!(result.status, DownloadStatus::Success);
    assert_eq!(result.identifier, "doc A");
    assert_eq!(result.byte_size, 50 * 1024);

    let file_path = dir.path().join("doc A.pdf");
    assert!(file_path.exists(), "expected doc A.pdf to be created");
    assert_eq!(std::fs::read(&file_path).unwrap().len(), 50 * 1024);
}

#[tokio::test]
async fn test_undersized_body_rejected_and_nothing_written() {
    let server = MockServer::start().await;
    mount_pdf(&server, "/tiny", vec![b'x'; 2 * 1024]).await;
    let dir = TempDir::new().unwrap();

    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidate = Candidate::new(format!("{}/tiny", server.uri()), "tiny");
    let result = pipeline.process(&candidate).await;

    assert!(
        matches!(result.status, DownloadStatus::Rejected(_)),
        "expected rejection, got {:?}",
        result.status
    );
    assert!(
        !dir.path().join("tiny.pdf").exists(),
        "undersized artifact must never persist"
    );
}

#[tokio::test]
async fn test_wrong_content_type_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/challenge"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![b'x'; 50 * 1024], "text/html"),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidate = Candidate::new(format!("{}/challenge", server.uri()), "challenge");
    let result = pipeline.process(&candidate).await;

    assert!(matches!(result.status, DownloadStatus::Rejected(_)));
    assert!(!dir.path().join("challenge.pdf").exists());
}

#[tokio::test]
async fn test_http_error_becomes_failed_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidate = Candidate::new(format!("{}/missing", server.uri()), "missing");
    let result = pipeline.process(&candidate).await;

    match &result.status {
        DownloadStatus::Failed(message) => assert!(message.contains("404"), "got: {message}"),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(!dir.path().join("missing.pdf").exists());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    mount_pdf(&server, "/a", pdf_body()).await;
    mount_pdf(&server, "/b", pdf_body()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let candidates = vec![
        Candidate::new(format!("{}/a", server.uri()), "alpha"),
        Candidate::new(format!("{}/b", server.uri()), "beta"),
    ];

    let pipeline = DownloadPipeline::new(&config);
    let (first, first_stats) = pipeline.run(&candidates).await;
    assert_eq!(first_stats.succeeded, 2);

    let store = MetadataStore::new(&config.metadata_path);
    let records: Vec<MetadataRecord> = first
        .iter()
        .zip(&candidates)
        .map(|(r, c)| {
            MetadataRecord::new(&r.identifier, &c.source_url, r.file_path.to_string_lossy())
        })
        .collect();
    assert_eq!(store.merge(&records).await.unwrap(), 2);

    // Second run: same candidates, no external changes.
    let (second, second_stats) = pipeline.run(&candidates).await;
    assert_eq!(second_stats.skipped, 2, "every item must short-circuit");
    assert_eq!(second_stats.succeeded, 0);
    for result in &second {
        assert_eq!(result.status, DownloadStatus::SkippedExisting);
    }
    // Merging again adds zero new records.
    assert_eq!(store.merge(&records).await.unwrap(), 2);
}

#[tokio::test]
async fn test_corrupt_prior_artifact_purged_and_refetched() {
    let server = MockServer::start().await;
    mount_pdf(&server, "/doc", pdf_body()).await;
    let dir = TempDir::new().unwrap();

    // A prior run left an undersized (corrupt) file at the target path.
    std::fs::write(dir.path().join("doc.pdf"), b"interrupted").unwrap();

    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidate = Candidate::new(format!("{}/doc", server.uri()), "doc");
    let result = pipeline.process(&candidate).await;

    assert_eq!(result.status, DownloadStatus::Success);
    assert_eq!(
        std::fs::read(dir.path().join("doc.pdf")).unwrap().len(),
        50 * 1024,
        "corrupt artifact must be replaced by the real document"
    );
}

#[tokio::test]
async fn test_fallback_transport_recovers_from_anti_bot_status() {
    let server = MockServer::start().await;
    // Browser UA gets the document; anything else gets a challenge status.
    Mock::given(method("GET"))
        .and(path("/guarded"))
        // wiremock's header matcher splits incoming values on commas, and the
        // browser UA contains "(KHTML, like Gecko)"; match the split parts.
        .and(headers(
            "user-agent",
            BROWSER_USER_AGENT.split(',').map(str::trim).collect(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_raw(pdf_body(), "application/pdf"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(10)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = Config {
        fallback_transport_enabled: true,
        ..test_config(&dir)
    };

    let pipeline = DownloadPipeline::new(&config);
    let candidate = Candidate::new(format!("{}/guarded", server.uri()), "guarded");
    let result = pipeline.process(&candidate).await;

    assert_eq!(result.status, DownloadStatus::Success);
    assert!(dir.path().join("guarded.pdf").exists());
}

#[tokio::test]
async fn test_fallback_disabled_fails_on_anti_bot_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidate = Candidate::new(format!("{}/guarded", server.uri()), "guarded");
    let result = pipeline.process(&candidate).await;

    match &result.status {
        DownloadStatus::Failed(message) => assert!(message.contains("403"), "got: {message}"),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_mixes_outcomes_without_aborting() {
    let server = MockServer::start().await;
    mount_pdf(&server, "/good", pdf_body()).await;
    mount_pdf(&server, "/small", vec![b'x'; 1024]).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let pipeline = DownloadPipeline::new(&test_config(&dir));
    let candidates = vec![
        Candidate::new(format!("{}/good", server.uri()), "good"),
        Candidate::new(format!("{}/small", server.uri()), "small"),
        Candidate::new(format!("{}/gone", server.uri()), "gone"),
    ];

    let (results, stats) = pipeline.run(&candidates).await;
    assert_eq!(results.len(), 3);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.failed, 1);
    assert!(dir.path().join("good.pdf").exists());
    assert!(!dir.path().join("small.pdf").exists());
    assert!(!dir.path().join("gone.pdf").exists());
}

#[tokio::test]
async fn test_success_flows_into_store_once() {
    // End-to-end: download then merge, twice; one record survives.
    let server = MockServer::start().await;
    mount_pdf(&server, "/doc", pdf_body()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let pipeline = DownloadPipeline::new(&config);
    let candidate = Candidate::new(format!("{}/doc", server.uri()), "doc%20A");
    let store = MetadataStore::new(&config.metadata_path);

    for _ in 0..2 {
        let result = pipeline.process(&candidate).await;
        assert!(result.has_artifact());
        let record = MetadataRecord::new(
            &result.identifier,
            &candidate.source_url,
            result.file_path.to_string_lossy(),
        )
        .with_attribute("byte_size", result.byte_size.to_string());
        assert_eq!(store.merge(&[record]).await.unwrap(), 1);
    }

    let records = store.load().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier, "doc A");
    assert_eq!(records[0].attributes.get("byte_size").unwrap(), "51200");
}
