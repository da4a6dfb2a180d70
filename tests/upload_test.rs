//! End-to-end runs of the uploader against a mock hosting API

use httpmock::prelude::*;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use sitepush::api::{ApiError, FileError, UploadResult};
use sitepush::config::{BuildInfo, ConfigError, Context, UploadConfig};
use sitepush::outputs::MemoryOutputs;
use sitepush::uploader::{UploadError, UploadStatus, Uploader};

const TOKEN: &str = "test-token";
const SITE: &str = "site-42";

/// `index.html` (10 bytes) and `css/style.css` (20 bytes)
fn site_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("index.html"), "0123456789").unwrap();
    fs::write(dir.path().join("css/style.css"), "01234567890123456789").unwrap();
    dir
}

fn context(server: &MockServer, source_dir: &Path) -> Context {
    let mut config = UploadConfig::new(TOKEN, SITE, server.base_url(), source_dir);
    config.max_retries = 0;
    config.retry_backoff_ms = 0;
    Context {
        config,
        build: BuildInfo {
            run_id: Some("1001".to_string()),
            repository: Some("acme/site".to_string()),
            commit: Some("deadbeef".to_string()),
        },
    }
}

fn files_path() -> String {
    format!("/sites/{SITE}/files")
}

fn mock_probe(server: &MockServer, status: u16) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path(files_path())
            .header("authorization", format!("Bearer {TOKEN}"));
        then.status(status)
            .header("content-type", "application/json")
            .json_body(json!({"files": []}));
    })
}

fn mock_upload<'a>(
    server: &'a MockServer,
    upload_path: &str,
    status: u16,
    body: Value,
) -> httpmock::Mock<'a> {
    let upload_path = upload_path.to_string();
    server.mock(move |when, then| {
        when.method(POST)
            .path(files_path())
            .header("authorization", format!("Bearer {TOKEN}"))
            .query_param("path", upload_path);
        then.status(status)
            .header("content-type", "application/json")
            .json_body(body);
    })
}

#[tokio::test]
async fn uploads_nested_site() {
    let dir = site_dir();
    let server = MockServer::start_async().await;
    let probe = mock_probe(&server, 200);
    let root = mock_upload(&server, "", 200, json!({"ok": true}));
    let css = mock_upload(&server, "css", 200, json!({"ok": true}));

    let mut uploader = Uploader::from_context(context(&server, dir.path()), CancellationToken::new())
        .expect("client");
    uploader.create().await.expect("upload succeeds");

    probe.assert();
    root.assert();
    css.assert();

    assert_eq!(uploader.status(), UploadStatus::Success);
    let info = uploader.info().expect("upload info");
    assert_eq!(info.id, "deadbeef");
    assert_eq!(
        info.result,
        UploadResult {
            total: 2,
            success: 2,
            failed: 0,
            errors: vec![],
            cancelled: false,
        }
    );

    let mut outputs = MemoryOutputs::default();
    uploader.check(&mut outputs).expect("check passes");
    assert_eq!(outputs.get("status"), Some("success"));
    assert_eq!(outputs.get("total_files"), Some("2"));
    assert_eq!(outputs.get("success_files"), Some("2"));
    assert_eq!(outputs.get("failed_files"), Some("0"));
    assert!(outputs.get("duration").is_some());

    let reported: Value = serde_json::from_str(outputs.get("upload_result").unwrap()).unwrap();
    assert_eq!(reported["id"], "deadbeef");
    assert_eq!(reported["total"], 2);
}

#[tokio::test]
async fn one_server_error_fails_the_run_but_not_the_batch() {
    let dir = site_dir();
    let server = MockServer::start_async().await;
    mock_probe(&server, 200);
    let root = mock_upload(&server, "", 200, json!({"ok": true}));
    let css = mock_upload(&server, "css", 500, json!({"message": "storage offline"}));

    let mut uploader = Uploader::from_context(context(&server, dir.path()), CancellationToken::new())
        .expect("client");
    uploader.create().await.expect("batch completes");

    root.assert();
    css.assert();

    assert_eq!(uploader.status(), UploadStatus::Failed);
    let result = &uploader.info().unwrap().result;
    assert_eq!(result.total, 2);
    assert_eq!(result.success, 1);
    assert_eq!(result.failed, 1);
    assert_eq!(
        result.errors,
        vec![FileError {
            file: "css/style.css".to_string(),
            error: "HTTP 500: storage offline".to_string(),
        }]
    );

    let mut outputs = MemoryOutputs::default();
    let err = uploader.check(&mut outputs).unwrap_err();
    assert!(matches!(err, UploadError::PartialFailure { failed: 1, total: 2 }));
    assert_eq!(outputs.get("status"), Some("failed"));
    assert!(outputs.get("total_files").is_none());
    assert_eq!(outputs.warnings.len(), 1);
    assert!(outputs.warnings[0].contains("css/style.css: HTTP 500: storage offline"));
}

#[tokio::test]
async fn transient_errors_are_retried_up_to_the_limit() {
    let dir = site_dir();
    let server = MockServer::start_async().await;
    mock_probe(&server, 200);
    mock_upload(&server, "", 200, json!({}));
    let css = mock_upload(&server, "css", 503, json!({"message": "busy"}));

    let mut ctx = context(&server, dir.path());
    ctx.config.max_retries = 2;

    let mut uploader = Uploader::from_context(ctx, CancellationToken::new()).expect("client");
    uploader.create().await.expect("batch completes");

    css.assert_hits(3);
    assert_eq!(uploader.info().unwrap().result.failed, 1);
}

#[tokio::test]
async fn rejected_token_stops_before_any_upload() {
    let dir = site_dir();
    let server = MockServer::start_async().await;
    mock_probe(&server, 401);
    let uploads = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let mut uploader = Uploader::from_context(context(&server, dir.path()), CancellationToken::new())
        .expect("client");
    let err = uploader.create().await.unwrap_err();

    assert!(matches!(err, UploadError::Api(ApiError::Unauthorized)));
    assert_eq!(uploader.status(), UploadStatus::Failed);
    uploads.assert_hits(0);

    let mut outputs = MemoryOutputs::default();
    assert!(matches!(
        uploader.check(&mut outputs),
        Err(UploadError::NotStarted)
    ));
}

#[tokio::test]
async fn unknown_site_is_reported_by_name() {
    let dir = site_dir();
    let server = MockServer::start_async().await;
    mock_probe(&server, 404);

    let mut uploader = Uploader::from_context(context(&server, dir.path()), CancellationToken::new())
        .expect("client");
    let err = uploader.create().await.unwrap_err();

    assert!(err.to_string().contains(SITE));
}

#[tokio::test]
async fn cancelled_before_first_file_uploads_nothing() {
    let dir = site_dir();
    let server = MockServer::start_async().await;
    mock_probe(&server, 200);
    let uploads = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut uploader =
        Uploader::from_context(context(&server, dir.path()), cancel).expect("client");
    uploader.create().await.expect("batch stops cleanly");

    uploads.assert_hits(0);
    assert_eq!(uploader.status(), UploadStatus::Cancelled);
    let result = &uploader.info().unwrap().result;
    assert!(result.cancelled);
    assert_eq!(result.total, 2);
    assert_eq!(result.success + result.failed, 0);

    let mut outputs = MemoryOutputs::default();
    assert!(matches!(
        uploader.check(&mut outputs),
        Err(UploadError::Cancelled)
    ));
    assert_eq!(outputs.get("status"), Some("cancelled"));
}

#[tokio::test]
async fn missing_site_id_fails_before_network() {
    let server = MockServer::start_async().await;
    let any = server.mock(|when, then| {
        when.path(files_path());
        then.status(200);
    });

    let vars = HashMap::from([
        ("INPUT_API_TOKEN".to_string(), TOKEN.to_string()),
        ("INPUT_API_BASE_URL".to_string(), server.base_url()),
    ]);
    let result = Context::load_from_sources(
        None,
        config::Environment::with_prefix("INPUT").source(Some(vars)),
        BuildInfo::default(),
    );

    let err = result.unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
    assert!(err.to_string().contains("site_id"));
    any.assert_hits(0);
}
