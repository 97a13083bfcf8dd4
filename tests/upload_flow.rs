// End-to-end runs of the upload flow against a mock drive server.

use catdisk::api::DiskClient;
use catdisk::image::CatImageProvider;
use catdisk::manifest::DEFAULT_VIEWER_URL;
use catdisk::ui::{run_upload, Outcome, PollSettings, RunSettings, Stage, UploadRequest};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;

fn drive_for(server: &MockServer) -> DiskClient {
    DiskClient::new(&server.base_url(), "tok", Duration::from_secs(5)).unwrap()
}

fn settings(dir: &tempfile::TempDir) -> RunSettings {
    RunSettings {
        poll: PollSettings {
            attempts: 20,
            interval: Duration::ZERO,
        },
        output_dir: dir.path().to_path_buf(),
        viewer_url: DEFAULT_VIEWER_URL.to_string(),
        show_progress: false,
    }
}

fn request() -> UploadRequest {
    UploadRequest {
        text: "hi".into(),
        group: "cats".into(),
    }
}

#[test]
fn successful_upload_writes_manifest() {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/disk/")
            .header("authorization", "OAuth tok");
        then.status(200).json_body(json!({"total_space": 1}));
    });
    let folder = server.mock(|when, then| {
        when.method(PUT)
            .path("/v1/disk/resources")
            .query_param("path", "cats");
        then.status(201);
    });
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/disk/resources/upload")
            .query_param("path", "cats/hi.jpg")
            .query_param("url", "https://cataas.com/cat/says/hi");
        then.status(202).json_body(json!({
            "href": "https://cloud-api.yandex.net/v1/disk/operations?operation_id=ABC123",
            "method": "GET"
        }));
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/v1/disk/operations/ABC123");
        then.status(200).json_body(json!({"status": "success"}));
    });
    let info = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/disk/resources")
            .query_param("path", "cats/hi.jpg");
        then.status(200)
            .json_body(json!({"name": "hi.jpg", "path": "cats/hi.jpg", "size": 1234}));
    });

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_upload(
        &drive_for(&server),
        &CatImageProvider::default(),
        &request(),
        &settings(&dir),
    )
    .unwrap();

    token.assert();
    folder.assert();
    upload.assert();
    status.assert_calls(1);
    info.assert();

    let manifest_path = match outcome {
        Outcome::Completed { manifest_path, .. } => manifest_path,
        other => panic!("expected a completed run, got {other:?}"),
    };
    let name = manifest_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("backup_info_") && name.ends_with(".json"), "{name}");

    let raw = fs::read_to_string(&manifest_path).unwrap();
    let written: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(written["file_name"], "hi.jpg");
    assert_eq!(written["file_path"], "cats/hi.jpg");
    assert_eq!(written["file_size"], 1234);
    assert_eq!(written["group_name"], "cats");
    assert_eq!(written["text"], "hi");
    assert_eq!(written["source_url"], "https://cataas.com/cat/says/hi");
    assert_eq!(
        written["yandex_disk_url"],
        "https://disk.yandex.ru/client/disk/cats"
    );
    assert!(written["timestamp"].as_str().is_some_and(|t| t.contains('T')));
}

#[test]
fn rejected_token_makes_no_further_calls() {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(GET).path("/v1/disk/");
        then.status(401).json_body(json!({"error": "UnauthorizedError"}));
    });
    let folder = server.mock(|when, then| {
        when.method(PUT).path("/v1/disk/resources");
        then.status(201);
    });

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_upload(
        &drive_for(&server),
        &CatImageProvider::default(),
        &request(),
        &settings(&dir),
    )
    .unwrap();

    token.assert();
    folder.assert_calls(0);
    assert!(matches!(outcome, Outcome::Aborted(Stage::Token)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn existing_folder_and_slow_operation() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/disk/");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(PUT).path("/v1/disk/resources");
        then.status(409).json_body(json!({"error": "DiskPathPointsToExistentDirectoryError"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1/disk/resources/upload");
        then.status(202)
            .json_body(json!({"href": "https://h/v1/disk/operations?operation_id=slow"}));
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/v1/disk/operations/slow");
        then.status(200)
            .json_body(json!({"status": "in-progress", "progress": 0.5}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/disk/resources");
        then.status(404);
    });

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_upload(
        &drive_for(&server),
        &CatImageProvider::default(),
        &request(),
        &settings(&dir),
    )
    .unwrap();

    // every attempt is spent, then the lookup decides the result
    status.assert_calls(20);
    assert!(matches!(outcome, Outcome::FileMissing));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
