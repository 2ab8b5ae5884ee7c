//! HTTP API tests against the real router.

use std::{
    fs,
    io::{Cursor, Write},
    path::Path,
};

use axum::{Router, http::StatusCode, routing::get};
use axum_test::TestServer;
use designset::server::{AppState, create_router};
use designset_core::Settings;
use serde_json::{Value, json};
use tempfile::TempDir;
use zip::{ZipWriter, write::SimpleFileOptions};

const TOP: &str = "<html><head><title><{ page.title }></title><{ makeshop.head }></head>\
<body><{ module.header }><h1><{ shop.name }></h1><{ module.footer }></body></html>";

fn write_files(root: &Path, files: &[(&str, &[u8])]) {
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
}

fn demo_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("designset-demo/standard/html/top.html", TOP.as_bytes()),
            ("designset-demo/standard/css/common.css", b"body{margin:0}"),
            ("designset-demo/standard/css/top.css", b".top{}"),
            ("designset-demo/_module_/header.html", b"<header><{ shop.name }></header>"),
            ("designset-demo/_module_/footer.html", b"<footer><{ shop.tel }></footer>"),
            ("designset-demo/config.json", br#"{"theme": "demo"}"#),
        ],
    );
    dir
}

fn server_for(root: &Path) -> TestServer {
    let mut settings = Settings::default();
    settings.designsets.root = root.to_path_buf();
    let state = AppState::new(settings).unwrap();
    TestServer::new(create_router(state)).unwrap()
}

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Serve `bytes` at `/set.zip` on an ephemeral port and return the base URL.
async fn serve_archive(bytes: Vec<u8>) -> String {
    let app = Router::new().route(
        "/set.zip",
        get(move || {
            let bytes = bytes.clone();
            async move { bytes }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_render_end_to_end() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({
            "designset": "designset-demo",
            "template": "top.html",
            "data": {"shop": {"name": "Acme"}}
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");

    let page = body["page"].as_str().unwrap();
    assert!(page.contains("<h1>Acme</h1>"));
    assert!(page.contains("<header>Acme</header>"));
    assert!(page.contains("<footer>03-1234-5678</footer>"));
    assert!(page.contains("/designsets/designset-demo/standard/css/top.css"));
}

#[tokio::test]
async fn test_render_inline_flag() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"template": "top.html", "inline": true}))
        .await;

    let body: Value = response.json();
    let page = body["page"].as_str().unwrap();
    assert!(page.contains("/* common.css */\nbody{margin:0}"));
    assert!(page.contains("/* top.css */\n.top{}"));
    assert!(!page.contains("<link"));
}

#[tokio::test]
async fn test_default_design_set() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"template": "top.html"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert!(body["page"].as_str().unwrap().contains("サンプルショップ"));
}

#[tokio::test]
async fn test_validation_failures() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"designset": "designset-demo"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["reason_code"], 400);
    assert!(body["reason"].as_str().unwrap().contains("template"));

    let response = server.post("/api/render").text("{not json").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/render")
        .json(&json!({"template": "top.html", "data": [1, 2]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_no_design_sets_is_a_validation_error() {
    let root = tempfile::tempdir().unwrap();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"template": "top.html"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["reason"].as_str().unwrap().contains("no design set found"));
}

#[tokio::test]
async fn test_missing_template_is_500() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"designset": "designset-demo", "template": "nope.html"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["reason_code"], 500);
    assert!(
        body["reason"]
            .as_str()
            .unwrap()
            .contains("designset-demo/standard/html/nope.html")
    );
}

#[tokio::test]
async fn test_non_post_is_405() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server.get("/api/render").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["reason_code"], 405);

    let response = server.put("/api/render").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_remote_archive_render() {
    let base = serve_archive(zip_bytes(&[
        ("config.json", br#"{"theme": "remote"}"#),
        (
            "standard/html/top.html",
            b"<html><head><link rel=\"stylesheet\" href=\"standard/css/common.css\"></head>\
<body><{ config.theme }> <{ shop.name }></body></html>",
        ),
        ("standard/css/common.css", b".remote{}"),
    ]))
    .await;

    let root = tempfile::tempdir().unwrap();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({
            "designset": "ignored",
            "template": "top.html",
            "cdar_url": format!("{base}/set.zip"),
            "data": {"shop": {"name": "Remote Shop"}}
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let page = body["page"].as_str().unwrap();
    assert!(page.contains("<body>remote Remote Shop</body>"));
    assert!(page.contains("/* common.css */\n.remote{}"));
    assert!(!page.contains("href=\"standard/css/common.css\""));
}

#[tokio::test]
async fn test_remote_download_failure() {
    let base = serve_archive(Vec::new()).await;
    let root = tempfile::tempdir().unwrap();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"template": "top.html", "cdar_url": format!("{base}/missing.zip")}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body["reason"],
        "remote archive processing failed: download failed: HTTP 404"
    );
}

#[tokio::test]
async fn test_remote_corrupt_archive() {
    let base = serve_archive(b"not a zip archive".to_vec()).await;
    let root = tempfile::tempdir().unwrap();
    let server = server_for(root.path());

    let response = server
        .post("/api/render")
        .json(&json!({"template": "top.html", "cdar_url": format!("{base}/set.zip")}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    let reason = body["reason"].as_str().unwrap();
    assert!(reason.starts_with("remote archive processing failed: archive extraction failed"));
}

#[tokio::test]
async fn test_static_files() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server
        .get("/designsets/designset-demo/standard/css/common.css")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "text/css; charset=utf-8");
    assert_eq!(response.text(), "body{margin:0}");

    let response = server
        .get("/designsets/designset-demo/standard/css/missing.css")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_files_stay_inside_design_set() {
    let root = demo_root();
    write_files(
        root.path(),
        &[
            ("designset.toml", b"token = 'abc'"),
            ("designset-other/config.json", br#"{"b": 1}"#),
            ("standard/css/shared.css", b".shared{}"),
        ],
    );
    let server = server_for(root.path());

    for path in [
        "/designsets/designset-demo/designset.toml",
        "/designsets/designset-demo/designset-other/config.json",
        "/designsets/designset-demo/standard/css/shared.css",
    ] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_preview_context_and_index() {
    let root = demo_root();
    let server = server_for(root.path());

    let response = server.get("/preview/designset-demo/top.html").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("<h1>サンプルショップ</h1>"));

    let response = server.get("/preview/designset-demo/nope.html").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/context/designset-demo").await;
    let context: Value = response.json();
    assert_eq!(context["config"]["theme"], "demo");
    assert_eq!(context["module"]["header"], "<header>サンプルショップ</header>");

    let response = server.get("/").await;
    let index = response.text();
    assert!(index.contains("designset-demo"));
    assert!(index.contains("/preview/designset-demo/top.html"));
}
