//! Common test utilities for media-dl integration tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use media_dl::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tower::ServiceExt;

pub const TOKEN: &str = "integration-token";

/// Stand-in for yt-dlp that honors `-P`, `-x` and the trailing URL
///
/// URLs containing "bad" fail the way yt-dlp does. Everything else writes
/// `Fake Title.<mp3|mp4>` containing the URL and prints the info line.
const FAKE_YTDLP: &str = r#"#!/bin/sh
dir=""
audio=0
url=""
while [ $# -gt 0 ]; do
  case "$1" in
    -P) shift; dir="$1" ;;
    -x) audio=1 ;;
    --) shift; url="$1" ;;
  esac
  shift
done
case "$url" in
  *bad*) echo "ERROR: Unsupported URL: $url" >&2; exit 1 ;;
esac
if [ "$audio" = 1 ]; then ext=mp3; else ext=mp4; fi
printf '%s' "$url" > "$dir/Fake Title.$ext"
echo '{"title": "Fake Title", "ext": "webm"}'
"#;

/// Write the fake yt-dlp into `dir` and make it executable
#[cfg(unix)]
pub fn write_fake_ytdlp(dir: &Path) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("yt-dlp");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(FAKE_YTDLP.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Config rooted in `dir` with the test token
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = dir.join("downloads");
    config.download.shutdown_timeout = Duration::from_secs(5);
    config.api.token = TOKEN.to_string();
    config.tools.search_path = false;
    config
}

pub fn get(uri: &str, token: Option<&str>) -> Request {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-Auth-Token", TOKEN)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_upload(uri: &str, contents: &str) -> Request {
    let boundary = "media-dl-it";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"urls.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("X-Auth-Token", TOKEN)
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll the status endpoint until the job is done or failed (panics after 10s)
pub async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/status/{job_id}"), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job = json_body(response).await;
        if matches!(job["status"].as_str(), Some("done" | "error")) {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} did not finish: {job}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
