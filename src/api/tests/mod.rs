use super::*;
use crate::media::MediaFetcher;
use crate::service::test_helpers::{ScriptedFetcher, create_test_service};
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Token configured by `create_test_service`
const TOKEN: &str = "test-token";

const BOUNDARY: &str = "media-dl-test-boundary";

/// Router plus the service behind it and the tempdir (which must be kept alive)
async fn create_test_app(
    fetcher: Arc<dyn MediaFetcher>,
) -> (Router, Arc<DownloadService>, tempfile::TempDir) {
    let (service, temp_dir) = create_test_service(fetcher).await;
    let service = Arc::new(service);
    let app = create_router(service.clone(), service.get_config());
    (app, service, temp_dir)
}

fn get_with_token(uri: &str) -> Request {
    Request::builder()
        .uri(uri)
        .header("X-Auth-Token", TOKEN)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value, token: Option<&str>) -> Request {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Multipart body from `(name, file_name, contents)` parts
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, contents) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: text/plain\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn post_multipart(uri: &str, body: Vec<u8>, token: Option<&str>) -> Request {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Poll GET /api/status until the job is terminal (panics after 5s)
async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app
            .clone()
            .oneshot(get_with_token(&format!("/api/status/{job_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job = json_body(response).await;
        let status = job["status"].as_str().unwrap().to_string();
        if status == "done" || status == "error" {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} stuck in {status}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_api_server_serves_and_shuts_down() {
    let (service, _temp_dir) = create_test_service(Arc::new(ScriptedFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = (*service.get_config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(serve_with_shutdown(service, config, async {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_index_is_public() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(ScriptedFetcher::new())).await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/api/download"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(ScriptedFetcher::new())).await;

    let response = app.oneshot(get_with_token("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(ScriptedFetcher::new())).await;

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .header("X-Auth-Token", TOKEN)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, _temp_dir) = create_test_service(Arc::new(ScriptedFetcher::new())).await;
    let service = Arc::new(service);
    let mut config = (*service.get_config()).clone();
    config.api.cors_enabled = false;
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .header("X-Auth-Token", TOKEN)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (service, _temp_dir) = create_test_service(Arc::new(ScriptedFetcher::new())).await;
    let service = Arc::new(service);
    let mut config = (*service.get_config()).clone();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://allowed.example")
        .header("X-Auth-Token", TOKEN)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://allowed.example"
    );
}
