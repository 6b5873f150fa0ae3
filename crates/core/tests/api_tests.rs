//! Library API integration tests
use std::time::Duration;

use pocketshot_core::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &str = r#"{
    "status": 1,
    "complete": 1,
    "since": 1700000000,
    "list": {
        "100": {
            "item_id": "100",
            "given_url": "https://example.com/given",
            "resolved_url": "",
            "given_title": "Given title",
            "resolved_title": "",
            "excerpt": "first",
            "has_image": "0",
            "has_video": "0",
            "sort_id": 5
        },
        "200": {
            "item_id": "200",
            "given_url": "https://pics.example/cat",
            "resolved_url": "https://pics.example/cat.jpg",
            "given_title": "",
            "resolved_title": "A cat",
            "excerpt": "",
            "has_image": "2",
            "has_video": "0",
            "sort_id": 1
        },
        "300": {
            "item_id": "300",
            "given_url": "https://youtu.be/abc",
            "resolved_url": "https://www.youtube.com/watch?v=abc",
            "given_title": "",
            "resolved_title": "A video",
            "excerpt": "",
            "has_image": "1",
            "has_video": "2",
            "images": {"1": {"item_id": "300", "image_id": "1", "src": "https://i.ytimg.com/vi/abc/hqdefault.jpg"}},
            "sort_id": 3
        }
    }
}"#;

struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self { tmp: TempDir::new().unwrap() }
    }

    fn config(&self, server: &MockServer) -> Config {
        Config {
            api_base: format!("{}/v3", server.uri()),
            images_dir: self.tmp.path().join("images"),
            cache_dir: self.tmp.path().join("cache"),
            generate_images: false,
            request_timeout: Duration::from_secs(5),
            ..Config::default()
        }
    }
}

fn credentials() -> Credentials {
    Credentials { consumer_key: "key".into(), access_token: "token".into() }
}

async fn source(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/get"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_generate_snapshot_without_image_generation() {
    let server = source(200, PAYLOAD).await;
    let ws = Workspace::new();
    let config = ws.config(&server);

    std::fs::create_dir_all(&config.images_dir).unwrap();
    std::fs::write(config.images_dir.join("300.png"), b"thumb").unwrap();

    let batch = generate_snapshot(&config, credentials()).await.unwrap();
    assert_eq!(batch.stats.cached, 1);
    assert_eq!(batch.stats.skipped, 2);

    let items = read_snapshot(&config.snapshot_path()).await.unwrap();
    let ids: Vec<u64> = items.iter().map(|i| i.item_id).collect();
    assert_eq!(ids, vec![200, 300, 100]);

    assert_eq!(items[0].content_type, ContentType::Image);
    assert_eq!(items[0].title, "A cat");
    assert_eq!(items[1].content_type, ContentType::Video);
    assert_eq!(items[1].image, "http://localhost:4000/images/300.png");
    assert_eq!(items[2].title, "Given title");
    assert_eq!(items[2].url, "https://example.com/given");
    assert!(items[2].image.is_empty());
}

#[tokio::test]
async fn test_snapshot_is_stable_across_runs() {
    let server = source(200, PAYLOAD).await;
    let ws = Workspace::new();
    let config = ws.config(&server);

    generate_snapshot(&config, credentials()).await.unwrap();
    let first = std::fs::read_to_string(config.snapshot_path()).unwrap();
    generate_snapshot(&config, credentials()).await.unwrap();
    let second = std::fs::read_to_string(config.snapshot_path()).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_source_failure_leaves_snapshot_untouched() {
    let server = source(503, "unavailable").await;
    let ws = Workspace::new();
    let config = ws.config(&server);

    std::fs::create_dir_all(&config.cache_dir).unwrap();
    std::fs::write(config.snapshot_path(), "previous").unwrap();

    let err = generate_snapshot(&config, credentials()).await.unwrap_err();
    assert!(matches!(err, PocketshotError::UnexpectedStatus { status: 503, .. }));
    assert_eq!(std::fs::read_to_string(config.snapshot_path()).unwrap(), "previous");
}

#[tokio::test]
async fn test_malformed_payload_writes_nothing() {
    let server = source(200, "{\"list\": 42}").await;
    let ws = Workspace::new();
    let config = ws.config(&server);

    let err = generate_snapshot(&config, credentials()).await.unwrap_err();
    assert!(matches!(err, PocketshotError::MalformedPayload(_)));
    assert!(!config.snapshot_path().exists());
}

#[tokio::test]
async fn test_run_timeout_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let ws = Workspace::new();
    let config = Config { run_timeout: Duration::from_millis(200), ..ws.config(&server) };

    let err = generate_snapshot(&config, credentials()).await.unwrap_err();
    assert!(matches!(err, PocketshotError::RunTimeout { .. }));
    assert!(!config.snapshot_path().exists());
}

#[tokio::test]
async fn test_run_timeout_cancels_image_download() {
    let server = MockServer::start().await;
    let payload = format!(
        r#"{{"status": 1, "list": {{"200": {{"item_id": "200", "resolved_url": "{}/cat.jpg", "has_image": "2", "sort_id": 1}}}}}}"#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/v3/get"))
        .respond_with(ResponseTemplate::new(200).set_body_string(payload))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cat.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;
    let ws = Workspace::new();
    let config = Config { generate_images: true, run_timeout: Duration::from_millis(300), ..ws.config(&server) };

    let err = generate_snapshot(&config, credentials()).await.unwrap_err();
    assert!(matches!(err, PocketshotError::RunTimeout { .. }));
    assert!(!config.snapshot_path().exists());
    assert!(!config.images_dir.join("200.png").exists());
    assert!(!config.images_dir.join("200.png.part").exists());
}

#[tokio::test]
async fn test_empty_list_writes_empty_snapshot() {
    let server = source(200, r#"{"status": 2, "complete": 1, "list": []}"#).await;
    let ws = Workspace::new();
    let config = ws.config(&server);

    let batch = generate_snapshot(&config, credentials()).await.unwrap();
    assert_eq!(batch.stats.total(), 0);
    assert_eq!(std::fs::read_to_string(config.snapshot_path()).unwrap(), "[]");
}
