use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;
use crate::config::Config;
use crate::scoring::cosine_similarity;

/// Serves one canned HTTP response and hands back the raw request it received.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind listener");
    let addr = listener.local_addr().expect("should have local addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("should accept");
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.expect("should read request");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("should write response");
        String::from_utf8_lossy(&raw).to_string()
    });

    (format!("http://{addr}/v1"), handle)
}

#[test]
fn test_http_config_endpoint() {
    let config = HttpEmbedderConfig::new("https://api.example.com/v1/", "text-embedding-3-small");
    assert_eq!(config.endpoint(), "https://api.example.com/v1/embeddings");
}

#[test]
fn test_http_config_rejects_bad_url() {
    let result = HttpEmbedder::new(HttpEmbedderConfig::new("ftp://example.com", "m"));
    assert!(matches!(result, Err(EmbeddingError::InvalidConfig { .. })));

    let result = HttpEmbedder::new(HttpEmbedderConfig::new("http://example.com", "  "));
    assert!(matches!(result, Err(EmbeddingError::InvalidConfig { .. })));
}

#[test]
fn test_http_config_from_config() {
    assert!(HttpEmbedderConfig::from_config(&Config::default()).is_none());

    let config = Config {
        embedding_url: Some("http://localhost:9000/v1".to_string()),
        embedding_api_key: Some("secret".to_string()),
        embedding_timeout_ms: 250,
        ..Default::default()
    };
    let http = HttpEmbedderConfig::from_config(&config).expect("should build http config");
    assert_eq!(http.model, "text-embedding-3-small");
    assert_eq!(http.api_key.as_deref(), Some("secret"));
    assert_eq!(http.timeout, Duration::from_millis(250));
}

#[tokio::test]
async fn test_http_embedder_parses_response() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.5,-0.25,1.0]}],"model":"m"}"#,
    )
    .await;

    let embedder = HttpEmbedder::new(HttpEmbedderConfig::new(base_url, "m").api_key("sk-test"))
        .expect("should build embedder");
    let vector = embedder
        .embed("What is the oxidation state of Fe?")
        .await
        .expect("should embed");
    assert_eq!(vector, vec![0.5, -0.25, 1.0]);

    let request = server.await.expect("server task should finish");
    assert!(request.starts_with("POST /v1/embeddings"));
    assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
    assert!(request.contains(r#""input":"What is the oxidation state of Fe?""#));
}

#[tokio::test]
async fn test_http_embedder_surfaces_status() {
    let (base_url, server) =
        serve_once("HTTP/1.1 503 Service Unavailable", r#"{"error":"overloaded"}"#).await;

    let embedder =
        HttpEmbedder::new(HttpEmbedderConfig::new(base_url, "m")).expect("should build embedder");
    let err = embedder.embed("NaCl").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::HttpStatus { status: 503, .. }));
    assert!(err.is_transient());
    server.await.expect("server task should finish");
}

#[tokio::test]
async fn test_http_embedder_rejects_empty_data() {
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", r#"{"data":[]}"#).await;

    let embedder =
        HttpEmbedder::new(HttpEmbedderConfig::new(base_url, "m")).expect("should build embedder");
    let err = embedder.embed("NaCl").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::InvalidResponse { .. }));
    assert!(!err.is_transient());
    server.await.expect("server task should finish");
}

#[tokio::test]
async fn test_http_embedder_empty_input_skips_request() {
    let embedder = HttpEmbedder::new(HttpEmbedderConfig::new("http://127.0.0.1:9", "m"))
        .expect("should build embedder");
    let err = embedder.embed("   ").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::EmptyInput));
}

#[tokio::test]
async fn test_stub_embedder_is_deterministic_and_normalized() {
    let embedder = StubEmbedder::default();
    let a = embedder.embed("Fe2O3 oxidation state").await.expect("should embed");
    let b = embedder.embed("Fe2O3 oxidation state").await.expect("should embed");

    assert_eq!(a, b);
    assert_eq!(a.len(), STUB_EMBEDDING_DIM);
    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
    assert!(embedder.is_stub());
}

#[tokio::test]
async fn test_stub_embedder_shares_direction_on_shared_tokens() {
    let embedder = StubEmbedder::default();
    let a = embedder
        .embed("What is the oxidation state of Fe in Fe2O3?")
        .await
        .expect("should embed");
    let b = embedder
        .embed("Question 4: what is the oxidation state of Fe in Fe2O3")
        .await
        .expect("should embed");

    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_stub_embedder_rejects_empty_fingerprint() {
    let err = StubEmbedder::default().embed("the of ?").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::EmptyInput));
}

#[tokio::test]
async fn test_caching_embedder_calls_inner_once_per_text() {
    let mock = Arc::new(MockEmbedder::new().with_vector("NaCl", vec![1.0, 0.0]));
    let cached = CachingEmbedder::new(Arc::clone(&mock), 16);

    let first = cached.embed("NaCl").await.expect("should embed");
    let second = cached.embed("NaCl").await.expect("should embed");
    cached.embed("KCl").await.expect("should embed");

    assert_eq!(first, vec![1.0, 0.0]);
    assert_eq!(first, second);
    assert_eq!(mock.call_count(), 2);

    cached.run_pending_tasks();
    assert_eq!(cached.len(), 2);
}

#[tokio::test]
async fn test_caching_embedder_does_not_cache_failures() {
    let mock = Arc::new(MockEmbedder::new());
    let cached = CachingEmbedder::new(Arc::clone(&mock), 16);

    mock.set_failing(true);
    assert!(cached.embed("NaCl").await.is_err());

    mock.set_failing(false);
    assert!(cached.embed("NaCl").await.is_ok());
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_mock_embedder_scripted_and_failing() {
    let mock = MockEmbedder::new().with_vector("a", vec![0.0, 1.0]);
    assert_eq!(mock.embed("a").await.expect("should embed"), vec![0.0, 1.0]);
    assert_eq!(mock.embed("sodium chloride").await.expect("fallback").len(), STUB_EMBEDDING_DIM);

    mock.set_failing(true);
    assert!(matches!(
        mock.embed("a").await,
        Err(EmbeddingError::Unavailable { .. })
    ));
    assert_eq!(mock.call_count(), 3);
}

#[test]
fn test_backend_from_config_defaults_to_stub() {
    let backend = EmbedderBackend::from_config(&Config::default()).expect("should build backend");
    assert!(backend.is_stub());

    let config = Config {
        embedding_url: Some("http://localhost:9000/v1".to_string()),
        ..Default::default()
    };
    let backend = EmbedderBackend::from_config(&config).expect("should build backend");
    assert!(!backend.is_stub());
}
