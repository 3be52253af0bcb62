//! HTTP サービス実装のテスト
//!
//! ループバックに1回だけ応答するサーバーを立て、送られた multipart を検証する

use guardian_ai::intake::{self, IntakePolicy, SourceImage};
use guardian_ai::service::{HttpPrivacyService, PrivacyService, ProtectRequest, ScanUpload, ServiceError};
use guardian_common::ProtectAction;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn source() -> SourceImage {
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRpixels".to_vec();
    intake::validate(png, "image/png", &IntakePolicy::default()).unwrap()
}

fn service(url: &str) -> HttpPrivacyService {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpPrivacyService::with_client(url, client)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(head: &str) -> Option<usize> {
    head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// リクエストを1件受け取り、`status` / `content_type` / `body` で応答する
async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    body: &'static [u8],
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);

            if let Some(end) = find(&request, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_string();
                let body_len = request.len() - end - 4;
                let complete = match content_length(&head) {
                    Some(len) => body_len >= len,
                    None => request.ends_with(b"\r\n0\r\n\r\n"),
                };
                if complete {
                    break;
                }
            }
        }

        let header = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        );
        socket.write_all(header.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).to_string()
    });

    (url, handle)
}

/// multipart のテキストフィールド値
fn field_value(request: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{}\"", name);
    let start = request.find(&marker)?;
    let rest = &request[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let value_end = value.find("\r\n")?;
    Some(value[..value_end].to_string())
}

#[tokio::test]
async fn test_scan_posts_file_and_image_id() {
    let (url, server) = serve_once("200 OK", "application/json", br#"{"score": 90}"#).await;
    let source = source();

    let body = service(&url)
        .scan(&ScanUpload::from_source(&source))
        .await
        .unwrap();
    assert_eq!(body, r#"{"score": 90}"#);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/scan "));
    assert!(request.contains("multipart/form-data"));
    assert!(request.contains("filename=\"upload.png\""));
    assert!(request.contains("IHDRpixels"));
    assert_eq!(field_value(&request, "image_id").as_deref(), Some(source.id.as_str()));
}

#[tokio::test]
async fn test_protect_posts_fields_and_source() {
    let (url, server) = serve_once("200 OK", "image/png; charset=binary", b"\x89PNGout").await;
    let source = source();
    let request = ProtectRequest {
        action: ProtectAction::BlurSelected,
        indices: "0,2".to_string(),
        image_id: source.id.clone(),
        source: Some((source.file_name.clone(), source.payload.clone())),
    };

    let image = service(&url).protect(&request).await.unwrap();
    assert_eq!(image.bytes(), b"\x89PNGout");
    assert_eq!(image.media_type(), "image/png");

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/protect "));
    assert_eq!(field_value(&raw, "action").as_deref(), Some("blur_selected"));
    assert_eq!(field_value(&raw, "indices").as_deref(), Some("0,2"));
    assert_eq!(field_value(&raw, "image_id").as_deref(), Some(source.id.as_str()));
    assert!(raw.contains("name=\"file\""));
}

#[tokio::test]
async fn test_protect_cloak_without_resend() {
    let (url, server) = serve_once("200 OK", "image/jpeg", b"\xFF\xD8cloaked").await;
    let source = source();
    let request = ProtectRequest {
        action: ProtectAction::Cloak,
        indices: String::new(),
        image_id: source.id.clone(),
        source: None,
    };

    service(&url).protect(&request).await.unwrap();

    let raw = server.await.unwrap();
    assert_eq!(field_value(&raw, "action").as_deref(), Some("cloak"));
    assert_eq!(field_value(&raw, "indices").as_deref(), Some(""));
    assert!(!raw.contains("name=\"file\""));
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let (url, server) = serve_once("500 Internal Server Error", "text/plain", b"boom").await;

    let err = service(&url)
        .scan(&ScanUpload::from_source(&source()))
        .await
        .unwrap_err();
    match err {
        ServiceError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = service(&url)
        .scan(&ScanUpload::from_source(&source()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
}

/// 実サーバーに対するスキャン（GUARDIAN_ENDPOINT 未設定ならスキップ）
#[tokio::test]
async fn live_endpoint_scan() {
    let endpoint = match std::env::var("GUARDIAN_ENDPOINT") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("GUARDIAN_ENDPOINT not set; skipping integration test");
            return;
        }
    };

    let service = HttpPrivacyService::new(&endpoint, std::time::Duration::from_secs(120)).unwrap();
    let body = service
        .scan(&ScanUpload::from_source(&source()))
        .await
        .expect("scan request failed");
    let report = guardian_common::parse_scan_response(&body).expect("invalid scan response");
    assert!(report.score <= 100);
}
