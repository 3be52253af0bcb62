//! テスト用の PrivacyService 実装とフィクスチャ

#![allow(dead_code)]

use async_trait::async_trait;
use guardian_ai::resource::ImagePayload;
use guardian_ai::service::{PrivacyService, ProtectRequest, ScanUpload, ServiceError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

pub const TWO_FACES: &str = r#"{
    "score": 30,
    "status": "HIGH RISK",
    "detections": [{"type": "FACE", "box": [1, 2, 3, 4]}, {"type": "FACE", "box": [5, 6, 7, 8]}],
    "threats": ["Potential Child Detected (Sharenting Risk)"],
    "meta": {"gps_found": false, "device_info": "Pixel 7"}
}"#;

pub const CLEAN: &str = r#"{
    "score": 85,
    "status": "SAFE",
    "detections": [],
    "threats": [],
    "meta": {"gps_found": false, "device_info": "Unknown (Stripped?)"}
}"#;

pub fn png() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfirst".to_vec()
}

pub fn jpeg() -> Vec<u8> {
    b"\xFF\xD8\xFF\xE0\0\x10JFIFsecond".to_vec()
}

/// N件の検出を持つスキャンレスポンス
pub fn scan_body(score: u8, detections: usize) -> String {
    let items = vec![r#"{"type": "FACE"}"#; detections].join(",");
    format!(r#"{{"score": {}, "detections": [{}], "threats": []}}"#, score, items)
}

type Scripted<T> = Mutex<VecDeque<Result<T, u16>>>;

/// 応答を台本どおりに返すサービス
///
/// `gated` の場合、呼び出しごとに `entered` を通知し、`release` を待ってから応答する。
#[derive(Default)]
pub struct FakeService {
    scan_responses: Scripted<String>,
    protect_responses: Scripted<(Vec<u8>, String)>,
    pub scan_calls: AtomicUsize,
    pub protect_calls: AtomicUsize,
    pub scan_uploads: Mutex<Vec<ScanUpload>>,
    pub protect_requests: Mutex<Vec<ProtectRequest>>,
    gated: bool,
    pub entered: Notify,
    pub release: Notify,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gated: true,
            ..Self::default()
        }
    }

    pub fn push_scan(&self, body: &str) -> &Self {
        self.scan_responses.lock().unwrap().push_back(Ok(body.to_string()));
        self
    }

    pub fn push_scan_error(&self, status: u16) -> &Self {
        self.scan_responses.lock().unwrap().push_back(Err(status));
        self
    }

    pub fn push_protect(&self, bytes: &[u8], media_type: &str) -> &Self {
        self.protect_responses
            .lock()
            .unwrap()
            .push_back(Ok((bytes.to_vec(), media_type.to_string())));
        self
    }

    pub fn push_protect_error(&self, status: u16) -> &Self {
        self.protect_responses.lock().unwrap().push_back(Err(status));
        self
    }

    pub fn last_protect_request(&self) -> Option<ProtectRequest> {
        self.protect_requests.lock().unwrap().last().cloned()
    }

    async fn wait_gate(&self) {
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

fn status_error(status: u16) -> ServiceError {
    ServiceError::Status {
        status,
        body: "scripted failure".into(),
    }
}

#[async_trait]
impl PrivacyService for FakeService {
    async fn scan(&self, upload: &ScanUpload) -> Result<String, ServiceError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        self.scan_uploads.lock().unwrap().push(upload.clone());
        self.wait_gate().await;

        let next = self.scan_responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(503)),
        }
    }

    async fn protect(&self, request: &ProtectRequest) -> Result<ImagePayload, ServiceError> {
        self.protect_calls.fetch_add(1, Ordering::SeqCst);
        self.protect_requests.lock().unwrap().push(request.clone());
        self.wait_gate().await;

        let next = self.protect_responses.lock().unwrap().pop_front();
        match next {
            Some(Ok((bytes, media_type))) => Ok(ImagePayload::new(bytes, media_type)),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(503)),
        }
    }
}
