//! 外部の診断・墨消しサービスとの境界
//!
//! `PrivacyService` は1回の呼び出しで1回のリクエストを送るだけのトランスポート。
//! 再試行・状態保持はしない。

mod http;

pub use http::HttpPrivacyService;

use crate::intake::{ImageId, SourceImage};
use crate::resource::ImagePayload;
use async_trait::async_trait;
use guardian_common::ProtectAction;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("通信エラー: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("レスポンス解析エラー: {0}")]
    Parse(#[from] guardian_common::Error),

    #[error("レスポンスが空です")]
    EmptyBody,

    #[error("画像ではないレスポンス: {0}")]
    UnexpectedMediaType(String),
}

/// `/api/scan` に送る内容
#[derive(Debug, Clone)]
pub struct ScanUpload {
    pub image_id: ImageId,
    pub file_name: String,
    pub image: ImagePayload,
}

impl ScanUpload {
    pub fn from_source(source: &SourceImage) -> Self {
        Self {
            image_id: source.id.clone(),
            file_name: source.file_name.clone(),
            image: source.payload.clone(),
        }
    }
}

/// `/api/protect` に送る内容
#[derive(Debug, Clone)]
pub struct ProtectRequest {
    pub action: ProtectAction,
    /// 昇順カンマ区切り。cloak では常に空文字列
    pub indices: String,
    pub image_id: ImageId,
    /// 元画像の再送（サーバー側セッションに依存しないため）
    pub source: Option<(String, ImagePayload)>,
}

impl ProtectRequest {
    /// multipart のテキストフィールド
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("action", self.action.wire_name().to_string()),
            ("indices", self.indices.clone()),
            ("image_id", self.image_id.to_string()),
        ]
    }
}

#[async_trait]
pub trait PrivacyService: Send + Sync {
    /// スキャンを依頼し、レスポンス本文（JSON）を返す
    async fn scan(&self, upload: &ScanUpload) -> Result<String, ServiceError>;

    /// 保護処理を依頼し、返ってきた画像を返す
    async fn protect(&self, request: &ProtectRequest) -> Result<ImagePayload, ServiceError>;
}
