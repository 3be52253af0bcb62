//! HTTP (multipart) による PrivacyService 実装

use super::{PrivacyService, ProtectRequest, ScanUpload, ServiceError};
use crate::resource::ImagePayload;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;

const SCAN_PATH: &str = "api/scan";
const PROTECT_PATH: &str = "api/protect";
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct HttpPrivacyService {
    client: Client,
    base_url: String,
}

impl HttpPrivacyService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// 構築済みクライアントを使う（プロキシ・TLS設定を呼び出し側で決める場合）
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn file_part(file_name: &str, image: &ImagePayload) -> Result<Part, ServiceError> {
    let part = Part::bytes(image.bytes().to_vec())
        .file_name(file_name.to_string())
        .mime_str(image.media_type())?;
    Ok(part)
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Content-Type からパラメータを除いたメディアタイプ
fn media_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string())
}

#[async_trait]
impl PrivacyService for HttpPrivacyService {
    async fn scan(&self, upload: &ScanUpload) -> Result<String, ServiceError> {
        let form = Form::new()
            .text("image_id", upload.image_id.to_string())
            .part("file", file_part(&upload.file_name, &upload.image)?);

        tracing::info!(url = %self.url(SCAN_PATH), image_id = %upload.image_id, bytes = upload.image.len(), "scan request");
        let response = self
            .client
            .post(self.url(SCAN_PATH))
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    async fn protect(&self, request: &ProtectRequest) -> Result<ImagePayload, ServiceError> {
        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }
        if let Some((file_name, image)) = &request.source {
            form = form.part("file", file_part(file_name, image)?);
        }

        tracing::info!(
            url = %self.url(PROTECT_PATH),
            action = %request.action,
            indices = %request.indices,
            resend = request.source.is_some(),
            "protect request"
        );
        let response = self
            .client
            .post(self.url(PROTECT_PATH))
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        let media_type = media_type_of(&response);
        let bytes = response.bytes().await?;

        Ok(ImagePayload::new(bytes.to_vec(), media_type))
    }
}
