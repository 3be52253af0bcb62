use crate::error::{GuardianError, Result};
use crate::intake::SourceImage;
use crate::resource::ImagePayload;
use crate::service::{PrivacyService, ProtectRequest};
use guardian_common::{ProtectAction, SelectionSet};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProtectionOrchestrator {
    service: Arc<dyn PrivacyService>,
    resend_source: bool,
}

impl ProtectionOrchestrator {
    pub fn new(service: Arc<dyn PrivacyService>) -> Self {
        Self {
            service,
            resend_source: true,
        }
    }

    /// protect 呼び出しで元画像を再送するか（既定: する）
    pub fn with_resend_source(mut self, resend_source: bool) -> Self {
        self.resend_source = resend_source;
        self
    }

    /// 送信内容を組み立てる。cloak では選択を無視する
    pub fn build_request(
        &self,
        action: ProtectAction,
        selection: &SelectionSet,
        source: &SourceImage,
    ) -> ProtectRequest {
        let indices = if action.uses_selection() {
            selection.to_wire()
        } else {
            String::new()
        };

        ProtectRequest {
            action,
            indices,
            image_id: source.id.clone(),
            source: self
                .resend_source
                .then(|| (source.file_name.clone(), source.payload.clone())),
        }
    }

    pub async fn protect(
        &self,
        action: ProtectAction,
        selection: &SelectionSet,
        source: &SourceImage,
    ) -> Result<ImagePayload> {
        let request = self.build_request(action, selection, source);
        let image = self
            .service
            .protect(&request)
            .await
            .map_err(|e| GuardianError::ProtectionFailed(e.to_string()))?;

        if image.is_empty() {
            return Err(GuardianError::ProtectionFailed("レスポンスが空です".into()));
        }
        if !image.media_type().starts_with("image/") {
            return Err(GuardianError::ProtectionFailed(format!(
                "画像ではないレスポンス: {}",
                image.media_type()
            )));
        }

        tracing::debug!(action = %action, bytes = image.len(), media_type = image.media_type(), "protected image received");
        Ok(image)
    }
}
