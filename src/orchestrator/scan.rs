use crate::error::{GuardianError, Result};
use crate::service::{PrivacyService, ScanUpload};
use guardian_common::{parse_scan_response, DetectionReport};
use std::sync::Arc;

#[derive(Clone)]
pub struct ScanOrchestrator {
    service: Arc<dyn PrivacyService>,
}

impl ScanOrchestrator {
    pub fn new(service: Arc<dyn PrivacyService>) -> Self {
        Self { service }
    }

    pub async fn scan(&self, upload: &ScanUpload) -> Result<DetectionReport> {
        let body = self
            .service
            .scan(upload)
            .await
            .map_err(|e| GuardianError::ScanFailed(e.to_string()))?;

        let report = parse_scan_response(&body)
            .map_err(|e| GuardianError::ScanFailed(format!("レスポンス解析エラー: {}", e)))?;

        tracing::debug!(
            score = report.score,
            detections = report.detection_count(),
            threats = report.threats.len(),
            "scan response mapped"
        );
        Ok(report)
    }
}
