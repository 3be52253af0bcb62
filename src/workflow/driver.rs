use super::controller::{Completion, WorkflowController, WorkflowOptions};
use crate::config::Config;
use crate::error::{GuardianError, Result};
use crate::orchestrator::{ProtectionOrchestrator, ScanOrchestrator};
use crate::service::{HttpPrivacyService, PrivacyService};
use guardian_common::ProtectAction;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// 非同期ドライバ
///
/// ロックは通信中に保持しない。通信中も他の操作（別ファイルの受け付け等）を受け付け、
/// 戻ってきた応答の適用可否はコントローラの世代番号で判定する。
pub struct Workflow {
    controller: Mutex<WorkflowController>,
    scanner: ScanOrchestrator,
    protector: ProtectionOrchestrator,
}

impl Workflow {
    pub fn new(
        controller: WorkflowController,
        scanner: ScanOrchestrator,
        protector: ProtectionOrchestrator,
    ) -> Self {
        Self {
            controller: Mutex::new(controller),
            scanner,
            protector,
        }
    }

    pub fn with_service(service: Arc<dyn PrivacyService>, options: WorkflowOptions) -> Self {
        Self::new(
            WorkflowController::new(options),
            ScanOrchestrator::new(service.clone()),
            ProtectionOrchestrator::new(service),
        )
    }

    /// 設定から HTTP サービスにつないだワークフローを作る
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = HttpPrivacyService::new(&config.endpoint, config.timeout())
            .map_err(|e| GuardianError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;
        let service: Arc<dyn PrivacyService> = Arc::new(service);

        Ok(Self::new(
            WorkflowController::new(WorkflowOptions::from(config)),
            ScanOrchestrator::new(service.clone()),
            ProtectionOrchestrator::new(service)
                .with_resend_source(config.resend_source_on_protect),
        ))
    }

    /// コントローラを直接参照する（状態の表示用）
    pub async fn controller(&self) -> MutexGuard<'_, WorkflowController> {
        self.controller.lock().await
    }

    pub async fn accept_file(&self, bytes: Vec<u8>, media_type: &str) -> Result<()> {
        self.controller.lock().await.accept_file(bytes, media_type)
    }

    pub async fn reset(&self) {
        self.controller.lock().await.reset();
    }

    pub async fn toggle_selection(&self, index: usize) -> Result<bool> {
        self.controller.lock().await.toggle_selection(index)
    }

    pub async fn start_scan(&self) -> Result<Completion> {
        let ticket = self.controller.lock().await.begin_scan()?;
        let result = self.scanner.scan(&ticket.upload).await;
        self.controller.lock().await.complete_scan(ticket, result)
    }

    pub async fn apply_protection(&self, action: ProtectAction) -> Result<Completion> {
        let ticket = self.controller.lock().await.begin_protection(action)?;
        let result = self
            .protector
            .protect(ticket.action, &ticket.selection, &ticket.source)
            .await;
        self.controller.lock().await.complete_protection(ticket, result)
    }
}
