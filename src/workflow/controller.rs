//! ワークフロー状態機械
//!
//! Empty → Loaded → Scanning → Reported → Protecting → Protected
//!
//! 通信を伴う操作は `begin_*` / `complete_*` に分かれる。`begin_*` は世代番号付きの
//! チケットを返し、`complete_*` はチケットの世代が現在と一致する場合だけ結果を適用する。
//! 一致しない応答は黙って捨てる。

use super::notice::{NoticeBoard, NoticeKind, RetryAction};
use super::state::{ProtectedImage, Review, StateKind, WorkflowState};
use crate::config::Config;
use crate::error::{GuardianError, Result};
use crate::intake::{self, IntakePolicy, SourceImage};
use crate::resource::{DisplayHandle, ImagePayload, ResourceLifecycle};
use crate::service::ScanUpload;
use guardian_common::{DetectionReport, ProtectAction, SelectionSet};

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub intake: IntakePolicy,
    pub download_file_name: String,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WorkflowOptions {
    fn from(config: &Config) -> Self {
        Self {
            intake: IntakePolicy {
                max_bytes: config.max_upload_bytes,
            },
            download_file_name: config.download_file_name.clone(),
        }
    }
}

/// 送信中のスキャン
#[derive(Debug)]
pub struct ScanTicket {
    generation: u64,
    pub upload: ScanUpload,
}

impl ScanTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 送信中の保護処理
#[derive(Debug)]
pub struct ProtectTicket {
    generation: u64,
    pub action: ProtectAction,
    pub selection: SelectionSet,
    pub source: SourceImage,
}

impl ProtectTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 応答の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// 世代が進んでいたため破棄した
    Stale,
}

/// 保護済み画像のダウンロード内容
#[derive(Debug)]
pub struct Download<'a> {
    pub file_name: &'a str,
    pub media_type: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Debug)]
pub struct WorkflowController {
    state: WorkflowState,
    generation: u64,
    resources: ResourceLifecycle,
    notices: NoticeBoard,
    options: WorkflowOptions,
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new(WorkflowOptions::default())
    }
}

impl WorkflowController {
    pub fn new(options: WorkflowOptions) -> Self {
        Self {
            state: WorkflowState::Empty,
            generation: 0,
            resources: ResourceLifecycle::new(),
            notices: NoticeBoard::default(),
            options,
        }
    }

    // ---------------------------------------------
    // 参照
    // ---------------------------------------------

    pub fn state_kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.state.source()
    }

    pub fn report(&self) -> Option<&DetectionReport> {
        self.state.review().map(|r| &r.report)
    }

    pub fn selection(&self) -> Option<&SelectionSet> {
        self.state.review().map(|r| &r.selection)
    }

    /// 現在表示すべきハンドル（保護済みがあればそちら）
    pub fn display_handle(&self) -> Option<&DisplayHandle> {
        self.state.display_handle()
    }

    pub fn protected(&self) -> Option<&ProtectedImage> {
        match &self.state {
            WorkflowState::Protected { protected, .. } => Some(protected),
            _ => None,
        }
    }

    pub fn resources(&self) -> &ResourceLifecycle {
        &self.resources
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        self.notices.dismiss(id)
    }

    pub fn take_notices(&mut self) -> Vec<super::Notice> {
        self.notices.take_all()
    }

    /// Protected 状態でのみダウンロード可能
    pub fn download(&self) -> Option<Download<'_>> {
        let protected = self.protected()?;
        let payload = self.resources.resolve(&protected.handle)?;
        Some(Download {
            file_name: &self.options.download_file_name,
            media_type: payload.media_type(),
            bytes: payload.bytes(),
        })
    }

    // ---------------------------------------------
    // 操作
    // ---------------------------------------------

    /// 新しい画像を受け付ける（どの状態からでも可）
    ///
    /// 検査に失敗した場合は状態を変えない。
    pub fn accept_file(&mut self, bytes: Vec<u8>, media_type: &str) -> Result<()> {
        let source = intake::validate(bytes, media_type, &self.options.intake)?;
        let from = self.state_kind();

        self.release_all();
        let preview = self.resources.acquire(source.payload.clone());
        tracing::info!(image_id = %source.id, bytes = source.payload.len(), "file accepted");
        self.state = WorkflowState::Loaded { source, preview };
        self.log_transition(from);
        Ok(())
    }

    /// すべて破棄して Empty に戻る（どの状態からでも可）
    pub fn reset(&mut self) {
        let from = self.state_kind();
        self.release_all();
        self.log_transition(from);
    }

    pub fn begin_scan(&mut self) -> Result<ScanTicket> {
        let from = self.state_kind();
        let (source, preview, prior) = match std::mem::take(&mut self.state) {
            WorkflowState::Loaded { source, preview } => (source, preview, None),
            WorkflowState::Reported {
                source,
                preview,
                review,
            } => (source, preview, Some(review)),
            other => {
                self.state = other;
                return Err(GuardianError::InvalidTransition {
                    operation: "startScan",
                    state: from,
                });
            }
        };

        self.generation += 1;
        let upload = ScanUpload::from_source(&source);
        self.state = WorkflowState::Scanning {
            source,
            preview,
            prior,
        };
        self.log_transition(from);

        Ok(ScanTicket {
            generation: self.generation,
            upload,
        })
    }

    /// スキャン結果を適用する
    ///
    /// 失敗時は直前の安定状態（Loaded か Reported）に戻し、通知を積んで ScanFailed を返す。
    pub fn complete_scan(
        &mut self,
        ticket: ScanTicket,
        result: Result<DetectionReport>,
    ) -> Result<Completion> {
        if ticket.generation != self.generation || self.state_kind() != StateKind::Scanning {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "stale scan response dropped"
            );
            return Ok(Completion::Stale);
        }

        let WorkflowState::Scanning {
            source,
            preview,
            prior,
        } = std::mem::take(&mut self.state)
        else {
            return Ok(Completion::Stale);
        };

        match result {
            Ok(report) => {
                tracing::info!(
                    score = report.score,
                    risk = %report.risk_level(),
                    detections = report.detection_count(),
                    "scan report attached"
                );
                self.state = WorkflowState::Reported {
                    source,
                    preview,
                    review: Review::new(report),
                };
                self.log_transition(StateKind::Scanning);
                Ok(Completion::Applied)
            }
            Err(err) => {
                self.state = match prior {
                    Some(review) => WorkflowState::Reported {
                        source,
                        preview,
                        review,
                    },
                    None => WorkflowState::Loaded { source, preview },
                };
                self.log_transition(StateKind::Scanning);

                let message = match err {
                    GuardianError::ScanFailed(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!(error = %message, "scan failed");
                self.notices
                    .push(NoticeKind::ScanFailed, message.clone(), RetryAction::Scan);
                Err(GuardianError::ScanFailed(message))
            }
        }
    }

    /// 選択を反転する。操作後に選択されていれば true
    pub fn toggle_selection(&mut self, index: usize) -> Result<bool> {
        let state = self.state_kind();
        match &mut self.state {
            WorkflowState::Reported { review, .. } => {
                review.selection.toggle(index).map_err(|e| match e {
                    guardian_common::Error::IndexOutOfRange { index, len } => {
                        GuardianError::IndexOutOfRange { index, len }
                    }
                    other => other.into(),
                })
            }
            _ => Err(GuardianError::InvalidTransition {
                operation: "toggleSelection",
                state,
            }),
        }
    }

    /// 現在の選択で保護処理を開始する
    ///
    /// blur_selected で選択が空なら EmptySelection（状態は変えない）。cloak は選択を無視する。
    pub fn begin_protection(&mut self, action: ProtectAction) -> Result<ProtectTicket> {
        let from = self.state_kind();
        let (source, preview, review) = match std::mem::take(&mut self.state) {
            WorkflowState::Reported {
                source,
                preview,
                review,
            } => (source, preview, review),
            other => {
                self.state = other;
                return Err(GuardianError::InvalidTransition {
                    operation: "applyProtection",
                    state: from,
                });
            }
        };

        if action.uses_selection() && review.selection.is_empty() {
            self.state = WorkflowState::Reported {
                source,
                preview,
                review,
            };
            return Err(GuardianError::EmptySelection);
        }

        self.generation += 1;
        let ticket = ProtectTicket {
            generation: self.generation,
            action,
            selection: review.selection.clone(),
            source: source.clone(),
        };
        self.state = WorkflowState::Protecting {
            source,
            preview,
            review,
            action,
        };
        self.log_transition(from);
        Ok(ticket)
    }

    /// 保護結果を適用する
    ///
    /// 成功時はプレビューを解放して保護済み画像のハンドルを発行する。
    /// 失敗時は Reported に戻し（レポート・選択はそのまま）、通知を積んで ProtectionFailed を返す。
    pub fn complete_protection(
        &mut self,
        ticket: ProtectTicket,
        result: Result<ImagePayload>,
    ) -> Result<Completion> {
        if ticket.generation != self.generation || self.state_kind() != StateKind::Protecting {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "stale protect response dropped"
            );
            return Ok(Completion::Stale);
        }

        let WorkflowState::Protecting {
            source,
            preview,
            review,
            action,
        } = std::mem::take(&mut self.state)
        else {
            return Ok(Completion::Stale);
        };

        match result {
            Ok(image) => {
                let handle = self.resources.replace(Some(preview), image);
                let indices = if action.uses_selection() {
                    ticket.selection.to_wire()
                } else {
                    String::new()
                };
                tracing::info!(action = %action, handle = %handle, "protected image attached");
                self.state = WorkflowState::Protected {
                    protected: ProtectedImage {
                        handle,
                        action,
                        indices,
                        image_id: source.id.clone(),
                    },
                    source,
                    review,
                };
                self.log_transition(StateKind::Protecting);
                Ok(Completion::Applied)
            }
            Err(err) => {
                self.state = WorkflowState::Reported {
                    source,
                    preview,
                    review,
                };
                self.log_transition(StateKind::Protecting);

                let message = match err {
                    GuardianError::ProtectionFailed(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!(error = %message, action = %action, "protection failed");
                self.notices.push(
                    NoticeKind::ProtectionFailed,
                    message.clone(),
                    RetryAction::Protect(action),
                );
                Err(GuardianError::ProtectionFailed(message))
            }
        }
    }

    // ---------------------------------------------
    // 内部
    // ---------------------------------------------

    /// 全ハンドルを解放し、通知を消して Empty にする。世代も進める
    fn release_all(&mut self) {
        match std::mem::take(&mut self.state) {
            WorkflowState::Empty => {}
            WorkflowState::Loaded { preview, .. }
            | WorkflowState::Scanning { preview, .. }
            | WorkflowState::Reported { preview, .. }
            | WorkflowState::Protecting { preview, .. } => {
                self.resources.release(preview);
            }
            WorkflowState::Protected { protected, .. } => {
                self.resources.release(protected.handle);
            }
        }
        self.notices.clear();
        self.generation += 1;
    }

    fn log_transition(&self, from: StateKind) {
        tracing::debug!(
            from = %from,
            to = %self.state_kind(),
            generation = self.generation,
            live_handles = self.resources.live_count(),
            "workflow transition"
        );
    }
}
