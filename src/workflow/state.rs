use crate::intake::{ImageId, SourceImage};
use crate::resource::DisplayHandle;
use guardian_common::{DetectionReport, ProtectAction, SelectionSet};
use std::fmt;

/// ワークフローの状態（ペイロードなし）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Empty,
    Loaded,
    Scanning,
    Reported,
    Protecting,
    Protected,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Empty => "Empty",
            StateKind::Loaded => "Loaded",
            StateKind::Scanning => "Scanning",
            StateKind::Reported => "Reported",
            StateKind::Protecting => "Protecting",
            StateKind::Protected => "Protected",
        };
        f.write_str(name)
    }
}

/// レポートとその選択集合（常に対で入れ替わる）
#[derive(Debug, Clone)]
pub struct Review {
    pub report: DetectionReport,
    pub selection: SelectionSet,
}

impl Review {
    pub fn new(report: DetectionReport) -> Self {
        let selection = SelectionSet::new(report.detection_count());
        Self { report, selection }
    }
}

/// 保護済み画像と、それを生んだ要求内容
#[derive(Debug)]
pub struct ProtectedImage {
    pub handle: DisplayHandle,
    pub action: ProtectAction,
    pub indices: String,
    pub image_id: ImageId,
}

/// 状態ごとに保持するペイロード
#[derive(Debug, Default)]
pub(crate) enum WorkflowState {
    #[default]
    Empty,
    Loaded {
        source: SourceImage,
        preview: DisplayHandle,
    },
    Scanning {
        source: SourceImage,
        preview: DisplayHandle,
        /// 再スキャン失敗時に戻すレポート
        prior: Option<Review>,
    },
    Reported {
        source: SourceImage,
        preview: DisplayHandle,
        review: Review,
    },
    Protecting {
        source: SourceImage,
        preview: DisplayHandle,
        review: Review,
        action: ProtectAction,
    },
    Protected {
        source: SourceImage,
        review: Review,
        protected: ProtectedImage,
    },
}

impl WorkflowState {
    pub(crate) fn kind(&self) -> StateKind {
        match self {
            WorkflowState::Empty => StateKind::Empty,
            WorkflowState::Loaded { .. } => StateKind::Loaded,
            WorkflowState::Scanning { .. } => StateKind::Scanning,
            WorkflowState::Reported { .. } => StateKind::Reported,
            WorkflowState::Protecting { .. } => StateKind::Protecting,
            WorkflowState::Protected { .. } => StateKind::Protected,
        }
    }

    pub(crate) fn source(&self) -> Option<&SourceImage> {
        match self {
            WorkflowState::Empty => None,
            WorkflowState::Loaded { source, .. }
            | WorkflowState::Scanning { source, .. }
            | WorkflowState::Reported { source, .. }
            | WorkflowState::Protecting { source, .. }
            | WorkflowState::Protected { source, .. } => Some(source),
        }
    }

    /// 表示中のレビュー。Scanning では再スキャン前のものは返さない
    pub(crate) fn review(&self) -> Option<&Review> {
        match self {
            WorkflowState::Reported { review, .. }
            | WorkflowState::Protecting { review, .. }
            | WorkflowState::Protected { review, .. } => Some(review),
            _ => None,
        }
    }

    pub(crate) fn display_handle(&self) -> Option<&DisplayHandle> {
        match self {
            WorkflowState::Empty => None,
            WorkflowState::Loaded { preview, .. }
            | WorkflowState::Scanning { preview, .. }
            | WorkflowState::Reported { preview, .. }
            | WorkflowState::Protecting { preview, .. } => Some(preview),
            WorkflowState::Protected { protected, .. } => Some(&protected.handle),
        }
    }
}
