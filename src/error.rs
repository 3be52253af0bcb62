use crate::workflow::StateKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    MissingFile(String),

    #[error("入力画像が不正: {0}")]
    InvalidInput(String),

    #[error("{state}状態では{operation}を実行できません")]
    InvalidTransition {
        operation: &'static str,
        state: StateKind,
    },

    #[error("検出番号{index}は範囲外です（検出数: {len}）")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("ぼかし対象が選択されていません")]
    EmptySelection,

    #[error("スキャンに失敗: {0}")]
    ScanFailed(String),

    #[error("保護処理に失敗: {0}")]
    ProtectionFailed(String),

    #[error("対話入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] guardian_common::Error),
}

impl GuardianError {
    /// 外部サービス起因（再試行で解消し得る）失敗か
    pub fn is_environment_failure(&self) -> bool {
        matches!(
            self,
            GuardianError::ScanFailed(_) | GuardianError::ProtectionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GuardianError>;
