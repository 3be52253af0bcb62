//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Score out of range (0-100): {0}")]
    ScoreOutOfRange(i64),

    #[error("Index {index} out of range for {len} detections")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
