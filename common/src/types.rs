//! 診断結果の型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - Detection: 検出された1要素（顔・書類・その他）
//! - MetadataFindings: 埋め込みメタデータの所見
//! - DetectionReport: 1回のスキャン結果（スコア・検出・脅威・メタデータ）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// スコアがこれ未満なら高リスク
pub const SAFE_THRESHOLD: u8 = 50;

/// 脅威が一つもない場合の表示文言
pub const NO_THREATS_MESSAGE: &str = "No visible threats.";

/// デバイス情報が取れなかった場合の表示
pub const UNKNOWN_DEVICE: &str = "Unknown (Stripped?)";

/// 検出種別
///
/// FACE / DOCUMENT 以外（BARCODE等）は元のラベルを保持して Other にまとめる
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DetectionKind {
    Face,
    Document,
    Other(String),
}

impl DetectionKind {
    pub fn label(&self) -> &str {
        match self {
            DetectionKind::Face => "FACE",
            DetectionKind::Document => "DOCUMENT",
            DetectionKind::Other(label) => label,
        }
    }
}

impl From<String> for DetectionKind {
    fn from(label: String) -> Self {
        match label.trim().to_uppercase().as_str() {
            "FACE" => DetectionKind::Face,
            "DOCUMENT" => DetectionKind::Document,
            _ => DetectionKind::Other(label),
        }
    }
}

impl From<DetectionKind> for String {
    fn from(kind: DetectionKind) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 検出領域（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// 検出要素
///
/// index はサービスがレポート順に振ったもので、レポートの寿命中は不変
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub index: usize,
    pub kind: DetectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

/// メタデータ所見
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFindings {
    pub gps_found: bool,
    pub device_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl MetadataFindings {
    /// GPS欄の表示文言
    pub fn gps_label(&self) -> &'static str {
        if self.gps_found {
            "DETECTED"
        } else {
            "CLEAN"
        }
    }
}

impl Default for MetadataFindings {
    fn default() -> Self {
        Self {
            gps_found: false,
            device_info: UNKNOWN_DEVICE.to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

/// リスク区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Safe,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score < SAFE_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::Safe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Safe => "Verified Safe",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Safe => write!(f, "safe"),
        }
    }
}

/// スキャン結果
///
/// 1回のスキャン呼び出しで丸ごと生成され、ワークフローに載った後は変更しない
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    /// Trust Score (0-100、低いほど危険)
    pub score: u8,
    pub detections: Vec<Detection>,
    pub threats: Vec<String>,
    pub metadata: MetadataFindings,
    /// サービス側のステータス文字列（参考値）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl DetectionReport {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }

    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }

    pub fn detection(&self, index: usize) -> Option<&Detection> {
        self.detections.get(index)
    }

    /// 表示用の脅威一覧（空なら NO_THREATS_MESSAGE のみ）
    pub fn threat_messages(&self) -> Vec<&str> {
        if self.threats.is_empty() {
            vec![NO_THREATS_MESSAGE]
        } else {
            self.threats.iter().map(String::as_str).collect()
        }
    }
}

/// 保護処理の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectAction {
    /// 選択した検出のみぼかす
    BlurSelected,
    /// 画像全体にクローキング（選択は無視）
    Cloak,
}

impl ProtectAction {
    /// `/api/protect` の action フィールド値
    pub fn wire_name(&self) -> &'static str {
        match self {
            ProtectAction::BlurSelected => "blur_selected",
            ProtectAction::Cloak => "cloak",
        }
    }

    pub fn uses_selection(&self) -> bool {
        matches!(self, ProtectAction::BlurSelected)
    }
}

impl FromStr for ProtectAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blur" | "blur_selected" | "blur-selected" => Ok(ProtectAction::BlurSelected),
            "cloak" => Ok(ProtectAction::Cloak),
            _ => Err(format!("Unknown action: {}. Use blur or cloak", s)),
        }
    }
}

impl fmt::Display for ProtectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
