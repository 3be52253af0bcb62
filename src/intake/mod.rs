//! 入力画像の受け付け
//!
//! アップロード前にサイズ・メディアタイプ・マジックナンバーを検査し、
//! 内容ハッシュ（SHA-256）を画像IDとして付与する。

mod exif;

pub use exif::inspect_metadata;

use crate::error::{GuardianError, Result};
use crate::resource::ImagePayload;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// 受け付け条件
#[derive(Debug, Clone, Copy)]
pub struct IntakePolicy {
    pub max_bytes: usize,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
        }
    }
}

/// 画像ID（内容のSHA-256 16進表記）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 受け付け済みの元画像
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: ImageId,
    pub payload: ImagePayload,
    /// multipart の file パートに付けるファイル名
    pub file_name: String,
}

/// 元画像を検査して SourceImage を作る
pub fn validate(bytes: Vec<u8>, media_type: &str, policy: &IntakePolicy) -> Result<SourceImage> {
    if bytes.is_empty() {
        return Err(GuardianError::InvalidInput("画像データが空です".into()));
    }

    let media_type = media_type.trim().to_lowercase();
    if !media_type.starts_with("image/") {
        return Err(GuardianError::InvalidInput(format!(
            "画像ではないメディアタイプです: {}",
            media_type
        )));
    }

    if bytes.len() > policy.max_bytes {
        return Err(GuardianError::InvalidInput(format!(
            "サイズ上限を超えています: {} bytes (上限 {} bytes)",
            bytes.len(),
            policy.max_bytes
        )));
    }

    let format = image::guess_format(&bytes)
        .map_err(|_| GuardianError::InvalidInput("画像形式を判別できません".into()))?;
    let extension = format.extensions_str().first().copied().unwrap_or("img");

    Ok(SourceImage {
        id: ImageId::of(&bytes),
        payload: ImagePayload::new(bytes, media_type),
        file_name: format!("upload.{}", extension),
    })
}

/// ファイルを読み込み、拡張子（不明なら内容）からメディアタイプを決める
pub fn load_file(path: &Path) -> Result<(Vec<u8>, String)> {
    if !path.is_file() {
        return Err(GuardianError::MissingFile(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let media_type = ImageFormat::from_path(path)
        .or_else(|_| image::guess_format(&bytes))
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string());

    Ok((bytes, media_type))
}
