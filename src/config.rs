use crate::error::{GuardianError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENDPOINT_ENV: &str = "GUARDIAN_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 診断サービスのベースURL
    pub endpoint: String,
    pub timeout_seconds: u64,
    /// アップロード上限（バイト）
    pub max_upload_bytes: usize,
    /// 保護済み画像の保存名
    pub download_file_name: String,
    /// protect 呼び出しで元画像を再送するか
    pub resend_source_on_protect: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".into(),
            timeout_seconds: 120,
            max_upload_bytes: 25 * 1024 * 1024,
            download_file_name: "guardian_safe.jpg".into(),
            resend_source_on_protect: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;

        // 環境変数を優先
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GuardianError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("guardian-ai").join("config.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GuardianError::Config(format!(
                "エンドポイントは http:// または https:// で始めてください: {}",
                endpoint
            )));
        }
        self.endpoint = endpoint;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:8000");
        assert_eq!(config.download_file_name, "guardian_safe.jpg");
        assert!(config.resend_source_on_protect);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_save_and_load_roundtrip_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"endpoint": "https://guard.example", "timeout_seconds": 5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint, "https://guard.example");
        assert_eq!(config.timeout_seconds, 5);
        // 未指定の項目は既定値
        assert_eq!(config.download_file_name, "guardian_safe.jpg");

        config.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.endpoint, "https://guard.example");
    }

    #[test]
    fn test_load_corrupted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ invalid").unwrap();
        assert!(matches!(Config::load_from(&path), Err(GuardianError::JsonParse(_))));
    }
}
