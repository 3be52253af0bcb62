//! 表示用ハンドルの発行と解放
//!
//! 画像バイト列ごとに一時的なハンドル（`blob:guardian/<id>` 形式）を発行する。
//! `DisplayHandle` は Clone できず、解放は所有権を消費する `release` でのみ行う。
//! 置き換え・リセット時の解放漏れは `live_count` で検出できる。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 画像バイト列とメディアタイプ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    media_type: String,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 表示用ハンドル
#[must_use = "ハンドルは ResourceLifecycle::release で解放すること"]
#[derive(Debug, PartialEq, Eq)]
pub struct DisplayHandle {
    id: u64,
}

impl DisplayHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> String {
        format!("blob:guardian/{}", self.id)
    }
}

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:guardian/{}", self.id)
    }
}

#[derive(Debug, Default)]
pub struct ResourceLifecycle {
    next_id: u64,
    live: HashMap<u64, ImagePayload>,
    released: u64,
}

impl ResourceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, payload: ImagePayload) -> DisplayHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id, payload);
        tracing::debug!(handle = id, live = self.live.len(), "display handle acquired");
        DisplayHandle { id }
    }

    /// 解放。既に解放済み（あり得ないはず）の場合 false
    pub fn release(&mut self, handle: DisplayHandle) -> bool {
        let removed = self.live.remove(&handle.id).is_some();
        if removed {
            self.released += 1;
            tracing::debug!(handle = handle.id, live = self.live.len(), "display handle released");
        } else {
            tracing::warn!(handle = handle.id, "release of unknown display handle");
        }
        removed
    }

    /// 旧ハンドルを解放してから新しいペイロードのハンドルを発行
    pub fn replace(&mut self, old: Option<DisplayHandle>, payload: ImagePayload) -> DisplayHandle {
        if let Some(old) = old {
            self.release(old);
        }
        self.acquire(payload)
    }

    pub fn resolve(&self, handle: &DisplayHandle) -> Option<&ImagePayload> {
        self.live.get(&handle.id)
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn released_count(&self) -> u64 {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(tag: u8) -> ImagePayload {
        ImagePayload::new(vec![tag; 4], "image/png")
    }

    #[test]
    fn test_acquire_and_resolve() {
        let mut resources = ResourceLifecycle::new();
        let handle = resources.acquire(payload(1));

        assert_eq!(resources.live_count(), 1);
        assert_eq!(resources.resolve(&handle).map(|p| p.bytes()), Some(&[1u8; 4][..]));
        assert!(handle.url().starts_with("blob:guardian/"));
        assert_eq!(handle.to_string(), handle.url());
        assert!(resources.release(handle));
        assert_eq!(resources.live_count(), 0);
        assert_eq!(resources.released_count(), 1);
    }

    #[test]
    fn test_replace_releases_old() {
        let mut resources = ResourceLifecycle::new();
        let first = resources.acquire(payload(1));
        let first_id = first.id();

        let second = resources.replace(Some(first), payload(2));
        assert!(!resources.is_live(first_id));
        assert!(resources.is_live(second.id()));
        assert_eq!(resources.live_count(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut resources = ResourceLifecycle::new();
        let a = resources.acquire(payload(1));
        let a_id = a.id();
        resources.release(a);
        let b = resources.acquire(payload(2));
        assert_ne!(a_id, b.id());
    }

    #[test]
    fn test_payload_accessors() {
        let p = ImagePayload::new(Vec::<u8>::new(), "image/jpeg");
        assert!(p.is_empty());
        assert_eq!(p.len(), 0);
        assert_eq!(p.media_type(), "image/jpeg");
    }
}
