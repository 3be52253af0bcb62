//! 非ブロッキングの失敗通知
//!
//! 外部サービス起因の失敗だけを積む。利用者は個別に閉じるか、retry の内容で再実行する。

use chrono::{DateTime, Local};
use guardian_common::ProtectAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    ScanFailed,
    ProtectionFailed,
}

/// 通知から再実行する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Scan,
    Protect(ProtectAction),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub retry: RetryAction,
    pub raised_at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct NoticeBoard {
    next_id: u64,
    pending: Vec<Notice>,
}

impl NoticeBoard {
    pub fn push(&mut self, kind: NoticeKind, message: String, retry: RetryAction) -> u64 {
        self.next_id += 1;
        self.pending.push(Notice {
            id: self.next_id,
            kind,
            message,
            retry,
            raised_at: Local::now(),
        });
        self.next_id
    }

    pub fn pending(&self) -> &[Notice] {
        &self.pending
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.pending.len();
        self.pending.retain(|n| n.id != id);
        self.pending.len() != before
    }

    pub fn take_all(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_dismiss() {
        let mut board = NoticeBoard::default();
        let first = board.push(NoticeKind::ScanFailed, "timeout".into(), RetryAction::Scan);
        let second = board.push(
            NoticeKind::ProtectionFailed,
            "HTTP 500".into(),
            RetryAction::Protect(ProtectAction::Cloak),
        );
        assert_ne!(first, second);
        assert_eq!(board.pending().len(), 2);

        assert!(board.dismiss(first));
        assert!(!board.dismiss(first));
        assert_eq!(board.pending()[0].retry, RetryAction::Protect(ProtectAction::Cloak));
    }

    #[test]
    fn test_take_all_empties() {
        let mut board = NoticeBoard::default();
        board.push(NoticeKind::ScanFailed, "x".into(), RetryAction::Scan);
        assert_eq!(board.take_all().len(), 1);
        assert!(board.is_empty());
    }
}
