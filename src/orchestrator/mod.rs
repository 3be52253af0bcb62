//! サービス呼び出しの境界アダプタ
//!
//! 1回の呼び出しにつき1リクエスト。結果を DetectionReport / 保護済み画像に変換し、
//! あらゆる失敗を ScanFailed / ProtectionFailed に写す。状態は持たない。

mod protect;
mod scan;

pub use protect::ProtectionOrchestrator;
pub use scan::ScanOrchestrator;
