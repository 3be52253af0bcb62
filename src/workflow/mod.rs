//! ワークフロー制御
//!
//! - controller: 状態機械（同期）。世代番号で古い応答を捨てる
//! - driver: コントローラとオーケストレータをつなぐ非同期ドライバ
//! - notice: 失敗通知

mod controller;
mod driver;
mod notice;
mod state;

pub use controller::{
    Completion, Download, ProtectTicket, ScanTicket, WorkflowController, WorkflowOptions,
};
pub use driver::Workflow;
pub use notice::{Notice, NoticeBoard, NoticeKind, RetryAction};
pub use state::{ProtectedImage, Review, StateKind};
