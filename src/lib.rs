//! Guardian AI クライアント
//!
//! 画像を受け付け、外部サービスでプライバシー診断を行い、利用者が選んだ領域を
//! 墨消しした画像を得るまでのワークフローを制御する。

pub mod cli;
pub mod config;
pub mod error;
pub mod intake;
pub mod orchestrator;
pub mod resource;
pub mod service;
pub mod session;
pub mod view;
pub mod workflow;
