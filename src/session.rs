//! 対話式レビュー
//!
//! スキャン → 墨消し対象の選択 → 保護処理 → 保存 を端末上で進める。
//! 通信失敗は通知として表示し、再試行するかを尋ねる。

use crate::error::{GuardianError, Result};
use crate::intake;
use crate::view;
use crate::workflow::{Completion, Workflow};
use dialoguer::{Confirm, MultiSelect, Select};
use guardian_common::{ProtectAction, SelectionSet};
use std::path::{Path, PathBuf};

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Protect(ProtectAction),
    Quit,
}

const ACTION_ITEMS: &[(&str, SessionAction)] = &[
    ("Blur Selected（選択項目をぼかす）", SessionAction::Protect(ProtectAction::BlurSelected)),
    ("AI Cloaking（画像全体）", SessionAction::Protect(ProtectAction::Cloak)),
    ("終了", SessionAction::Quit),
];

/// 現在の選択を `chosen` に揃えるために反転すべきインデックス
pub fn indices_to_toggle(current: &SelectionSet, chosen: &[usize]) -> Vec<usize> {
    (0..current.detection_count())
        .filter(|&i| current.contains(i) != chosen.contains(&i))
        .collect()
}

fn prompt_error(e: dialoguer::Error) -> GuardianError {
    GuardianError::Prompt(e.to_string())
}

fn confirm_retry(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(prompt_error)
}

/// 通知を表示して消す
async fn flush_notices(workflow: &Workflow) {
    let notices = workflow.controller().await.take_notices();
    for notice in &notices {
        view::print_notice(notice);
    }
}

/// 対話式で診断・保護を行う
pub async fn run_interactive(workflow: &Workflow, path: &Path, output: Option<&Path>) -> Result<()> {
    let (bytes, media_type) = intake::load_file(path)?;

    println!("[事前チェック] 端末内でメタデータを確認");
    view::print_metadata(&intake::inspect_metadata(&bytes));
    println!();

    workflow.accept_file(bytes, &media_type).await?;

    // 1. スキャン
    loop {
        let pb = view::spinner("Running Forensics...");
        let result = workflow.start_scan().await;
        pb.finish_and_clear();

        match result {
            Ok(_) => break,
            Err(e) if e.is_environment_failure() => {
                flush_notices(workflow).await;
                if !confirm_retry("スキャンを再試行しますか?")? {
                    return Ok(());
                }
            }
            Err(e) => return Err(e),
        }
    }

    let labels = {
        let controller = workflow.controller().await;
        let report = controller
            .report()
            .ok_or_else(|| GuardianError::ScanFailed("レポートがありません".into()))?;
        view::print_report(report);
        view::detection_labels(report)
    };

    // 2. 選択と保護
    loop {
        if !labels.is_empty() {
            let defaults: Vec<bool> = {
                let controller = workflow.controller().await;
                let selection = controller.selection();
                (0..labels.len())
                    .map(|i| selection.map(|s| s.contains(i)).unwrap_or(false))
                    .collect()
            };
            let chosen = MultiSelect::new()
                .with_prompt("墨消しする項目を選択 (Space:切替 Enter:確定)")
                .items(&labels)
                .defaults(&defaults)
                .interact()
                .map_err(prompt_error)?;

            let toggles = {
                let controller = workflow.controller().await;
                controller
                    .selection()
                    .map(|s| indices_to_toggle(s, &chosen))
                    .unwrap_or_default()
            };
            for index in toggles {
                workflow.toggle_selection(index).await?;
            }
        }

        let names: Vec<&str> = ACTION_ITEMS.iter().map(|(name, _)| *name).collect();
        let picked = Select::new()
            .with_prompt("保護方法")
            .items(&names)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        let action = match ACTION_ITEMS[picked].1 {
            SessionAction::Protect(action) => action,
            SessionAction::Quit => {
                println!("保存せずに終了します");
                return Ok(());
            }
        };

        let pb = view::spinner("Applying protection...");
        let result = workflow.apply_protection(action).await;
        pb.finish_and_clear();

        match result {
            Ok(Completion::Applied) => break,
            Ok(Completion::Stale) => return Ok(()),
            Err(GuardianError::EmptySelection) => {
                println!("  → ぼかす項目を1つ以上選択してください\n");
            }
            Err(e) if e.is_environment_failure() => {
                flush_notices(workflow).await;
                if !confirm_retry("保護処理をやり直しますか?")? {
                    return Ok(());
                }
            }
            Err(e) => return Err(e),
        }
    }

    // 3. 保存
    let saved = save_download(workflow, output).await?;
    println!("\n✅ Image Secured Successfully: {}", saved.display());
    Ok(())
}

/// 保護済み画像を保存する。出力先省略時はカレントに既定名で保存
pub async fn save_download(workflow: &Workflow, output: Option<&Path>) -> Result<PathBuf> {
    let controller = workflow.controller().await;
    let download = controller.download().ok_or(GuardianError::InvalidTransition {
        operation: "download",
        state: controller.state_kind(),
    })?;

    let path = match output {
        Some(p) if p.is_dir() => p.join(download.file_name),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(download.file_name),
    };
    std::fs::write(&path, download.bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_to_toggle() {
        let mut current = SelectionSet::new(4);
        current.add(0).unwrap();
        current.add(2).unwrap();

        assert_eq!(indices_to_toggle(&current, &[0, 3]), vec![2, 3]);
        assert_eq!(indices_to_toggle(&current, &[0, 2]), Vec::<usize>::new());
        assert_eq!(indices_to_toggle(&current, &[]), vec![0, 2]);
    }

    #[test]
    fn test_indices_to_toggle_ignores_out_of_range() {
        let current = SelectionSet::new(2);
        assert_eq!(indices_to_toggle(&current, &[1, 5]), vec![1]);
    }

    #[test]
    fn test_action_items_end_with_quit() {
        assert_eq!(ACTION_ITEMS.last().map(|(_, a)| *a), Some(SessionAction::Quit));
        assert_eq!(
            ACTION_ITEMS[1].1,
            SessionAction::Protect(ProtectAction::Cloak)
        );
    }
}
