//! 端末表示（レポート・通知・スピナー）

use crate::workflow::Notice;
use guardian_common::{DetectionReport, MetadataFindings, RiskLevel};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// 検出一覧の表示ラベル（"#0 FACE" 形式）
pub fn detection_labels(report: &DetectionReport) -> Vec<String> {
    report
        .detections
        .iter()
        .map(|d| format!("#{} {}", d.index, d.kind))
        .collect()
}

pub fn print_report(report: &DetectionReport) {
    let marker = match report.risk_level() {
        RiskLevel::High => "⚠",
        RiskLevel::Safe => "✔",
    };
    println!("Trust Score: {} / 100", report.score);
    println!("  {} {}\n", marker, report.risk_level().label());

    println!("検出された脅威:");
    for threat in report.threat_messages() {
        println!("  - {}", threat);
    }

    println!("\n墨消し候補:");
    if report.detections.is_empty() {
        println!("  (なし)");
    }
    for label in detection_labels(report) {
        println!("  {}", label);
    }

    println!();
    print_metadata(&report.metadata);
}

pub fn print_metadata(meta: &MetadataFindings) {
    println!("メタデータ:");
    println!("  GPS位置情報: {}", meta.gps_label());
    if let (Some(lat), Some(lon)) = (meta.latitude, meta.longitude) {
        println!("  座標: {:.5}, {:.5}", lat, lon);
    }
    println!("  撮影機器: {}", meta.device_info);
}

pub fn print_notice(notice: &Notice) {
    eprintln!(
        "✖ [{}] {}",
        notice.raised_at.format("%H:%M:%S"),
        notice.message
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_common::parse_scan_response;

    #[test]
    fn test_detection_labels() {
        let report = parse_scan_response(
            r#"{"score": 30, "detections": [{"type": "FACE"}, {"type": "BARCODE"}]}"#,
        )
        .unwrap();
        assert_eq!(detection_labels(&report), vec!["#0 FACE", "#1 BARCODE"]);
    }
}
