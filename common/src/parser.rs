//! APIレスポンスパーサー
//!
//! `/api/scan` のJSONを DetectionReport に変換し、
//! `/api/protect` の indices フィールドを組み立てる

use crate::error::{Error, Result};
use crate::types::{Bounds, Detection, DetectionKind, DetectionReport, MetadataFindings, UNKNOWN_DEVICE};
use serde::Deserialize;

/// `/api/scan` レスポンス（ワイヤ形式）
#[derive(Debug, Deserialize)]
struct ScanResponse {
    score: i64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    detections: Vec<WireDetection>,
    #[serde(default)]
    threats: Vec<String>,
    #[serde(default)]
    meta: Option<WireMeta>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "box", default)]
    bounds: Option<[i64; 4]>,
}

#[derive(Debug, Deserialize)]
struct WireMeta {
    #[serde(default)]
    gps_found: bool,
    #[serde(default)]
    device_info: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// スキャンレスポンスをパース
///
/// 検出配列の順序がそのままインデックスになる。
///
/// # Examples
/// ```
/// use guardian_common::parse_scan_response;
///
/// let body = r#"{"score": 30, "detections": [{"type": "FACE"}], "threats": [],
///               "meta": {"gps_found": false, "device_info": "Pixel 7"}}"#;
/// let report = parse_scan_response(body).unwrap();
/// assert_eq!(report.detections[0].index, 0);
/// ```
pub fn parse_scan_response(body: &str) -> Result<DetectionReport> {
    let wire: ScanResponse = serde_json::from_str(body.trim())?;

    let score = u8::try_from(wire.score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or(Error::ScoreOutOfRange(wire.score))?;

    let detections = wire
        .detections
        .into_iter()
        .enumerate()
        .map(|(index, d)| Detection {
            index,
            kind: DetectionKind::from(d.kind),
            bounds: d.bounds.map(|[x, y, width, height]| Bounds { x, y, width, height }),
        })
        .collect();

    let metadata = match wire.meta {
        Some(meta) => MetadataFindings {
            gps_found: meta.gps_found,
            device_info: meta
                .device_info
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
            latitude: meta.lat,
            longitude: meta.lon,
        },
        None => MetadataFindings::default(),
    };

    Ok(DetectionReport {
        score,
        detections,
        threats: wire.threats,
        metadata,
        status: wire.status,
    })
}

/// インデックス列をカンマ区切りに整形
pub fn format_indices<I>(indices: I) -> String
where
    I: IntoIterator<Item = usize>,
{
    indices
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// "0, 2,3" 形式をパース（空文字列は空リスト）
pub fn parse_index_list(input: &str) -> Result<Vec<usize>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| Error::Parse(format!("invalid index: {}", s)))
        })
        .collect()
}
