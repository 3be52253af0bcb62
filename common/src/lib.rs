//! Guardian AI Common Library
//!
//! 診断サービスとのやり取りに使う型とユーティリティ（フロントエンド非依存）

pub mod error;
pub mod parser;
pub mod selection;
pub mod types;

pub use error::{Error, Result};
pub use parser::{format_indices, parse_index_list, parse_scan_response};
pub use selection::SelectionSet;
pub use types::{
    Bounds, Detection, DetectionKind, DetectionReport, MetadataFindings, ProtectAction, RiskLevel,
    NO_THREATS_MESSAGE, SAFE_THRESHOLD, UNKNOWN_DEVICE,
};
