use exif::{Context, Exif, In, Reader, Tag, Value};
use guardian_common::{MetadataFindings, UNKNOWN_DEVICE};
use std::io::Cursor;

/// 画像内のEXIFからGPS有無と撮影機器を読む（サービスには送らない）
///
/// EXIFが無い・読めない場合は既定値（GPSなし、機器不明）を返す。
pub fn inspect_metadata(bytes: &[u8]) -> MetadataFindings {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "no readable EXIF");
            return MetadataFindings::default();
        }
    };

    let gps_found = exif.fields().any(|f| f.tag.context() == Context::Gps);

    let device = [Tag::Make, Tag::Model]
        .into_iter()
        .filter_map(|tag| ascii_field(&exif, tag))
        .collect::<Vec<_>>()
        .join(" ");

    MetadataFindings {
        gps_found,
        device_info: if device.is_empty() {
            UNKNOWN_DEVICE.to_string()
        } else {
            device
        },
        latitude: coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S"),
        longitude: coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W"),
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).trim().trim_end_matches('\0').to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// 度分秒（Rational x3）を10進度に変換
fn coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: &str) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let dms = match &field.value {
        Value::Rational(parts) if parts.len() >= 3 => parts,
        _ => return None,
    };
    let degrees = dms[0].to_f64() + dms[1].to_f64() / 60.0 + dms[2].to_f64() / 3600.0;

    let negative = ascii_field(exif, ref_tag)
        .map(|r| r.eq_ignore_ascii_case(negative_ref))
        .unwrap_or(false);
    Some(if negative { -degrees } else { degrees })
}
