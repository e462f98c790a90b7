//! Field rules for a normalized row of the photomask label table.
//!
//! The rules are permissive pattern matches, applied in order: layer first,
//! then version (which must differ from the layer), then barcode.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::ExtractedRow;

const MIN_BARCODE_LEN: usize = 6;

fn layer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{3})\b").expect("layer regex"))
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-9]\d*)\b").expect("version regex"))
}

fn barcode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z0-9]{6,20})\b").expect("barcode regex"))
}

/// Leftmost standalone run of exactly three digits.
pub fn extract_layer(row_text: &str) -> Option<String> {
    layer_re()
        .captures(row_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// First standalone number without a leading zero that is not the layer.
pub fn extract_version(row_text: &str, layer: Option<&str>) -> Option<String> {
    version_re()
        .captures_iter(row_text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|val| layer.map_or(true, |l| *val != l))
        .map(str::to_string)
}

/// First standalone alphanumeric run of 6 to 20 characters.
pub fn extract_barcode(row_text: &str) -> Option<String> {
    barcode_re()
        .captures_iter(row_text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|candidate| candidate.len() >= MIN_BARCODE_LEN)
        .map(str::to_string)
}

pub fn extract_fields(row_text: &str) -> ExtractedRow {
    let layer = extract_layer(row_text);
    let version = extract_version(row_text, layer.as_deref());
    let barcode = extract_barcode(row_text);
    ExtractedRow {
        row_text: row_text.to_string(),
        layer,
        version,
        barcode,
    }
}
