use std::path::Path;

use crate::error::OcrError;
use crate::extract::extract_fields;
use crate::ocr::{load_image, words_from_raw, OcrEngine};
use crate::rows::{group_by_line, row_text};
use crate::types::{ExtractedRow, RawRow, Report, Summary, WordInfo, WordToken};

/// Decode the image, recognize it and build the report.
pub fn extract_report(engine: &dyn OcrEngine, image_path: &Path) -> Result<Report, OcrError> {
    let _span = tracing::info_span!("ocr", image = %image_path.display()).entered();
    let image = load_image(image_path)?;
    let raw = engine.recognize(&image)?;
    let words = words_from_raw(&raw);
    tracing::info!(words = words.len(), "recognized words");
    Ok(build_report(&words))
}

/// Group tokens into rows, extract fields per row and collect the summary.
pub fn build_report(words: &[WordToken]) -> Report {
    let rows = group_by_line(words);
    tracing::info!(rows = rows.len(), "grouped words into lines");

    let mut raw_rows = Vec::with_capacity(rows.len());
    let mut extracted_rows = Vec::with_capacity(rows.len());
    for row in &rows {
        let text = row_text(row);
        let extracted = extract_fields(&text);
        tracing::debug!(
            row = %text,
            layer = ?extracted.layer,
            version = ?extracted.version,
            barcode = ?extracted.barcode,
            "extracted row"
        );
        raw_rows.push(RawRow {
            row_text: text,
            words: row.iter().map(WordInfo::from).collect(),
        });
        extracted_rows.push(extracted);
    }

    let summary = summarize(&extracted_rows);
    Report {
        raw_rows,
        extracted_rows,
        summary,
    }
}

fn summarize(rows: &[ExtractedRow]) -> Summary {
    Summary {
        layers: rows.iter().filter_map(|r| r.layer.clone()).collect(),
        versions: rows.iter().filter_map(|r| r.version.clone()).collect(),
        barcodes: rows.iter().filter_map(|r| r.barcode.clone()).collect(),
    }
}

/// Pretty JSON with four-space indentation; non-ASCII text is written as is.
pub fn report_to_json(report: &Report) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(report, &mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawWord;
    use image::{DynamicImage, ImageFormat};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct FakeEngine {
        words: Vec<RawWord>,
        calls: Cell<usize>,
    }

    impl OcrEngine for FakeEngine {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RawWord>, OcrError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.words.clone())
        }
    }

    fn raw(text: &str, left: i32, line: u32) -> RawWord {
        RawWord {
            text: text.to_string(),
            conf: "90".to_string(),
            left,
            top: (line as i32) * 30,
            width: 40,
            height: 20,
            block_num: 1,
            par_num: 1,
            line_num: line,
            word_num: 1,
        }
    }

    fn table_words() -> Vec<RawWord> {
        vec![
            raw("042", 100, 1),
            raw("слой", 0, 1),
            raw("ABC123XYZ0", 300, 1),
            raw("3", 200, 1),
            raw("", 400, 1),
            raw("Заголовок", 0, 0),
            raw("120", 0, 2),
            raw("120", 100, 2),
        ]
    }

    #[test]
    fn builds_rows_fields_and_summary() {
        let report = build_report(&words_from_raw(&table_words()));
        let texts: Vec<&str> = report.raw_rows.iter().map(|r| r.row_text.as_str()).collect();
        assert_eq!(texts, vec!["Заголовок", "слой 042 3 ABC123XYZ0", "120 120"]);

        assert_eq!(
            report.extracted_rows[1],
            ExtractedRow {
                row_text: "слой 042 3 ABC123XYZ0".to_string(),
                layer: Some("042".to_string()),
                version: Some("3".to_string()),
                barcode: Some("ABC123XYZ0".to_string()),
            }
        );
        assert_eq!(report.extracted_rows[2].version, None);
        assert_eq!(
            report.summary,
            Summary {
                layers: vec!["042".to_string(), "120".to_string()],
                versions: vec!["3".to_string()],
                barcodes: vec!["ABC123XYZ0".to_string()],
            }
        );
    }

    #[test]
    fn raw_rows_keep_word_geometry() {
        let report = build_report(&words_from_raw(&table_words()));
        let row = &report.raw_rows[1];
        assert_eq!(row.words.len(), 4);
        assert_eq!(row.words[0].text, "слой");
        assert_eq!(row.words[0].x_center, 20);
        assert_eq!(row.words[1].conf, 90.0);
    }

    #[test]
    fn json_keeps_cyrillic_and_nulls() {
        let report = build_report(&words_from_raw(&[raw("Заголовок", 0, 0)]));
        let json = report_to_json(&report).unwrap();
        assert!(json.contains("\"row_text\": \"Заголовок\""));
        assert!(json.contains("\"layer\": null"));
        assert!(json.contains("\n    \"extracted_rows\""));
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn summary_is_keyed_by_field_name() {
        let report = build_report(&words_from_raw(&table_words()));
        let json: serde_json::Value = serde_json::from_str(&report_to_json(&report).unwrap()).unwrap();
        let mut keys: Vec<&str> = json["summary"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["barcodes", "layers", "versions"]);
        assert_eq!(json["summary"]["versions"], serde_json::json!(["3"]));
    }

    #[test]
    fn extract_report_runs_engine_on_decoded_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.png");
        DynamicImage::new_rgb8(4, 4)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        let engine = FakeEngine {
            words: table_words(),
            calls: Cell::new(0),
        };
        let report = extract_report(&engine, &path).unwrap();
        assert_eq!(engine.calls.get(), 1);
        assert_eq!(report.summary.layers, vec!["042", "120"]);
    }

    #[test]
    fn undecodable_image_stops_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        let engine = FakeEngine {
            words: table_words(),
            calls: Cell::new(0),
        };
        let err = extract_report(&engine, &path).unwrap_err();
        assert!(matches!(err, OcrError::ImageDecode { .. }));
        assert_eq!(engine.calls.get(), 0);
    }
}
