use serde::{Deserialize, Serialize};

/// Per-token columns as reported by the OCR engine, before filtering.
/// Confidence stays a raw string so malformed values can be defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWord {
    pub text: String,
    pub conf: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub block_num: u32,
    pub par_num: u32,
    pub line_num: u32,
    pub word_num: u32,
}

/// One recognized word with its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    pub confidence: f64,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub x_center: i32,
    pub y_center: i32,
    pub block_id: u32,
    pub paragraph_id: u32,
    pub line_id: u32,
    pub word_index: u32,
}

impl WordToken {
    /// (block, paragraph, line): tokens sharing this key form one row.
    pub fn line_key(&self) -> (u32, u32, u32) {
        (self.block_id, self.paragraph_id, self.line_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordInfo {
    pub text: String,
    pub conf: f64,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub x_center: i32,
}

impl From<&WordToken> for WordInfo {
    fn from(w: &WordToken) -> Self {
        Self {
            text: w.text.clone(),
            conf: w.confidence,
            left: w.left,
            top: w.top,
            width: w.width,
            height: w.height,
            x_center: w.x_center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_text: String,
    pub words: Vec<WordInfo>,
}

/// Fields pulled out of one row. Missing fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRow {
    pub row_text: String,
    pub layer: Option<String>,
    pub version: Option<String>,
    pub barcode: Option<String>,
}

/// Non-null fields collected over all rows, in row order. Serialized under
/// the keys `layers`, `versions` and `barcodes`, not the sheet's Russian
/// column labels ("№ слоя", "Версия слоя", "Штрихкод").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub layers: Vec<String>,
    pub versions: Vec<String>,
    pub barcodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub raw_rows: Vec<RawRow>,
    pub extracted_rows: Vec<ExtractedRow>,
    pub summary: Summary,
}
