use calamine::{open_workbook_auto, Data, Reader};
use edit_xlsx::Write;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write as IoWrite};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::PatchError;

/// Column index to Excel letter (0→A, 1→B, 25→Z, 26→AA).
pub fn col_index_to_letter(index: u32) -> String {
    let mut n = index;
    let mut s = String::new();
    loop {
        let r = (n % 26) as u8;
        s.insert(0, (b'A' + r) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

/// A1-style reference for a 1-based (row, col).
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_index_to_letter(col.saturating_sub(1)), row)
}

/// Cell content as seen by the patcher. `Empty` is a cell with no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(n) => CellValue::Number(*n),
            Data::Int(n) => CellValue::Number(*n as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// The active sheet of an open workbook. Rows and columns are 1-based.
pub trait Workbook {
    fn max_row(&self) -> u32;
    fn cell(&self, row: u32, col: u32) -> CellValue;
    fn set_cell(&mut self, row: u32, col: u32, value: &str) -> Result<(), PatchError>;
}

/// Opens and persists workbooks.
pub trait WorkbookStore {
    type Book: Workbook;

    fn open(&self, path: &Path) -> Result<Self::Book, PatchError>;
    fn save(&self, book: &mut Self::Book, path: &Path) -> Result<(), PatchError>;
}

/// `.xlsx` store: values are read with calamine, edits and saves go through
/// edit-xlsx so template formatting survives.
#[derive(Debug, Clone, Default)]
pub struct XlsxStore {
    pub strip_drawings: bool,
}

pub struct XlsxBook {
    sheet_name: String,
    values: HashMap<(u32, u32), CellValue>,
    max_row: u32,
    workbook: edit_xlsx::Workbook,
}

impl XlsxBook {
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}

impl Workbook for XlsxBook {
    fn max_row(&self) -> u32 {
        self.max_row
    }

    fn cell(&self, row: u32, col: u32) -> CellValue {
        self.values.get(&(row, col)).cloned().unwrap_or_default()
    }

    fn set_cell(&mut self, row: u32, col: u32, value: &str) -> Result<(), PatchError> {
        let reference = cell_ref(row, col);
        let worksheet = self
            .workbook
            .get_worksheet_mut_by_name(&self.sheet_name)
            .map_err(|e| PatchError::Sheet(format!("{}: {}", self.sheet_name, e)))?;
        worksheet
            .write_string(&reference, sanitize_cell(value))
            .map_err(|e| PatchError::Write {
                cell: reference.clone(),
                message: e.to_string(),
            })?;
        self.values.insert((row, col), CellValue::from(value));
        self.max_row = self.max_row.max(row);
        Ok(())
    }
}

impl WorkbookStore for XlsxStore {
    type Book = XlsxBook;

    /// Open the active sheet of the workbook.
    fn open(&self, path: &Path) -> Result<XlsxBook, PatchError> {
        if !path.exists() {
            return Err(PatchError::FileNotFound(path.to_path_buf()));
        }
        let mut reader = open_workbook_auto(path).map_err(|e| PatchError::Open(e.to_string()))?;
        let names = reader.sheet_names();
        let active = active_sheet_index(path);
        let sheet_name = names
            .get(active)
            .or_else(|| names.first())
            .cloned()
            .ok_or_else(|| PatchError::Sheet("workbook has no sheets".to_string()))?;
        let range = reader
            .worksheet_range(&sheet_name)
            .map_err(|e| PatchError::Sheet(format!("{}: {}", sheet_name, e)))?;

        let mut values = HashMap::new();
        if let Some((row0, col0)) = range.start() {
            for (ri, row) in range.rows().enumerate() {
                for (ci, data) in row.iter().enumerate() {
                    let value = CellValue::from(data);
                    if !value.is_empty() {
                        values.insert((row0 + ri as u32 + 1, col0 + ci as u32 + 1), value);
                    }
                }
            }
        }
        let max_row = range.end().map(|(r, _)| r + 1).unwrap_or(0);
        tracing::debug!(sheet = %sheet_name, max_row, cells = values.len(), "loaded sheet");

        let workbook = edit_xlsx::Workbook::from_path(path).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("Could not open") || msg.contains("permission") || msg.contains("Permission") {
                PatchError::Open("Please close the file in Excel first.".to_string())
            } else {
                PatchError::Open(msg)
            }
        })?;

        Ok(XlsxBook {
            sheet_name,
            values,
            max_row,
            workbook,
        })
    }

    fn save(&self, book: &mut XlsxBook, path: &Path) -> Result<(), PatchError> {
        book.workbook.save_as(path).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("Permission denied") || msg.contains("being used") {
                PatchError::Save("Please close the file in Excel first.".to_string())
            } else {
                PatchError::Save(msg)
            }
        })?;
        if self.strip_drawings {
            strip_drawings_from_xlsx(path)?;
        }
        Ok(())
    }
}

/// Index of the selected tab from `<workbookView activeTab="N">` in
/// `xl/workbook.xml`. 0 when the attribute or the part is missing.
pub fn active_sheet_index(path: &Path) -> usize {
    let read_workbook_xml = || -> Option<String> {
        let file = std::fs::File::open(path).ok()?;
        let mut archive = ZipArchive::new(file).ok()?;
        let mut entry = archive.by_name("xl/workbook.xml").ok()?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml).ok()?;
        Some(xml)
    };
    let Some(xml) = read_workbook_xml() else {
        return 0;
    };
    let Ok(re) = Regex::new(r#"<workbookView\b[^>]*\bactiveTab="(\d+)""#) else {
        return 0;
    };
    re.captures(&xml)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Drop characters that are not allowed in sheet XML: control chars (except
/// tab, newline, CR) and the U+FFFE/U+FFFF non-characters. Markup characters
/// are escaped by edit-xlsx on write.
pub fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            matches!(c, '\t' | '\n' | '\r') || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

/// Strip drawing and image parts from a saved xlsx so Excel won't show
/// "Repairs to ... Removed Part: Drawing shape". Worksheet XML is copied unchanged.
pub fn strip_drawings_from_xlsx(path: &Path) -> Result<(), PatchError> {
    use std::fs::File;

    let file = File::open(path).map_err(|e| PatchError::Save(format!("Could not open for strip: {}", e)))?;
    let mut archive = ZipArchive::new(file).map_err(|e| PatchError::Save(format!("Invalid zip: {}", e)))?;

    let temp_path = path.with_extension("tmp.xlsx");
    let out_file =
        File::create(&temp_path).map_err(|e| PatchError::Save(format!("Could not create temp: {}", e)))?;
    let mut zip_writer = ZipWriter::new(out_file);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let rel_drawing_re = Regex::new(r#"<Relationship[^>]*drawing[^>]*/>"#).expect("rel drawing regex");
    let ct_drawing_re =
        Regex::new(r#"<Override\s+PartName="/xl/drawings/[^"]*"[^>]*/>"#).expect("ct drawing regex");
    let ct_media_re = Regex::new(r#"<Override\s+PartName="/xl/media/[^"]*"[^>]*/>"#).expect("ct media regex");

    let mut stripped = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| PatchError::Save(format!("Entry {}: {}", i, e)))?;
        let name = entry.name().replace('\\', "/");
        if name.starts_with("xl/drawings/") || name.starts_with("xl/media/") {
            stripped += 1;
            continue;
        }
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| PatchError::Save(format!("Read {}: {}", name, e)))?;

        let data = if name == "[Content_Types].xml" {
            let s = String::from_utf8_lossy(&data);
            let out = ct_drawing_re.replace_all(&s, "");
            ct_media_re.replace_all(&out, "").into_owned().into_bytes()
        } else if name.contains("worksheets/_rels/") && name.ends_with(".rels") {
            let s = String::from_utf8_lossy(&data);
            rel_drawing_re.replace_all(&s, "").into_owned().into_bytes()
        } else {
            data
        };
        zip_writer
            .start_file(name.as_str(), opts)
            .map_err(|e| PatchError::Save(e.to_string()))?;
        zip_writer
            .write_all(&data)
            .map_err(|e| PatchError::Save(e.to_string()))?;
    }
    zip_writer.finish().map_err(|e| PatchError::Save(e.to_string()))?;
    std::fs::rename(&temp_path, path).map_err(|e| PatchError::Save(format!("Replace file: {}", e)))?;
    if stripped > 0 {
        tracing::info!(parts = stripped, path = %path.display(), "stripped drawing parts");
    }
    Ok(())
}
