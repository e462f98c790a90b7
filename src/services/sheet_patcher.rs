//! Layer-number patching for cover-letter workbooks (1-based row/col).
//!
//! Every row whose search column mentions the search text gets
//! `prefix + source value` written to its target column, and the row above
//! it gets the fixed above-value in the same column.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::config::{PatchOptions, PatchSettings, SaveMode};
use crate::error::PatchError;
use crate::excel::{CellValue, Workbook, WorkbookStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub saved_path: Option<PathBuf>,
    pub modified_rows: Vec<u32>,
}

pub struct SheetPatcher {
    src: PathBuf,
    prefix: String,
    above_value: String,
    options: PatchOptions,
}

impl SheetPatcher {
    pub fn new(
        src: impl Into<PathBuf>,
        prefix: &str,
        above_value: &str,
        options: PatchOptions,
    ) -> Result<Self, PatchError> {
        let src = src.into();
        options.validate()?;
        if !src.exists() {
            return Err(PatchError::FileNotFound(src));
        }
        Ok(Self {
            src,
            prefix: prefix.to_string(),
            above_value: above_value.to_string(),
            options,
        })
    }

    pub fn from_settings(settings: &PatchSettings) -> Result<Self, PatchError> {
        Self::new(
            settings.source.clone(),
            &settings.prefix,
            &settings.above_value,
            settings.options.clone(),
        )
    }

    /// Workbook this patcher reads and, in `InPlace` mode, overwrites.
    pub fn source(&self) -> &Path {
        &self.src
    }

    fn matches_search(&self, value: &CellValue) -> bool {
        if value.is_empty() {
            return false;
        }
        let text = value.to_string();
        if self.options.case_sensitive {
            text.contains(&self.options.search_text)
        } else {
            text.to_lowercase()
                .contains(&self.options.search_text.to_lowercase())
        }
    }

    /// Apply the patch to an open sheet and return the rows that were written.
    pub fn patch<B: Workbook>(&self, book: &mut B) -> Result<Vec<u32>, PatchError> {
        let opts = &self.options;
        let mut modified_rows = Vec::new();
        for row in 1..=book.max_row() {
            if !self.matches_search(&book.cell(row, opts.search_col)) {
                continue;
            }
            let source = book.cell(row, opts.source_col);
            if source.is_empty() {
                continue;
            }
            let source = source.to_string();
            let value = source.trim();
            if value.is_empty() {
                continue;
            }
            book.set_cell(row, opts.target_col, &format!("{}{}", self.prefix, value))?;
            if row > 1 {
                book.set_cell(row - 1, opts.target_col, &self.above_value)?;
            }
            tracing::debug!(row, value, "patched row");
            modified_rows.push(row);
        }
        Ok(modified_rows)
    }

    /// Open, patch and save according to `mode`.
    pub fn run<S: WorkbookStore>(&self, store: &S, mode: SaveMode) -> Result<PatchOutcome, PatchError> {
        let mut book = store.open(&self.src)?;
        let modified_rows = self.patch(&mut book)?;
        tracing::info!(rows = modified_rows.len(), src = %self.src.display(), "patched workbook");

        let saved_path = match mode {
            SaveMode::InPlace => {
                store.save(&mut book, &self.src)?;
                Some(self.src.clone())
            }
            SaveMode::Copy => {
                let dest = self.resolve_dest_path(&timestamp());
                if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| PatchError::Save(format!("Could not create {}: {}", parent.display(), e)))?;
                }
                store.save(&mut book, &dest)?;
                Some(dest)
            }
            SaveMode::None => None,
        };
        if let Some(path) = &saved_path {
            tracing::info!(path = %path.display(), "saved workbook");
        }
        Ok(PatchOutcome {
            saved_path,
            modified_rows,
        })
    }

    fn timestamped_name(&self, timestamp: &str) -> String {
        let stem = self
            .src
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}_{}.xlsx", stem, timestamp)
    }

    /// Where a copy is saved, given the run's `YYYYMMDD_HHMMSS` timestamp.
    pub fn resolve_dest_path(&self, timestamp: &str) -> PathBuf {
        let Some(raw) = self.options.dest.as_deref() else {
            return self.src.with_file_name(self.timestamped_name(timestamp));
        };
        let dest = PathBuf::from(raw);
        if raw.ends_with('/') || raw.ends_with('\\') || dest.is_dir() {
            return dest.join(self.timestamped_name(timestamp));
        }
        let has_parent = dest
            .parent()
            .map(|p| !p.as_os_str().is_empty())
            .unwrap_or(false);
        if has_parent {
            return dest;
        }
        let src_dir = self.src.parent().unwrap_or_else(|| Path::new(""));
        match dest.extension() {
            Some(_) => src_dir.join(&dest),
            None => src_dir.join(format!("{}.xlsx", raw)),
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}
