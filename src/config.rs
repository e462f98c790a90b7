//! Run settings for both pipelines.
//!
//! Built-in defaults match the photomask cover-letter templates; every value
//! can be overridden from the environment or a `.env` file next to the binary.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::PatchError;

pub const DEFAULT_IMAGE_PATH: &str = "initial_data/photo_template_table.png";
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";
/// LSTM + legacy engine, single uniform block of text.
pub const DEFAULT_ENGINE_ARGS: &str = "--oem 3 --psm 6";
pub const DEFAULT_LANGUAGE: &str = "rus+eng";

pub const DEFAULT_WORKBOOK_PATH: &str = "initial_data/cover_letter_template.xlsx";
pub const DEFAULT_PREFIX: &str = "PM-";
pub const DEFAULT_ABOVE_VALUE: &str = "Шаблон";
pub const DEFAULT_SEARCH_TEXT: &str = "№ слоя";

/// Default log filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "warn"
}

/// Load `.env` from the working directory if one exists.
fn load_env() {
    let _ = dotenvy::dotenv();
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, PatchError> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PatchError::InvalidOptions(format!("{} has invalid value '{}'", key, raw))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Image used when the command line gives none.
    pub image_path: PathBuf,
    pub tesseract_cmd: PathBuf,
    /// Recognition-mode flags passed to the engine, whitespace separated.
    pub engine_args: String,
    /// `+`-joined language pair, primary first.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            tesseract_cmd: PathBuf::from(DEFAULT_TESSERACT_CMD),
            engine_args: DEFAULT_ENGINE_ARGS.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl OcrConfig {
    /// Defaults overridden by `PHOTOMASK_IMAGE`, `TESSERACT_CMD`,
    /// `TESSERACT_CONFIG` and `TESSERACT_LANG`.
    pub fn from_env() -> Self {
        load_env();
        let mut config = Self::default();
        if let Some(v) = env_string("PHOTOMASK_IMAGE") {
            config.image_path = PathBuf::from(v.trim());
        }
        if let Some(v) = env_string("TESSERACT_CMD") {
            config.tesseract_cmd = PathBuf::from(v.trim());
        }
        if let Some(v) = env_string("TESSERACT_CONFIG") {
            config.engine_args = v;
        }
        if let Some(v) = env_string("TESSERACT_LANG") {
            config.language = v.trim().to_string();
        }
        config
    }

    /// Image to process: the CLI argument when present and not blank, else the default.
    pub fn resolve_image(&self, arg: Option<&str>) -> PathBuf {
        match arg.map(str::trim).filter(|s| !s.is_empty()) {
            Some(p) => PathBuf::from(p),
            None => self.image_path.clone(),
        }
    }
}

/// Where the patched workbook goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveMode {
    /// Overwrite the source workbook.
    InPlace,
    /// Save a copy at the resolved destination.
    #[default]
    Copy,
    /// Do not save; only report the rows that would change.
    None,
}

impl FromStr for SaveMode {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inplace" | "in_place" | "in-place" => Ok(Self::InPlace),
            "copy" => Ok(Self::Copy),
            "none" => Ok(Self::None),
            other => Err(PatchError::InvalidOptions(format!("unknown save mode '{}'", other))),
        }
    }
}

/// Column and matching options for the sheet patcher. Columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    /// Substring looked for in the search column.
    pub search_text: String,
    pub search_col: u32,
    /// Column whose value is copied (with the prefix) into the target column.
    pub source_col: u32,
    pub target_col: u32,
    /// Destination for the saved copy: a file, a directory, or a bare file
    /// name placed beside the source. `None` means a timestamped name beside
    /// the source.
    pub dest: Option<String>,
    pub case_sensitive: bool,
    /// Remove drawing and media parts after saving so Excel does not ask to repair the file.
    pub strip_drawings: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            search_text: DEFAULT_SEARCH_TEXT.to_string(),
            search_col: 5,
            source_col: 6,
            target_col: 7,
            dest: None,
            case_sensitive: false,
            strip_drawings: true,
        }
    }
}

impl PatchOptions {
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.search_text.is_empty() {
            return Err(PatchError::InvalidOptions("search_text must not be empty".into()));
        }
        for (name, col) in [
            ("search_col", self.search_col),
            ("source_col", self.source_col),
            ("target_col", self.target_col),
        ] {
            if col == 0 {
                return Err(PatchError::InvalidOptions(format!("{} is 1-based, got 0", name)));
            }
        }
        Ok(())
    }
}

/// Everything the patch binary needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSettings {
    pub source: PathBuf,
    pub prefix: String,
    pub above_value: String,
    pub options: PatchOptions,
    pub save_mode: SaveMode,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_WORKBOOK_PATH),
            prefix: DEFAULT_PREFIX.to_string(),
            above_value: DEFAULT_ABOVE_VALUE.to_string(),
            options: PatchOptions::default(),
            save_mode: SaveMode::default(),
        }
    }
}

impl PatchSettings {
    /// Defaults overridden by the `PATCH_*` environment variables.
    pub fn from_env() -> Result<Self, PatchError> {
        load_env();
        let mut s = Self::default();
        if let Some(v) = env_string("PATCH_SOURCE") {
            s.source = PathBuf::from(v.trim());
        }
        if let Some(v) = env_string("PATCH_PREFIX") {
            s.prefix = v;
        }
        if let Some(v) = env_string("PATCH_ABOVE_VALUE") {
            s.above_value = v;
        }
        if let Some(v) = env_string("PATCH_SEARCH_TEXT") {
            s.options.search_text = v;
        }
        if let Some(v) = env_parse("PATCH_SEARCH_COL")? {
            s.options.search_col = v;
        }
        if let Some(v) = env_parse("PATCH_SOURCE_COL")? {
            s.options.source_col = v;
        }
        if let Some(v) = env_parse("PATCH_TARGET_COL")? {
            s.options.target_col = v;
        }
        if let Some(v) = env_string("PATCH_DEST") {
            s.options.dest = Some(v);
        }
        if let Some(v) = env_parse("PATCH_CASE_SENSITIVE")? {
            s.options.case_sensitive = v;
        }
        if let Some(v) = env_parse("PATCH_STRIP_DRAWINGS")? {
            s.options.strip_drawings = v;
        }
        if let Some(v) = env_parse("PATCH_SAVE_MODE")? {
            s.save_mode = v;
        }
        s.options.validate()?;
        Ok(s)
    }
}
