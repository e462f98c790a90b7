use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::types::{RawWord, WordToken};

/// Confidence recorded when the engine reports something that is not a number.
pub const UNKNOWN_CONFIDENCE: f64 = -1.0;

/// Word-level recognizer. Implementations return every token the engine
/// reports, blank ones included; filtering happens in [`words_from_raw`].
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawWord>, OcrError>;
}

/// Decode an image file into memory.
pub fn load_image(path: &Path) -> Result<DynamicImage, OcrError> {
    image::open(path).map_err(|source| OcrError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Tesseract driven through its command-line executable with TSV output.
pub struct TesseractCli {
    command: PathBuf,
    engine_args: Vec<String>,
    language: String,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            engine_args: config.engine_args.split_whitespace().map(String::from).collect(),
            language: config.language.clone(),
        }
    }

    /// Check that the executable runs and every language of the configured
    /// pair (e.g. `rus+eng`) is installed.
    pub fn probe(&self) -> Result<(), OcrError> {
        let output = Command::new(&self.command)
            .arg("--list-langs")
            .output()
            .map_err(|e| {
                OcrError::DependencyMissing(format!(
                    "tesseract executable '{}' could not be started ({}). Install tesseract-ocr with the {} language data.",
                    self.command.display(),
                    e,
                    self.language
                ))
            })?;
        if !output.status.success() {
            return Err(OcrError::DependencyMissing(format!(
                "'{} --list-langs' failed: {}",
                self.command.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // Older releases print the list on stderr.
        let listing = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let missing = missing_languages(&self.language, &listing);
        if !missing.is_empty() {
            return Err(OcrError::DependencyMissing(format!(
                "tesseract language data not installed: {}",
                missing.join(", ")
            )));
        }
        tracing::debug!(language = %self.language, "tesseract available");
        Ok(())
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawWord>, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("photomask_ocr_")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Engine(format!("Failed to write temp image: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .args(&self.engine_args)
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .map_err(|e| OcrError::Engine(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!("Tesseract failed: {}", stderr.trim())));
        }
        let tsv = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::Engine(format!("Tesseract output is not UTF-8: {}", e)))?;
        Ok(parse_tsv(&tsv))
    }
}

/// Languages of a `+`-joined pair that do not appear in `--list-langs` output.
fn missing_languages(language: &str, listing: &str) -> Vec<String> {
    let installed: Vec<&str> = listing.lines().map(str::trim).collect();
    language
        .split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && !installed.contains(lang))
        .map(String::from)
        .collect()
}

/// Parse Tesseract TSV output.
/// Columns: level page_num block_num par_num line_num word_num left top width height conf text.
/// Rows with unparseable structure or geometry are dropped; confidence is kept raw.
pub fn parse_tsv(tsv: &str) -> Vec<RawWord> {
    let mut words = Vec::new();
    for (line_no, line) in tsv.lines().enumerate().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            continue;
        }
        let parsed = (|| {
            Some(RawWord {
                block_num: fields[2].trim().parse().ok()?,
                par_num: fields[3].trim().parse().ok()?,
                line_num: fields[4].trim().parse().ok()?,
                word_num: fields[5].trim().parse().ok()?,
                left: fields[6].trim().parse().ok()?,
                top: fields[7].trim().parse().ok()?,
                width: fields[8].trim().parse().ok()?,
                height: fields[9].trim().parse().ok()?,
                conf: fields[10].to_string(),
                text: fields.get(11).copied().unwrap_or("").to_string(),
            })
        })();
        match parsed {
            Some(word) => words.push(word),
            None => tracing::debug!(line = line_no + 1, "skipping malformed TSV row"),
        }
    }
    words
}

/// Turn raw engine rows into tokens: blank text is dropped, text is trimmed,
/// centers are derived with floor division.
pub fn words_from_raw(raw: &[RawWord]) -> Vec<WordToken> {
    raw.iter()
        .filter_map(|r| {
            let text = r.text.trim();
            if text.is_empty() {
                return None;
            }
            let confidence = r.conf.trim().parse::<f64>().unwrap_or(UNKNOWN_CONFIDENCE);
            Some(WordToken {
                text: text.to_string(),
                confidence,
                left: r.left,
                top: r.top,
                width: r.width,
                height: r.height,
                x_center: r.left + r.width.div_euclid(2),
                y_center: r.top + r.height.div_euclid(2),
                block_id: r.block_num,
                paragraph_id: r.par_num,
                line_id: r.line_num,
                word_index: r.word_num,
            })
        })
        .collect()
}
