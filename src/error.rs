use std::path::PathBuf;

use thiserror::Error;

use crate::models::barcode::forbidden_letters_list;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Could not open image: {}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Missing OCR dependencies: {0}")]
    DependencyMissing(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid patch options: {0}")]
    InvalidOptions(String),

    #[error("Could not open Excel file: {0}")]
    Open(String),

    #[error("Sheet not found: {0}")]
    Sheet(String),

    #[error("Cannot write cell {cell}: {message}")]
    Write { cell: String, message: String },

    #[error("Cannot save file: {0}")]
    Save(String),
}

/// Rejected barcode value. The message lists every letter the alphabet excludes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "String '{value}' contains invalid characters. Only digits and uppercase Latin letters are allowed, except: {letters}",
    letters = forbidden_letters_list()
)]
pub struct ValidationError {
    pub value: String,
}
