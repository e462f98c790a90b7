use clap::Parser;
use std::process::ExitCode;

use photomask_tools_lib::config::OcrConfig;
use photomask_tools_lib::error::OcrError;
use photomask_tools_lib::ocr::TesseractCli;
use photomask_tools_lib::pipeline::{extract_report, report_to_json};

/// Read layer, version and barcode fields from a photomask label table image.
#[derive(Parser, Debug)]
#[command(name = "photomask-ocr", version, about)]
struct Cli {
    /// Image of the label table. Falls back to PHOTOMASK_IMAGE or the built-in default.
    image: Option<String>,
}

fn run(cli: Cli) -> Result<(), OcrError> {
    let config = OcrConfig::from_env();
    let engine = TesseractCli::new(&config);
    engine.probe()?;

    let image_path = config.resolve_image(cli.image.as_deref());
    println!("Running OCR for: {}", image_path.display());
    let report = extract_report(&engine, &image_path)?;
    let word_count: usize = report.raw_rows.iter().map(|r| r.words.len()).sum();
    println!("Words found: {}", word_count);
    println!("Rows built (grouped by Tesseract lines): {}\n", report.raw_rows.len());

    let json = report_to_json(&report)
        .map_err(|e| OcrError::Engine(format!("Could not serialize report: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    photomask_tools_lib::init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "OCR run failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
