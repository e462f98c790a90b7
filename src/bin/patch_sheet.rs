use std::process::ExitCode;

use photomask_tools_lib::config::PatchSettings;
use photomask_tools_lib::error::PatchError;
use photomask_tools_lib::excel::XlsxStore;
use photomask_tools_lib::services::SheetPatcher;

fn run() -> Result<(), PatchError> {
    let settings = PatchSettings::from_env()?;
    let patcher = SheetPatcher::from_settings(&settings)?;
    let store = XlsxStore {
        strip_drawings: settings.options.strip_drawings,
    };
    let outcome = patcher.run(&store, settings.save_mode)?;

    println!("Source: {}", patcher.source().display());
    match &outcome.saved_path {
        Some(path) => println!("Saved: {}", path.display()),
        None => println!("Saved: nothing (save disabled)"),
    }
    println!("Modified rows: {:?}", outcome.modified_rows);
    Ok(())
}

fn main() -> ExitCode {
    photomask_tools_lib::init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "patch failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
