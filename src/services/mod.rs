pub mod sheet_patcher;

pub use sheet_patcher::{PatchOutcome, SheetPatcher};
