pub mod barcode;

pub use barcode::Barcode;
