pub mod config;
pub mod error;
pub mod excel;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod rows;
pub mod services;
pub mod types;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber used by both binaries.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
