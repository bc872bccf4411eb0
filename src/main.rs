//! drl2gcode - Convert Excellon drill files to G-Code
//!
//! Reads tool definitions and hole coordinates from an Excellon `.drl` file
//! and writes drilling programs, either one per drill diameter or a single
//! combined program.

use drl2gcode::{config::Config, converter::Converter, error::Result};
use tracing::{error, info};

fn main() -> Result<()> {
    // Parse configuration and initialize logging
    let config = Config::from_args().unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    let mut converter = Converter::new(config);

    match converter.run() {
        Ok(()) => {
            let stats = converter.get_conversion_stats();
            info!(
                "Converted {} holes across {} tools ({} skipped), output mode: {}",
                stats.holes_drilled,
                stats.tools_defined,
                stats.holes_skipped,
                stats.output_mode.as_str()
            );
            info!("Wrote {} files", stats.files_written.len());
            Ok(())
        }
        Err(e) => {
            error!("Conversion failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
