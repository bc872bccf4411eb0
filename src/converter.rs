//! Core conversion engine for drl2gcode
//!
//! This module orchestrates one run: validate the configuration, parse the
//! drill file, assemble the programs and write them out.

use crate::{
    config::Config,
    error::{DrillError, Result, ResultExt},
    excellon::{self, ParsedDrill},
    program::{OutputFile, OutputMode, ProgramAssembler},
    progress::ProgressTracker,
};
use anyhow::Context;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// The main conversion engine
pub struct Converter {
    config: Config,
    progress_tracker: ProgressTracker,
    parsed: Option<ParsedDrill>,
    written_files: Vec<PathBuf>,
}

impl Converter {
    /// Create a new converter with the given configuration
    pub fn new(config: Config) -> Self {
        let progress_enabled = !config.no_progress;

        Self {
            config,
            progress_tracker: ProgressTracker::new(progress_enabled),
            parsed: None,
            written_files: Vec::new(),
        }
    }

    /// Run the complete conversion process
    pub fn run(&mut self) -> Result<()> {
        let start = std::time::Instant::now();
        info!("Starting conversion of {}", self.config.input.display());

        self.config
            .validate()
            .context("Configuration validation failed")?;

        let base = excellon::output_base(&self.config.input);
        let parsed = self.parse_input(&base)?;

        let files = ProgramAssembler::new(&self.config).plan(&parsed.tools, &base);
        self.parsed = Some(parsed);

        if files.is_empty() {
            warn!("No tools defined in {}, nothing to write", self.config.input.display());
        }

        self.write_outputs(&files)?;

        info!("Conversion completed in {} ms", start.elapsed().as_millis());
        Ok(())
    }

    /// Parse the whole input file before anything is written
    fn parse_input(&self, base: &Path) -> Result<ParsedDrill> {
        let input = &self.config.input;
        let progress = self.progress_tracker.create_spinner("Parsing drill file...");

        let file = File::open(input).with_path_context("open input", input)?;
        let parsed = excellon::parse(BufReader::new(file), base, &self.config)
            .with_path_context("parse drill", input);

        match parsed {
            Ok(parsed) => {
                ProgressTracker::finish_progress(progress, "Drill file parsed");
                Ok(parsed)
            }
            Err(e) => {
                ProgressTracker::finish_with_error(progress, "Parsing failed");
                Err(e)
            }
        }
    }

    /// Write every planned program, reporting each path as it lands
    fn write_outputs(&mut self, files: &[OutputFile]) -> Result<()> {
        let progress = self
            .progress_tracker
            .create_file_progress(files.len(), "Writing G-Code");

        for file in files {
            if let Err(e) = Self::write_output_file(&file.path, &file.contents) {
                ProgressTracker::finish_with_error(progress, "Writing failed");
                return Err(e);
            }

            self.written_files.push(file.path.clone());
            ProgressTracker::report(&progress, &format!("Written to {}", file.path.display()));
            ProgressTracker::update_progress(&progress, 1, None);
        }

        ProgressTracker::finish_progress(progress, "G-Code written");
        Ok(())
    }

    fn write_output_file(output_path: &Path, content: &str) -> Result<()> {
        fs::write(output_path, content).map_err(|source| DrillError::OutputWrite {
            path: output_path.to_path_buf(),
            source,
        })?;

        debug!("Written output file: {}", output_path.display());
        Ok(())
    }

    /// Files written so far, in write order
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written_files
    }

    /// Get statistics about the conversion process
    pub fn get_conversion_stats(&self) -> ConversionStats {
        let (tools_defined, holes_drilled, holes_skipped) = match &self.parsed {
            Some(parsed) => (parsed.tools.len(), parsed.hole_count(), parsed.skipped_holes),
            None => (0, 0, 0),
        };

        ConversionStats {
            tools_defined,
            holes_drilled,
            holes_skipped,
            files_written: self.written_files.clone(),
            output_mode: OutputMode::from_config(&self.config),
        }
    }
}

/// Statistics about the conversion process
#[derive(Debug)]
pub struct ConversionStats {
    pub tools_defined: usize,
    pub holes_drilled: usize,
    pub holes_skipped: usize,
    pub files_written: Vec<PathBuf>,
    pub output_mode: OutputMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(input: PathBuf) -> Config {
        let mut config = Config::new(input);
        config.no_progress = true;
        config
    }

    #[test]
    fn test_converter_creation() {
        let converter = Converter::new(test_config(PathBuf::from("board.drl")));
        let stats = converter.get_conversion_stats();

        assert!(converter.written_files().is_empty());
        assert_eq!(stats.tools_defined, 0);
        assert_eq!(stats.output_mode, OutputMode::PerTool);
    }

    #[test]
    fn test_conversion_stats() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let input = temp_dir.path().join("board.drl");
        fs::write(&input, "M48\nT1C0.8\nT2C1.0\n%\nT1\nX1Y1\nX2Y2\nT0\nX3Y3\nM30\n")
            .expect("Failed to write input");

        let mut converter = Converter::new(test_config(input));
        converter.run().expect("Conversion should succeed");
        let stats = converter.get_conversion_stats();

        assert_eq!(stats.tools_defined, 2);
        assert_eq!(stats.holes_drilled, 2);
        assert_eq!(stats.holes_skipped, 1);
        assert_eq!(stats.files_written.len(), 2);
        assert_eq!(stats.output_mode.as_str(), "one file per tool");
    }

    #[test]
    fn test_write_failure_names_path() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let target = temp_dir.path().join("missing_dir").join("out.gcode");

        let err = Converter::write_output_file(&target, "M2\n").unwrap_err();

        match err.downcast_ref::<DrillError>() {
            Some(DrillError::OutputWrite { path, .. }) => assert_eq!(path, &target),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
