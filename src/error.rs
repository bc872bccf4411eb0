//! Error handling for drl2gcode
//!
//! Errors propagate as `anyhow` errors carrying context; the named failure
//! kinds a run can end with live in [`DrillError`] so callers can tell them
//! apart with `downcast_ref`.

use anyhow::Context;
use std::path::{Path, PathBuf};

pub type Result<T> = anyhow::Result<T>;

/// Extension trait for Results to add context with file paths
pub trait ResultExt<T> {
    /// Add context with file path information
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T>;

    /// Add context with the input line being processed
    fn with_line_context(self, line: usize) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error> + Send + Sync + 'static,
{
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Failed to {} file: {}", operation, path.as_ref().display()))
    }

    fn with_line_context(self, line: usize) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Error at input line {}", line))
    }
}

/// Specific error types for drl2gcode operations
#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error("Invalid value for --{option}: {reason}")]
    InvalidArgument { option: String, reason: String },

    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Line {line}: tool diameter is not a number: {content:?}")]
    InvalidDiameter { line: usize, content: String },

    #[error("Line {line}: {reason}: {content:?}")]
    MalformedLine {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Line {line}: tool T{tool} is defined more than once")]
    ToolRedefined { line: usize, tool: String },

    #[error(
        "Line {line}: tool T{tool} would write to {}, already used by tool T{existing}",
        path.display()
    )]
    OutputCollision {
        line: usize,
        tool: String,
        existing: String,
        path: PathBuf,
    },

    #[error("Line {line}: hole references tool T{tool}, which was never defined")]
    UndefinedTool { line: usize, tool: String },

    #[error("Line {line}: hole coordinate appears before any tool was selected")]
    NoToolSelected { line: usize },

    #[error("Failed to write output file: {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DrillError {
    /// Whether this error belongs to the format-error family
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DrillError::InvalidDiameter { .. }
                | DrillError::MalformedLine { .. }
                | DrillError::ToolRedefined { .. }
                | DrillError::OutputCollision { .. }
        )
    }

    /// Whether this error is a hole referencing a tool that cannot be resolved
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            DrillError::UndefinedTool { .. } | DrillError::NoToolSelected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_families() {
        let undefined = DrillError::UndefinedTool {
            line: 4,
            tool: "7".to_string(),
        };
        assert!(undefined.is_reference_error());
        assert!(!undefined.is_format_error());

        let diameter = DrillError::InvalidDiameter {
            line: 2,
            content: "T1Cabc".to_string(),
        };
        assert!(diameter.is_format_error());
        assert!(!diameter.is_reference_error());
    }

    #[test]
    fn test_error_messages_name_line_and_tool() {
        let err = DrillError::UndefinedTool {
            line: 12,
            tool: "3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Line 12: hole references tool T3, which was never defined"
        );
    }

    #[test]
    fn test_path_context_is_attached() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.with_path_context("write", "out.gcode").unwrap_err();
        assert_eq!(err.to_string(), "Failed to write file: out.gcode");
        assert_eq!(format!("{:#}", err), "Failed to write file: out.gcode: denied");
    }
}
