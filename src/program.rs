//! Program assembly
//!
//! Wraps the per-tool G-Code collected by the parser with the shared program
//! header and footer. Nothing here touches the filesystem; the converter
//! writes the planned files.

use crate::config::Config;
use crate::excellon::{combined_output_path, Tool, ToolTable};
use crate::gcode;
use std::path::{Path, PathBuf};

/// A complete G-Code program and where it should be written
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Whether tools share one program or get one each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    SingleFile,
    PerTool,
}

impl OutputMode {
    pub fn from_config(config: &Config) -> Self {
        if config.single_file {
            OutputMode::SingleFile
        } else {
            OutputMode::PerTool
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OutputMode::SingleFile => "single file",
            OutputMode::PerTool => "one file per tool",
        }
    }
}

/// Builds finished programs from a parsed tool table
pub struct ProgramAssembler<'a> {
    config: &'a Config,
    header: String,
    footer: String,
}

impl<'a> ProgramAssembler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            header: gcode::program_header(config),
            footer: gcode::program_footer(config),
        }
    }

    /// One program containing every tool's section, in definition order
    pub fn combined_program(&self, tools: &ToolTable) -> String {
        let mut program = self.header.clone();
        for tool in tools.values() {
            program.push_str(&tool.body);
        }
        program.push_str(&self.footer);
        program
    }

    /// A standalone program for a single tool
    pub fn tool_program(&self, tool: &Tool) -> String {
        format!("{}{}{}", self.header, tool.body, self.footer)
    }

    /// Every file the run should produce, according to the output mode
    pub fn plan(&self, tools: &ToolTable, base: &Path) -> Vec<OutputFile> {
        match OutputMode::from_config(self.config) {
            OutputMode::SingleFile => vec![OutputFile {
                path: combined_output_path(base),
                contents: self.combined_program(tools),
            }],
            OutputMode::PerTool => tools
                .values()
                .map(|tool| OutputFile {
                    path: tool.output_path.clone(),
                    contents: self.tool_program(tool),
                })
                .collect(),
        }
    }
}
