//! Excellon drill file parsing
//!
//! Recognises the three line shapes the converter understands:
//!
//! * `T<n>C<d>` defines tool `n` with drill diameter `d`
//! * `T<n>` selects tool `n` for the holes that follow (`T0` disables drilling)
//! * `X<x>Y<y>` drills a hole with the selected tool
//!
//! Every other line is ignored. Drill cycles are emitted into each tool's
//! buffer while the file is read.

use crate::config::Config;
use crate::error::{DrillError, Result, ResultExt};
use crate::gcode;
use indexmap::IndexMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Tool number that marks holes which must not be drilled
pub const DISABLED_TOOL: &str = "0";

/// One drill-bit size and the G-Code collected for it
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    /// Tool number as written in the drill file
    pub number: String,

    /// Diameter in mm, two fraction digits
    pub diameter: String,

    /// Destination of this tool's program in per-tool mode
    pub output_path: PathBuf,

    /// Tool-change preamble followed by one drill cycle per hole
    pub body: String,

    /// Number of holes emitted into `body`
    pub hole_count: usize,
}

impl Tool {
    fn new(number: &str, diameter: String, base: &Path) -> Self {
        Self {
            number: number.to_string(),
            output_path: tool_output_path(base, number, &diameter),
            body: gcode::tool_change_preamble(number, &diameter),
            diameter,
            hole_count: 0,
        }
    }
}

/// Tools keyed by number, in order of definition
pub type ToolTable = IndexMap<String, Tool>;

/// Output path for a single tool: `<base>_T<NN>_<diameter>mm.gcode`
pub fn tool_output_path(base: &Path, number: &str, diameter: &str) -> PathBuf {
    with_suffix(base, &format!("_T{:0>2}_{}mm.gcode", number, diameter))
}

/// Output path for the combined program: `<base>_Tall.gcode`
pub fn combined_output_path(base: &Path) -> PathBuf {
    with_suffix(base, "_Tall.gcode")
}

/// Input path with its extension removed, used to derive output names
pub fn output_base(input: &Path) -> PathBuf {
    input.with_extension("")
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// A classified input line
#[derive(Debug, Clone, PartialEq)]
pub enum ExcellonLine<'a> {
    ToolDefinition { number: &'a str, diameter: &'a str },
    ToolSelection { number: &'a str },
    Coordinate { x: &'a str, y: Option<&'a str> },
    Ignored,
}

/// Classify one line by its prefix. Line endings must already be stripped.
pub fn classify(line: &str) -> ExcellonLine<'_> {
    if let Some(rest) = line.strip_prefix('T') {
        return match rest.split_once('C') {
            Some((number, diameter)) => ExcellonLine::ToolDefinition {
                number: number.trim(),
                diameter: diameter.trim(),
            },
            None => ExcellonLine::ToolSelection {
                number: rest.trim(),
            },
        };
    }

    if let Some(rest) = line.strip_prefix('X') {
        return match rest.split_once('Y') {
            Some((x, y)) => ExcellonLine::Coordinate {
                x: x.trim(),
                y: Some(y.trim()),
            },
            None => ExcellonLine::Coordinate {
                x: rest.trim(),
                y: None,
            },
        };
    }

    ExcellonLine::Ignored
}

/// Line-by-line parser state: the tool table and the selection cursor
pub struct ExcellonParser<'a> {
    config: &'a Config,
    base: PathBuf,
    tools: ToolTable,
    selected: Option<String>,
    skipped_holes: usize,
    line_number: usize,
}

impl<'a> ExcellonParser<'a> {
    /// Create a parser whose per-tool output paths derive from `base`
    pub fn new(config: &'a Config, base: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base: base.into(),
            tools: ToolTable::new(),
            selected: None,
            skipped_holes: 0,
            line_number: 0,
        }
    }

    /// Feed every line of `reader`, starting from the first
    pub fn parse_reader<R: BufRead>(mut self, reader: R) -> Result<ParsedDrill> {
        for line in reader.lines() {
            let line = line.with_line_context(self.line_number + 1)?;
            self.feed_line(&line)?;
        }
        Ok(self.finish())
    }

    /// Process one physical line of the input
    pub fn feed_line(&mut self, raw: &str) -> Result<()> {
        self.line_number += 1;
        let line = raw.trim_end_matches(['\r', '\n']);

        match classify(line) {
            ExcellonLine::ToolDefinition { number, diameter } => {
                self.define_tool(line, number, diameter)
            }
            ExcellonLine::ToolSelection { number } => {
                debug!("Line {}: selected tool T{}", self.line_number, number);
                self.selected = Some(number.to_string());
                Ok(())
            }
            ExcellonLine::Coordinate { x, y } => self.drill(line, x, y),
            ExcellonLine::Ignored => Ok(()),
        }
    }

    /// Currently selected tool number, if any
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Tools defined so far
    pub fn tools(&self) -> &ToolTable {
        &self.tools
    }

    /// Consume the parser and return the completed tool table
    pub fn finish(self) -> ParsedDrill {
        let holes: usize = self.tools.values().map(|tool| tool.hole_count).sum();
        info!(
            "Parsed {} lines: {} tools, {} holes, {} holes skipped",
            self.line_number,
            self.tools.len(),
            holes,
            self.skipped_holes
        );

        ParsedDrill {
            tools: self.tools,
            skipped_holes: self.skipped_holes,
            lines: self.line_number,
        }
    }

    fn define_tool(&mut self, line: &str, number: &str, diameter: &str) -> Result<()> {
        if number.is_empty() {
            return Err(DrillError::MalformedLine {
                line: self.line_number,
                content: line.to_string(),
                reason: "tool definition has no tool number".to_string(),
            }
            .into());
        }

        let diameter = diameter
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| DrillError::InvalidDiameter {
                line: self.line_number,
                content: line.to_string(),
            })?;

        if self.tools.contains_key(number) {
            return Err(DrillError::ToolRedefined {
                line: self.line_number,
                tool: number.to_string(),
            }
            .into());
        }

        let tool = Tool::new(number, format!("{:.2}", diameter), &self.base);
        if let Some(existing) = self
            .tools
            .values()
            .find(|other| other.output_path == tool.output_path)
        {
            return Err(DrillError::OutputCollision {
                line: self.line_number,
                tool: tool.number,
                existing: existing.number.clone(),
                path: tool.output_path,
            }
            .into());
        }

        debug!(
            "Line {}: defined tool T{} with diameter {}mm",
            self.line_number, tool.number, tool.diameter
        );
        self.tools.insert(number.to_string(), tool);
        Ok(())
    }

    fn drill(&mut self, line: &str, x: &str, y: Option<&str>) -> Result<()> {
        let Some(selected) = self.selected.as_deref() else {
            return Err(DrillError::NoToolSelected {
                line: self.line_number,
            }
            .into());
        };

        if selected == DISABLED_TOOL {
            debug!("Line {}: skipping hole under T0", self.line_number);
            self.skipped_holes += 1;
            return Ok(());
        }

        let Some(tool) = self.tools.get_mut(selected) else {
            return Err(DrillError::UndefinedTool {
                line: self.line_number,
                tool: selected.to_string(),
            }
            .into());
        };

        let malformed = |reason: &str| DrillError::MalformedLine {
            line: self.line_number,
            content: line.to_string(),
            reason: reason.to_string(),
        };

        let y = y.ok_or_else(|| malformed("hole coordinate has no Y component"))?;
        let x: f64 = x
            .parse()
            .map_err(|_| malformed("hole X coordinate is not a number"))?;
        let y: f64 = y
            .parse()
            .map_err(|_| malformed("hole Y coordinate is not a number"))?;

        gcode::emit_drill_cycle(
            &mut tool.body,
            self.config,
            x + self.config.offset.x,
            y + self.config.offset.y,
        );
        tool.hole_count += 1;
        Ok(())
    }
}

/// Result of parsing a whole drill file
#[derive(Debug, Clone)]
pub struct ParsedDrill {
    pub tools: ToolTable,
    pub skipped_holes: usize,
    pub lines: usize,
}

impl ParsedDrill {
    /// Total number of holes emitted across all tools
    pub fn hole_count(&self) -> usize {
        self.tools.values().map(|tool| tool.hole_count).sum()
    }
}

/// Parse a drill file read from `reader`, naming outputs after `base`
pub fn parse<R: BufRead>(reader: R, base: &Path, config: &Config) -> Result<ParsedDrill> {
    ExcellonParser::new(config, base).parse_reader(reader)
}
