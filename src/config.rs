//! Configuration management for drl2gcode
//!
//! This module handles CLI argument parsing, machining parameter defaults
//! and range validation.

use crate::error::{DrillError, Result};
use anyhow::anyhow;
use clap::builder::styling;
use clap::{value_parser, Arg, ArgMatches, ColorChoice, Command};
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_SPINDLE_SPEED: f64 = 32000.0;
pub const DEFAULT_XY_MOVE_SPEED: f64 = 3000.0;
pub const DEFAULT_Z_MOVE_SPEED: f64 = 300.0;
pub const DEFAULT_DRILL_MOVE_SPEED: f64 = 100.0;
pub const DEFAULT_DRILL_DEPTH: f64 = 2.0;
pub const DEFAULT_SAFE_HEIGHT: f64 = 25.0;

/// Build the CLI command
pub fn build_cli() -> Command {
    let styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Blue.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default());

    Command::new("drl2gcode")
        .about(
            "Converts Excellon .drl files into G-Code for a CNC machine. Originally by Franco Lanza.",
        )
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("drlfile")
                .value_name("DRLFILE")
                .help("Excellon .drl file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(speed_arg(
            "spindle_speed",
            "spindle-speed",
            "Set the spindle speed in RPM",
            "32000",
        ))
        .arg(speed_arg(
            "xy_move_speed",
            "xy-move-speed",
            "Set the X/Y travel move speed in mm/min",
            "3000",
        ))
        .arg(speed_arg(
            "z_move_speed",
            "z-move-speed",
            "Set the Z travel move speed in mm/min",
            "300",
        ))
        .arg(speed_arg(
            "drill_move_speed",
            "drill-move-speed",
            "Set the Z drilling speed in mm/min",
            "100",
        ))
        .arg(speed_arg(
            "drill_depth",
            "drill-depth",
            "Set the distance to drill below z=0 (positive, larger values go deeper)",
            "2",
        ))
        .arg(
            speed_arg(
                "safe_height",
                "safe-height",
                "Set the Z coordinate to use for rapid moves",
                "25",
            )
            .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("single_file")
                .short('s')
                .long("single-file")
                .help("Do not split drill files on separate gcodes by diameters")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offset")
                .short('o')
                .long("offset")
                .help("Offset all coordinates, X Y")
                .num_args(2)
                .value_names(["X", "Y"])
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .default_values(["0", "0"]),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no_progress")
                .long("no-progress")
                .help("Disable progress indicators")
                .action(clap::ArgAction::SetTrue),
        )
}

fn speed_arg(
    id: &'static str,
    long: &'static str,
    help: &'static str,
    default: &'static str,
) -> Arg {
    Arg::new(id)
        .long(long)
        .help(help)
        .value_name("VALUE")
        .value_parser(value_parser!(f64))
        .default_value(default)
}

/// Translation added to every parsed hole coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Input Excellon drill file
    pub input: PathBuf,

    /// Spindle speed in RPM
    pub spindle_speed: f64,

    /// Feed rate for X/Y travel moves (mm/min)
    pub xy_move_speed: f64,

    /// Feed rate for Z travel moves (mm/min)
    pub z_move_speed: f64,

    /// Feed rate for the drilling plunge (mm/min)
    pub drill_move_speed: f64,

    /// Plunge depth below Z=0
    pub drill_depth: f64,

    /// Z height used for travel moves
    pub safe_height: f64,

    /// Merge all tools into one output file
    pub single_file: bool,

    /// Added to every parsed coordinate
    pub offset: Offset,

    /// Enable verbose logging
    pub verbose: bool,

    /// Disable progress bars
    pub no_progress: bool,
}

impl Config {
    /// Configuration for `input` with every machining parameter at its default
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            spindle_speed: DEFAULT_SPINDLE_SPEED,
            xy_move_speed: DEFAULT_XY_MOVE_SPEED,
            z_move_speed: DEFAULT_Z_MOVE_SPEED,
            drill_move_speed: DEFAULT_DRILL_MOVE_SPEED,
            drill_depth: DEFAULT_DRILL_DEPTH,
            safe_height: DEFAULT_SAFE_HEIGHT,
            single_file: false,
            offset: Offset::default(),
            verbose: false,
            no_progress: false,
        }
    }

    /// Parse arguments and apply initial configuration
    pub fn from_args() -> Result<Self> {
        let matches = build_cli().get_matches();
        let config = Self::from_matches(&matches)?;

        // RUST_LOG takes precedence over verbose flag
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(if config.verbose { "info" } else { "off" })
        });

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();

        if config.verbose {
            info!("Configuration: {:?}", config);
        }

        Ok(config)
    }

    /// Build a validated configuration from parsed command-line matches
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<PathBuf>("drlfile")
            .cloned()
            .ok_or_else(|| anyhow!("Input DRLFILE is required"))?;

        let number = |id: &str, default: f64| matches.get_one::<f64>(id).copied().unwrap_or(default);

        // clap enforces exactly two values and supplies the default pair
        let mut offset = matches.get_many::<f64>("offset").into_iter().flatten().copied();
        let offset = Offset {
            x: offset.next().unwrap_or(0.0),
            y: offset.next().unwrap_or(0.0),
        };

        let config = Config {
            input,
            spindle_speed: number("spindle_speed", DEFAULT_SPINDLE_SPEED),
            xy_move_speed: number("xy_move_speed", DEFAULT_XY_MOVE_SPEED),
            z_move_speed: number("z_move_speed", DEFAULT_Z_MOVE_SPEED),
            drill_move_speed: number("drill_move_speed", DEFAULT_DRILL_MOVE_SPEED),
            drill_depth: number("drill_depth", DEFAULT_DRILL_DEPTH),
            safe_height: number("safe_height", DEFAULT_SAFE_HEIGHT),
            single_file: matches.get_flag("single_file"),
            offset,
            verbose: matches.get_flag("verbose"),
            no_progress: matches.get_flag("no_progress"),
        };

        config.check_ranges()?;
        Ok(config)
    }

    /// Reject machining parameters that would produce unusable G-Code
    pub fn check_ranges(&self) -> Result<()> {
        let checks: [(&str, f64, Range); 8] = [
            ("spindle-speed", self.spindle_speed, Range::NonNegative),
            ("xy-move-speed", self.xy_move_speed, Range::Positive),
            ("z-move-speed", self.z_move_speed, Range::Positive),
            ("drill-move-speed", self.drill_move_speed, Range::Positive),
            ("drill-depth", self.drill_depth, Range::Positive),
            ("safe-height", self.safe_height, Range::Any),
            ("offset", self.offset.x, Range::Any),
            ("offset", self.offset.y, Range::Any),
        ];

        for (option, value, range) in checks {
            if let Some(reason) = range.violation(value) {
                return Err(DrillError::InvalidArgument {
                    option: option.to_string(),
                    reason: format!("{} ({})", reason, value),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Validate configuration settings that depend on the filesystem
    pub fn validate(&self) -> Result<()> {
        self.check_ranges()?;

        if !self.input.is_file() {
            return Err(DrillError::InputNotFound {
                path: self.input.clone(),
            }
            .into());
        }

        info!("Configuration validation completed successfully");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Range {
    Any,
    Positive,
    NonNegative,
}

impl Range {
    fn violation(self, value: f64) -> Option<&'static str> {
        if !value.is_finite() {
            return Some("must be a finite number");
        }
        match self {
            Range::Positive if value <= 0.0 => Some("must be greater than zero"),
            Range::NonNegative if value < 0.0 => Some("must not be negative"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let mut argv = vec!["drl2gcode"];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv)?;
        Config::from_matches(&matches)
    }

    fn invalid_option(err: &anyhow::Error) -> Option<String> {
        match err.downcast_ref::<DrillError>() {
            Some(DrillError::InvalidArgument { option, .. }) => Some(option.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["board.drl"]).expect("defaults should parse");

        assert_eq!(config.input, PathBuf::from("board.drl"));
        assert_eq!(config.spindle_speed, DEFAULT_SPINDLE_SPEED);
        assert_eq!(config.xy_move_speed, DEFAULT_XY_MOVE_SPEED);
        assert_eq!(config.z_move_speed, DEFAULT_Z_MOVE_SPEED);
        assert_eq!(config.drill_move_speed, DEFAULT_DRILL_MOVE_SPEED);
        assert_eq!(config.drill_depth, DEFAULT_DRILL_DEPTH);
        assert_eq!(config.safe_height, DEFAULT_SAFE_HEIGHT);
        assert_eq!(config.offset, Offset::default());
        assert!(!config.single_file);
        assert!(!config.verbose);
    }

    #[test]
    fn test_cli_defaults_match_constructor() {
        let parsed = parse(&["board.drl"]).expect("defaults should parse");
        let built = Config::new("board.drl");

        assert_eq!(parsed.spindle_speed, built.spindle_speed);
        assert_eq!(parsed.drill_depth, built.drill_depth);
        assert_eq!(parsed.safe_height, built.safe_height);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--spindle-speed",
            "12000",
            "--xy-move-speed",
            "1500.5",
            "--z-move-speed",
            "200",
            "--drill-move-speed",
            "50",
            "--drill-depth",
            "1.8",
            "--safe-height",
            "10",
            "-s",
            "-o",
            "-5",
            "2.5",
            "board.drl",
        ])
        .expect("overrides should parse");

        assert_eq!(config.spindle_speed, 12000.0);
        assert_eq!(config.xy_move_speed, 1500.5);
        assert_eq!(config.z_move_speed, 200.0);
        assert_eq!(config.drill_move_speed, 50.0);
        assert_eq!(config.drill_depth, 1.8);
        assert_eq!(config.safe_height, 10.0);
        assert!(config.single_file);
        assert_eq!(config.offset, Offset { x: -5.0, y: 2.5 });
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        assert!(parse(&["--drill-depth", "deep", "board.drl"]).is_err());
    }

    #[test]
    fn test_offset_requires_two_values() {
        assert!(parse(&["board.drl", "--offset", "1"]).is_err());
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_out_of_range_values_name_the_option() {
        let err = parse(&["--drill-depth", "0", "board.drl"]).unwrap_err();
        assert_eq!(invalid_option(&err).as_deref(), Some("drill-depth"));

        let err = parse(&["--xy-move-speed=-10", "board.drl"]).unwrap_err();
        assert_eq!(invalid_option(&err).as_deref(), Some("xy-move-speed"));

        let err = parse(&["--spindle-speed", "inf", "board.drl"]).unwrap_err();
        assert_eq!(invalid_option(&err).as_deref(), Some("spindle-speed"));
    }

    #[test]
    fn test_validate_reports_missing_input() {
        let config = Config::new("definitely/not/here.drl");
        let err = config.validate().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DrillError>(),
            Some(DrillError::InputNotFound { .. })
        ));
    }
}
