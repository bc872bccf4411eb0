//! drl2gcode - Excellon drill file to G-Code conversion
//!
//! The pipeline is a single pass: [`config`] resolves machining parameters,
//! [`excellon`] parses the drill file and emits drill cycles through
//! [`gcode`], [`program`] wraps them into complete programs and
//! [`converter`] writes them out.

pub mod config;
pub mod converter;
pub mod error;
pub mod excellon;
pub mod gcode;
pub mod program;
pub mod progress;
