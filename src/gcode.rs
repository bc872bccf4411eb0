//! G-Code text generation
//!
//! Fixed program templates and the four-move drill cycle emitted for every
//! hole. Every move carries its own feed rate so blocks from different tools
//! can be concatenated in any order.

use crate::config::Config;

/// Height above the work surface the drill slows down at before plunging
pub const PRE_DRILL_HEIGHT: &str = "0.2";

/// Feed rate of the final retract to safe height
const RETRACT_FEED: &str = "30000";

/// Format a number the way it appears in G-Code output.
///
/// Integral values keep one fractional digit (`32000.0`), everything else
/// uses the shortest representation that reads back to the same value.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Program prologue: absolute coordinates, metric units, spindle on
pub fn program_header(config: &Config) -> String {
    format!(
        "; Produced by drl2gcode, originally by Franco Lanza\n\
         \n\
         ; select absolute coordinate system\n\
         G90\n\
         ; metric\n\
         G21\n\
         ; G61 exact path mode was requested but not implemented\n\
         ; start spindle\n\
         M3 S{}\n",
        format_number(config.spindle_speed)
    )
}

/// Program epilogue: spindle off, retract, end
pub fn program_footer(config: &Config) -> String {
    format!(
        "\n\
         ; stop spindle\n\
         M5\n\
         ; go to safe height\n\
         G1 Z{} F{}\n\
         ; program ends\n\
         M2\n",
        format_number(config.safe_height),
        RETRACT_FEED
    )
}

/// Comment, tool change and operator prompt that open a tool's section
pub fn tool_change_preamble(tool_number: &str, diameter: &str) -> String {
    format!(
        "\n\n; T{tool_number} Diameter: {diameter}mm\nM06\nM117 insert tool with diameter: {diameter}mm\n"
    )
}

/// Append the drill cycle for one hole at (`x`, `y`) to `out`.
///
/// Four moves: up to safe height, across to the hole, down to the pre-drill
/// height, then the plunge at drilling feed.
pub fn emit_drill_cycle(out: &mut String, config: &Config, x: f64, y: f64) {
    let z_feed = format_number(config.z_move_speed);

    out.push_str(&format!(
        "G1 F{} Z{}\n",
        z_feed,
        format_number(config.safe_height)
    ));
    out.push_str(&format!(
        "G1 F{} X{} Y{}\n",
        format_number(config.xy_move_speed),
        format_number(x),
        format_number(y)
    ));
    out.push_str(&format!("G1 F{} Z{}\n", z_feed, PRE_DRILL_HEIGHT));
    out.push_str(&format!(
        "G1 F{} Z-{}\n",
        format_number(config.drill_move_speed),
        format_number(config.drill_depth)
    ));
}
