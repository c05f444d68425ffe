//! Text rendering of diagnostics and the assembled grid.
//!
//! Numbers use the C `%g` convention (6 significant digits, trailing zeros
//! trimmed, exponent form outside `1e-4 ..= 1e6`) so output lines up with
//! the classic drivers.

use crate::data::global_grid::GlobalGrid;
use std::fmt::Write;

/// Format `v` like C's `printf("%g", v)`.
pub fn format_g(v: f64) -> String {
    const PRECISION: i32 = 6;
    if v.is_nan() {
        return "nan".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0".into() } else { "0".into() };
    }
    // Exponent after rounding to PRECISION significant digits.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };
    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(&mantissa), exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// The per-iteration diagnostic line.
pub fn iteration_line(k: usize, residual: f64) -> String {
    format!("Iteration {k}: residual {}", format_g(residual))
}

/// One line per global row, values separated by a space.
pub fn render_grid(grid: &GlobalGrid) -> String {
    let mut out = String::new();
    for row in grid.rows_iter() {
        for v in row {
            let _ = write!(out, "{} ", format_g(*v));
        }
        out.push('\n');
    }
    out
}
