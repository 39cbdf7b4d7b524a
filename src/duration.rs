//! Duration arithmetic in sixteenth-note steps.
//!
//! A whole note is 16 steps. Unprefixed notes last the current *base
//! duration*, which a default-length field (`L:1/8`) sets; suffix tokens
//! scale it.

use crate::error::ScoreError;

/// Steps in one whole note.
pub const STEPS_PER_WHOLE: f64 = 16.0;

/// Base duration when no default length is declared (an eighth note).
pub const DEFAULT_BASE_DURATION: f64 = 2.0;

/// Fixed length of every grace note. Not rounded.
pub const GRACE_DURATION: f64 = 0.5;

/// Steps in one measure when no meter is declared (4/4).
pub const DEFAULT_MEASURE_STEPS: f64 = 16.0;

/// Resolve a duration suffix token against the base duration.
///
/// Handles bare multipliers (`3`), fractions (`3/4`, `/4`, `3/`), slash
/// shorthand (`/`, `//`) and trailing dots. Accent markers `>`/`<` are
/// stripped. Unresolvable tokens fall back to `base`. The result is rounded
/// to whole steps and never below one step.
///
/// ```
/// use tunescore::duration::resolve_duration;
///
/// assert_eq!(resolve_duration("", 2.0), 2.0);
/// assert_eq!(resolve_duration("3", 2.0), 6.0);
/// assert_eq!(resolve_duration("//", 8.0), 2.0);
/// assert_eq!(resolve_duration("3/4", 2.0), 2.0);
/// assert_eq!(resolve_duration("..", 4.0), 7.0);
/// ```
pub fn resolve_duration(token: &str, base: f64) -> f64 {
    let stripped: String = token.chars().filter(|c| *c != '>' && *c != '<').collect();
    let body = stripped.trim_end_matches('.');
    let dots = stripped.len() - body.len();

    let value = if body.is_empty() {
        base
    } else if body.chars().all(|c| c == '/') {
        base / 2f64.powi(body.len() as i32)
    } else if let Some((num, den)) = body.split_once('/') {
        match (parse_or(num, 1), parse_or(den, 2)) {
            (Some(n), Some(d)) if n > 0 && d > 0 => base * n as f64 / d as f64,
            _ => base,
        }
    } else {
        match body.parse::<u32>() {
            Ok(n) if n > 0 => base * n as f64,
            _ => base,
        }
    };

    // Each dot adds half of the previous dot's increment
    let mut total = value;
    let mut increment = value / 2.0;
    for _ in 0..dots {
        total += increment;
        increment /= 2.0;
    }

    total.round().max(1.0)
}

fn parse_or(digits: &str, default: u32) -> Option<u32> {
    if digits.is_empty() {
        Some(default)
    } else {
        digits.parse().ok()
    }
}

/// Convert a default-length field (`1/8`, `1/16`, `1`) into a base duration.
pub fn base_duration_from_length(length: &str) -> Result<f64, ScoreError> {
    let fraction = parse_fraction(length)
        .ok_or_else(|| ScoreError::MetadataError(format!("Invalid note length: {}", length)))?;
    Ok((STEPS_PER_WHOLE * fraction).round().max(1.0))
}

/// Normalize a meter field and compute its measure length in steps.
///
/// `C` is common time (4/4) and `C|` cut time (2/2).
///
/// ```
/// use tunescore::duration::measure_from_meter;
///
/// assert_eq!(measure_from_meter("6/8").unwrap(), ("6/8".to_string(), 12.0));
/// assert_eq!(measure_from_meter("C|").unwrap(), ("2/2".to_string(), 16.0));
/// ```
pub fn measure_from_meter(meter: &str) -> Result<(String, f64), ScoreError> {
    let trimmed = meter.trim();
    let normalized = match trimmed {
        "C" => "4/4",
        "C|" => "2/2",
        other => other,
    };
    let fraction = parse_fraction(normalized)
        .filter(|_| normalized.contains('/'))
        .ok_or_else(|| ScoreError::MetadataError(format!("Invalid meter: {}", meter)))?;
    Ok((normalized.to_string(), STEPS_PER_WHOLE * fraction))
}

fn parse_fraction(s: &str) -> Option<f64> {
    let s = s.trim();
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim().parse::<u32>().ok()?, d.trim().parse::<u32>().ok()?),
        None => (s.parse::<u32>().ok()?, 1),
    };
    if num == 0 || den == 0 {
        return None;
    }
    Some(num as f64 / den as f64)
}
