//! Typed statistic values and their reconstruction from captured text.

use std::fmt;

use chrono::TimeDelta;

use crate::fmt::format_elapsed;

/// Added to a negative sign-correctable counter to bring it back into the
/// device's intended non-negative range. Kept at `2^31 - 1` to match the
/// values the modem family has always been reported with.
pub const SIGN_CORRECTION: i64 = i32::MAX as i64;

/// How captured text is turned into a [`StatValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Two captures: hours, minutes.
    Duration,
    /// One capture. With `sign_corrected`, negative values get
    /// [`SIGN_CORRECTION`] added.
    Counter { sign_corrected: bool },
    /// Two captures: integer part, fractional digits.
    FixedPoint,
}

impl ValueKind {
    /// Number of capture groups a pattern for this kind must declare.
    pub fn captures(self) -> usize {
        match self {
            ValueKind::Duration | ValueKind::FixedPoint => 2,
            ValueKind::Counter { .. } => 1,
        }
    }

    /// Rebuilds a typed value from the captured groups.
    ///
    /// `groups` holds one entry per declared capture; `None` means the group
    /// did not participate in the match.
    pub fn reconstruct(self, groups: &[Option<&str>]) -> Result<StatValue, ValueError> {
        match self {
            ValueKind::Duration => {
                let hours = parse_int(required(groups, 0)?)?;
                let minutes = parse_int(required(groups, 1)?)?;
                let elapsed = TimeDelta::try_hours(hours)
                    .zip(TimeDelta::try_minutes(minutes))
                    .and_then(|(h, m)| h.checked_add(&m))
                    .ok_or_else(|| ValueError::OutOfRange(format!("{}:{}", hours, minutes)))?;
                Ok(StatValue::Duration(elapsed))
            }
            ValueKind::Counter { sign_corrected } => {
                let value = parse_int(required(groups, 0)?)?;
                if sign_corrected && value < 0 {
                    Ok(StatValue::Counter(value + SIGN_CORRECTION))
                } else {
                    Ok(StatValue::Counter(value))
                }
            }
            ValueKind::FixedPoint => {
                let whole = digits(required(groups, 0)?)?;
                let fraction = match groups.get(1).copied().flatten() {
                    Some(text) if !text.is_empty() => Some(digits(text)?),
                    _ => None,
                };
                Ok(StatValue::FixedPoint { whole, fraction })
            }
        }
    }
}

fn required<'a>(groups: &[Option<&'a str>], idx: usize) -> Result<&'a str, ValueError> {
    groups
        .get(idx)
        .copied()
        .flatten()
        .ok_or(ValueError::MissingCapture(idx + 1))
}

/// The captured text itself, rendered verbatim, once it is known to be digits.
fn digits(text: &str) -> Result<String, ValueError> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueError::NotANumber(text.to_string()));
    }
    Ok(text.to_string())
}

fn parse_int(text: &str) -> Result<i64, ValueError> {
    text.trim().parse().map_err(|e: std::num::ParseIntError| {
        use std::num::IntErrorKind;
        match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                ValueError::OutOfRange(text.to_string())
            }
            _ => ValueError::NotANumber(text.to_string()),
        }
    })
}

/// Reasons captured text could not be turned into a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("capture group {0} did not match")]
    MissingCapture(usize),
    #[error("'{0}' is not an integer")]
    NotANumber(String),
    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

/// Most recently observed value of one statistic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatValue {
    /// Never observed, or every extraction so far missed.
    #[default]
    Unknown,
    /// Elapsed time, rendered `H:MM`.
    Duration(TimeDelta),
    /// Integer counter or rate.
    Counter(i64),
    /// Decimal kept as its original digits, rendered `<whole>.<fraction>`.
    FixedPoint {
        whole: String,
        fraction: Option<String>,
    },
}

impl StatValue {
    pub fn is_known(&self) -> bool {
        !matches!(self, StatValue::Unknown)
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Unknown => f.write_str("Unknown"),
            StatValue::Duration(elapsed) => f.write_str(&format_elapsed(elapsed.num_minutes())),
            StatValue::Counter(v) => write!(f, "{}", v),
            StatValue::FixedPoint {
                whole,
                fraction: Some(digits),
            } => write!(f, "{}.{}", whole, digits),
            StatValue::FixedPoint {
                whole,
                fraction: None,
            } => write!(f, "{}", whole),
        }
    }
}
