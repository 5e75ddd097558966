//! Pattern + reconstruction for a single statistic.

use regex::Regex;

use super::value::{StatValue, ValueError, ValueKind};

/// Why a rule produced no value for a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("pattern did not match")]
    NoMatch,
    #[error("matched but could not be read: {0}")]
    Invalid(#[from] ValueError),
}

/// A compiled extraction rule.
///
/// Matching is an unanchored search: the pattern may appear anywhere in the
/// response, surrounded by unrelated text.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pattern: Regex,
    kind: ValueKind,
}

impl ExtractionRule {
    /// Compiles `pattern`; the number of capture groups must match `kind`.
    pub(super) fn new(pattern: &str, kind: ValueKind) -> Result<Self, RuleError> {
        let pattern = Regex::new(pattern)?;
        // captures_len() counts the implicit whole-match group.
        let declared = pattern.captures_len() - 1;
        if declared != kind.captures() {
            return Err(RuleError::CaptureCount {
                expected: kind.captures(),
                found: declared,
            });
        }
        Ok(Self { pattern, kind })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Applies the rule to a full command response.
    pub fn extract(&self, response: &str) -> Result<StatValue, ExtractError> {
        let caps = self
            .pattern
            .captures(response)
            .ok_or(ExtractError::NoMatch)?;
        let groups: Vec<Option<&str>> = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str()))
            .collect();
        Ok(self.kind.reconstruct(&groups)?)
    }
}

/// Problems building a rule.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("pattern declares {found} capture groups, expected {expected}")]
    CaptureCount { expected: usize, found: usize },
}
