//! Statistic catalog: the ordered set of identifiers a modem reports, and how
//! each one is pulled out of command responses.
//!
//! # Layout
//!
//! ```text
//! StatCatalog
//! ├── entries (report order)      ── "Uptime", "Reset Times", "DS Actual", ...
//! │     └── ExtractionRule         ── regex + ValueKind
//! └── groups  (query order)
//!       ├── "show status" → [Uptime]
//!       └── "show adsl"   → [Reset Times, Link Times, DS Actual, ...]
//! ```
//!
//! Report order and query order are independent: an entry belongs to exactly
//! one group, and records always list entries in report order.
//!
//! # Usage
//!
//! ```
//! use bblogger_core::catalog::{StatCatalog, ValueKind};
//!
//! let catalog = StatCatalog::builder()
//!     .group("show status")
//!     .stat("Uptime", r"System Uptime:(\d+):(\d+)", ValueKind::Duration)
//!     .build()
//!     .unwrap();
//!
//! let group = &catalog.groups()[0];
//! let found = catalog.extract(group, "System Uptime:3:07\n> ");
//! assert_eq!(found[0].1.as_ref().unwrap().to_string(), "3:07");
//! ```

mod rule;
mod value;

pub use rule::{ExtractError, ExtractionRule, RuleError};
pub use value::{SIGN_CORRECTION, StatValue, ValueError, ValueKind};

use std::collections::HashSet;

/// Build-time catalog problems. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("statistic '{name}': {source}")]
    Rule {
        name: &'static str,
        #[source]
        source: RuleError,
    },
    #[error("statistic '{0}' is declared twice")]
    Duplicate(&'static str),
    #[error("statistic '{0}' is declared before any command group")]
    NoGroup(&'static str),
    #[error("command group '{0}' has no statistics")]
    EmptyGroup(&'static str),
    #[error("command group has an empty command")]
    EmptyCommand,
}

/// One identifier and its rule.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub rule: ExtractionRule,
}

/// The statistics extracted from one query command's response.
#[derive(Debug, Clone)]
pub struct CommandGroup {
    command: &'static str,
    /// Indices into the catalog's entries, ascending.
    members: Vec<usize>,
}

impl CommandGroup {
    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Outcome of applying one entry's rule to a response.
pub type Extraction = (&'static str, Result<StatValue, ExtractError>);

/// Ordered, immutable statistic catalog.
#[derive(Debug, Clone)]
pub struct StatCatalog {
    entries: Vec<CatalogEntry>,
    groups: Vec<CommandGroup>,
}

impl StatCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Entries in report order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Identifiers in report order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Command groups in query order.
    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    /// Entries belonging to `group`, in report order.
    pub fn group_entries<'a>(
        &'a self,
        group: &'a CommandGroup,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        group.members.iter().filter_map(|&i| self.entries.get(i))
    }

    /// Applies every rule of `group` to `response`.
    pub fn extract(&self, group: &CommandGroup, response: &str) -> Vec<Extraction> {
        self.group_entries(group)
            .map(|entry| (entry.name, entry.rule.extract(response)))
            .collect()
    }
}

/// Declares a catalog group by group.
///
/// Statistics are placed into the most recently opened group. Report order
/// is declaration order unless [`CatalogBuilder::report_order`] overrides it.
#[derive(Default)]
pub struct CatalogBuilder {
    groups: Vec<(&'static str, Vec<(&'static str, &'static str, ValueKind)>)>,
    order: Option<Vec<&'static str>>,
}

impl CatalogBuilder {
    /// Opens a new command group.
    pub fn group(mut self, command: &'static str) -> Self {
        self.groups.push((command, Vec::new()));
        self
    }

    /// Adds a statistic to the current group.
    pub fn stat(mut self, name: &'static str, pattern: &'static str, kind: ValueKind) -> Self {
        match self.groups.last_mut() {
            Some((_, stats)) => stats.push((name, pattern, kind)),
            // Surfaced by build().
            None => self.groups.push(("", vec![(name, pattern, kind)])),
        }
        self
    }

    /// Sets the report order explicitly. Names not listed keep their
    /// declaration order after the listed ones.
    pub fn report_order(mut self, order: &[&'static str]) -> Self {
        self.order = Some(order.to_vec());
        self
    }

    pub fn build(self) -> Result<StatCatalog, CatalogError> {
        let mut declared: Vec<(usize, &'static str, ExtractionRule)> = Vec::new();
        let mut seen = HashSet::new();

        for (group_idx, (command, stats)) in self.groups.iter().enumerate() {
            if command.is_empty() {
                return Err(match stats.first() {
                    Some(&(name, _, _)) => CatalogError::NoGroup(name),
                    None => CatalogError::EmptyCommand,
                });
            }
            if stats.is_empty() {
                return Err(CatalogError::EmptyGroup(*command));
            }
            for &(name, pattern, kind) in stats {
                if !seen.insert(name) {
                    return Err(CatalogError::Duplicate(name));
                }
                let rule = ExtractionRule::new(pattern, kind)
                    .map_err(|source| CatalogError::Rule { name, source })?;
                declared.push((group_idx, name, rule));
            }
        }

        if let Some(order) = &self.order {
            let rank = |name: &str| {
                order
                    .iter()
                    .position(|o| *o == name)
                    .unwrap_or(order.len())
            };
            // Stable: unlisted names keep declaration order.
            declared.sort_by_key(|(_, name, _)| rank(name));
        }

        let mut groups: Vec<CommandGroup> = self
            .groups
            .iter()
            .map(|(command, _)| CommandGroup {
                command: *command,
                members: Vec::new(),
            })
            .collect();

        let mut entries = Vec::with_capacity(declared.len());
        for (idx, (group_idx, name, rule)) in declared.into_iter().enumerate() {
            groups[group_idx].members.push(idx);
            entries.push(CatalogEntry { name, rule });
        }

        Ok(StatCatalog { entries, groups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_group_catalog() -> StatCatalog {
        StatCatalog::builder()
            .group("show status")
            .stat("Uptime", r"Uptime:(\d+):(\d+)", ValueKind::Duration)
            .group("show adsl")
            .stat(
                "DS Actual",
                r"DS Actual Rate +: +(\d+)",
                ValueKind::Counter {
                    sign_corrected: false,
                },
            )
            .stat(
                "Link Times",
                r"Link Times +: +(\d+)",
                ValueKind::Counter {
                    sign_corrected: false,
                },
            )
            .report_order(&["Uptime", "Link Times", "DS Actual"])
            .build()
            .unwrap()
    }

    #[test]
    fn report_order_is_independent_of_query_order() {
        let catalog = two_group_catalog();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["Uptime", "Link Times", "DS Actual"]);

        let adsl = &catalog.groups()[1];
        assert_eq!(adsl.command(), "show adsl");
        let members: Vec<_> = catalog.group_entries(adsl).map(|e| e.name).collect();
        assert_eq!(members, vec!["Link Times", "DS Actual"]);
    }

    #[test]
    fn extract_reports_hits_and_misses_per_entry() {
        let catalog = two_group_catalog();
        let adsl = &catalog.groups()[1];
        let found = catalog.extract(adsl, "DS Actual Rate   :  41233000 bps\n> ");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, "Link Times");
        assert_eq!(found[0].1, Err(ExtractError::NoMatch));
        assert_eq!(found[1].0, "DS Actual");
        assert_eq!(found[1].1, Ok(StatValue::Counter(41_233_000)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = StatCatalog::builder()
            .group("show adsl")
            .stat("X", r"(\d+)", ValueKind::Counter { sign_corrected: false })
            .stat("X", r"(\d+)", ValueKind::Counter { sign_corrected: false })
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate("X")));
    }

    #[test]
    fn stat_outside_group_is_rejected() {
        let err = StatCatalog::builder()
            .stat("X", r"(\d+)", ValueKind::Counter { sign_corrected: false })
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::NoGroup("X")));
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = StatCatalog::builder()
            .group("show status")
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::EmptyGroup("show status")));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = StatCatalog::builder().group("").build().unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCommand));
    }

    #[test]
    fn bad_rule_names_the_statistic() {
        let err = StatCatalog::builder()
            .group("show status")
            .stat("Uptime", r"Uptime:(\d+)", ValueKind::Duration)
            .build()
            .unwrap_err();
        assert!(err.to_string().starts_with("statistic 'Uptime'"));
    }
}
