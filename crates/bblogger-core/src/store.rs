//! Most recently observed value of every statistic of one modem.

use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::catalog::{StatCatalog, StatValue};
use crate::report::ReportRecord;

/// Identifier → last observed value.
///
/// Lookups of identifiers that were never observed yield
/// [`StatValue::Unknown`]. Only the reader mutates the store, and only through
/// [`StatStore::commit`].
#[derive(Debug, Default)]
pub struct StatStore {
    values: HashMap<&'static str, StatValue>,
}

/// Updates gathered during one cycle, applied all at once.
pub type StagedUpdates = Vec<(&'static str, StatValue)>;

impl StatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> StatValue {
        self.values.get(name).cloned().unwrap_or_default()
    }

    /// Number of identifiers observed at least once.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrites every staged identifier. Returns how many were applied.
    pub fn commit(&mut self, updates: StagedUpdates) -> usize {
        let applied = updates.len();
        self.values.extend(updates);
        applied
    }

    /// Snapshot of the store in catalog order, stamped with `at`.
    pub fn record(&self, catalog: &StatCatalog, at: DateTime<Local>) -> ReportRecord {
        let values = catalog
            .names()
            .map(|name| (name, self.get(name).to_string()))
            .collect();
        ReportRecord::new(at, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ValueKind;
    use chrono::TimeZone;

    fn catalog() -> StatCatalog {
        StatCatalog::builder()
            .group("show adsl")
            .stat("A", r"A:(\d+)", ValueKind::Counter { sign_corrected: false })
            .stat("B", r"B:(\d+)", ValueKind::Counter { sign_corrected: false })
            .stat("C", r"C:(\d+)", ValueKind::Counter { sign_corrected: false })
            .build()
            .unwrap()
    }

    #[test]
    fn unobserved_is_unknown() {
        let store = StatStore::new();
        assert_eq!(store.get("A"), StatValue::Unknown);
        assert!(store.is_empty());
    }

    #[test]
    fn commit_overwrites_and_keeps_the_rest() {
        let mut store = StatStore::new();
        store.commit(vec![("A", StatValue::Counter(1)), ("B", StatValue::Counter(2))]);
        let applied = store.commit(vec![("A", StatValue::Counter(10))]);

        assert_eq!(applied, 1);
        assert_eq!(store.get("A"), StatValue::Counter(10));
        assert_eq!(store.get("B"), StatValue::Counter(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn record_follows_catalog_order() {
        let mut store = StatStore::new();
        store.commit(vec![("C", StatValue::Counter(3)), ("A", StatValue::Counter(1))]);
        let at = Local.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();

        let record = store.record(&catalog(), at);
        assert_eq!(record.timestamp(), at);
        assert_eq!(
            record.values(),
            &[
                ("A", "1".to_string()),
                ("B", "Unknown".to_string()),
                ("C", "3".to_string()),
            ]
        );
    }
}
