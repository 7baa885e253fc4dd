use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// An entry that unlocks once enough smoke-free days have passed.
pub trait Threshold {
    fn threshold_days(&self) -> u32;

    fn is_unlocked(&self, days: u32) -> bool {
        days >= self.threshold_days()
    }

    fn days_remaining(&self, days: u32) -> u32 {
        self.threshold_days().saturating_sub(days)
    }
}

/// Non-empty table of entries with strictly ascending thresholds.
///
/// Validation happens once at construction so lookups can rely on ordering.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ThresholdTable<E> {
    name: String,
    entries: Vec<E>,
}

impl<E: Threshold> ThresholdTable<E> {
    pub fn new(name: impl Into<String>, entries: Vec<E>) -> EngineResult<Self> {
        let name = name.into();
        if entries.is_empty() {
            return Err(EngineError::invalid_table(name, "table has no entries"));
        }
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].threshold_days() >= pair[1].threshold_days())
        {
            let reason = format!(
                "thresholds must be strictly ascending, found {} before {}",
                pair[0].threshold_days(),
                pair[1].threshold_days()
            );
            return Err(EngineError::invalid_table(name, reason));
        }
        Ok(Self { name, entries })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the highest threshold.
    pub fn last(&self) -> &E {
        &self.entries[self.entries.len() - 1]
    }

    pub fn unlocked_count(&self, days: u32) -> usize {
        self.entries
            .partition_point(|entry| entry.threshold_days() <= days)
    }

    pub fn first_locked(&self, days: u32) -> Option<&E> {
        self.entries.get(self.unlocked_count(days))
    }

    pub fn latest_unlocked(&self, days: u32) -> Option<&E> {
        self.unlocked_count(days)
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Step(u32);

    impl Threshold for Step {
        fn threshold_days(&self) -> u32 {
            self.0
        }
    }

    fn table(days: &[u32]) -> EngineResult<ThresholdTable<Step>> {
        ThresholdTable::new("steps", days.iter().copied().map(Step).collect())
    }

    #[test]
    fn rejects_empty_and_unsorted_tables() {
        assert!(matches!(
            table(&[]),
            Err(EngineError::InvalidThresholdTable { .. })
        ));
        let err = table(&[1, 5, 3]).unwrap_err();
        assert!(err.to_string().contains("found 5 before 3"), "{err}");
        assert!(table(&[1, 1]).is_err());
    }

    #[test]
    fn lookups_follow_threshold_order() {
        let steps = table(&[0, 1, 3, 14]).unwrap();
        assert_eq!(steps.unlocked_count(0), 1);
        assert_eq!(steps.first_locked(0), Some(&Step(1)));
        assert_eq!(steps.latest_unlocked(2), Some(&Step(1)));
        assert_eq!(steps.unlocked_count(14), 4);
        assert_eq!(steps.first_locked(14), None);
        assert_eq!(steps.last(), &Step(14));

        let late = table(&[5, 10]).unwrap();
        assert_eq!(late.latest_unlocked(4), None);
    }

    #[test]
    fn remaining_days_never_negative() {
        assert_eq!(Step(10).days_remaining(3), 7);
        assert_eq!(Step(10).days_remaining(30), 0);
        assert!(Step(0).is_unlocked(0));
    }
}
