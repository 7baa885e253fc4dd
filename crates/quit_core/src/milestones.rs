use serde::{Deserialize, Serialize};

use crate::thresholds::{Threshold, ThresholdTable};

pub const RECOVERY_TIMELINE: &str = "recovery_timeline";
pub const HEART_RECOVERY: &str = "heart_recovery";
pub const LUNG_RECOVERY: &str = "lung_recovery";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub threshold_days: u32,
    pub label: String,
    pub description: String,
}

impl Milestone {
    pub fn new(
        threshold_days: u32,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            threshold_days,
            label: label.into(),
            description: description.into(),
        }
    }

    pub fn state(&self, days: u32) -> MilestoneState {
        MilestoneState {
            threshold_days: self.threshold_days,
            label: self.label.clone(),
            description: self.description.clone(),
            unlocked: self.is_unlocked(days),
            days_remaining: self.days_remaining(days),
        }
    }
}

impl Threshold for Milestone {
    fn threshold_days(&self) -> u32 {
        self.threshold_days
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilestoneState {
    pub threshold_days: u32,
    pub label: String,
    pub description: String,
    pub unlocked: bool,
    pub days_remaining: u32,
}

pub type MilestoneTable = ThresholdTable<Milestone>;

impl ThresholdTable<Milestone> {
    pub fn milestone_states(&self, days: u32) -> Vec<MilestoneState> {
        self.entries().iter().map(|m| m.state(days)).collect()
    }

    /// First locked milestone, or the final one (with nothing remaining) once all
    /// are unlocked.
    pub fn next_milestone(&self, days: u32) -> MilestoneState {
        self.first_locked(days)
            .unwrap_or_else(|| self.last())
            .state(days)
    }

    pub fn latest_unlocked_state(&self, days: u32) -> Option<MilestoneState> {
        self.latest_unlocked(days).map(|m| m.state(days))
    }

    /// Fraction of the way from the latest unlocked threshold to the next one.
    pub fn progress_to_next(&self, days: u32) -> f64 {
        let Some(next) = self.first_locked(days) else {
            return 1.0;
        };
        let start = self
            .latest_unlocked(days)
            .map(|m| m.threshold_days)
            .unwrap_or(0);
        let span = next.threshold_days.saturating_sub(start);
        if span == 0 {
            return 0.0;
        }
        f64::from(days.saturating_sub(start)) / f64::from(span)
    }
}

/// General health timeline shown on the progress dashboard.
pub fn recovery_timeline() -> Vec<Milestone> {
    vec![
        Milestone::new(0, "20 Minutes", "Heart rate and blood pressure drop towards normal."),
        Milestone::new(1, "24 Hours", "Carbon monoxide in the blood falls to normal levels."),
        Milestone::new(3, "72 Hours", "Nicotine is out of the body and breathing gets easier."),
        Milestone::new(14, "2 Weeks", "Circulation improves and walking becomes easier."),
        Milestone::new(30, "1 Month", "Coughing and shortness of breath decrease."),
        Milestone::new(90, "3 Months", "Lung function improves noticeably."),
        Milestone::new(365, "1 Year", "Risk of coronary heart disease is half that of a smoker."),
        Milestone::new(1825, "5 Years", "Stroke risk falls to that of a non-smoker."),
        Milestone::new(3650, "10 Years", "Lung cancer risk is about half that of a smoker."),
    ]
}

pub fn heart_recovery() -> Vec<Milestone> {
    vec![
        Milestone::new(0, "20 Minutes", "Heart rate returns towards its resting baseline."),
        Milestone::new(1, "24 Hours", "Risk of heart attack begins to decrease."),
        Milestone::new(14, "2 Weeks", "Blood flow to the heart and limbs improves."),
        Milestone::new(365, "1 Year", "Excess coronary heart disease risk is halved."),
        Milestone::new(5475, "15 Years", "Heart disease risk matches a lifelong non-smoker."),
    ]
}

pub fn lung_recovery() -> Vec<Milestone> {
    vec![
        Milestone::new(3, "72 Hours", "Bronchial tubes relax and lung capacity increases."),
        Milestone::new(14, "2 Weeks", "Lung function starts to improve."),
        Milestone::new(30, "1 Month", "Cilia regrow and clear mucus more effectively."),
        Milestone::new(270, "9 Months", "Coughing and wheezing are greatly reduced."),
        Milestone::new(3650, "10 Years", "Lung cancer death rate is about half that of a smoker."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline() -> MilestoneTable {
        MilestoneTable::new(RECOVERY_TIMELINE, recovery_timeline()).unwrap()
    }

    #[test]
    fn canonical_tables_are_valid() {
        assert_eq!(timeline().len(), 9);
        assert!(MilestoneTable::new(HEART_RECOVERY, heart_recovery()).is_ok());
        assert!(MilestoneTable::new(LUNG_RECOVERY, lung_recovery()).is_ok());
    }

    #[test]
    fn day_zero_unlocks_only_the_first_entry() {
        let states = timeline().milestone_states(0);
        assert!(states[0].unlocked);
        assert_eq!(states[0].label, "20 Minutes");
        assert!(!states[1].unlocked);
        assert_eq!(states[1].label, "24 Hours");
        assert_eq!(states[1].days_remaining, 1);

        let next = timeline().next_milestone(0);
        assert_eq!(next.threshold_days, 1);
    }

    #[test]
    fn unlock_matches_threshold_for_every_entry() {
        let table = timeline();
        for milestone in table.entries() {
            let t = milestone.threshold_days;
            for days in [t.saturating_sub(1), t, t + 1] {
                let state = milestone.state(days);
                assert_eq!(state.unlocked, days >= t, "{} at {days}", milestone.label);
                assert_eq!(state.days_remaining, t.saturating_sub(days));
            }
        }
    }

    #[test]
    fn everything_unlocked_reports_last_entry() {
        let next = timeline().next_milestone(5000);
        assert_eq!(next.label, "10 Years");
        assert!(next.unlocked);
        assert_eq!(next.days_remaining, 0);
        assert_eq!(timeline().progress_to_next(5000), 1.0);
    }

    #[test]
    fn progress_between_thresholds() {
        let table = timeline();
        // Between 14 and 30 days.
        assert_eq!(table.progress_to_next(22), 0.5);
        assert_eq!(
            table.latest_unlocked_state(22).map(|s| s.label),
            Some("2 Weeks".to_string())
        );

        let lungs = MilestoneTable::new(LUNG_RECOVERY, lung_recovery()).unwrap();
        assert_eq!(lungs.latest_unlocked_state(1), None);
        assert!((lungs.progress_to_next(1) - 1.0 / 3.0).abs() < 1e-12);
    }
}
