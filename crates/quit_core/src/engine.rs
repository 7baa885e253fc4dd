use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::achievements::{
    standard_achievements, Achievement, AchievementSummary, AchievementTable, ACHIEVEMENTS,
};
use crate::error::EngineResult;
use crate::milestones::{
    heart_recovery, lung_recovery, recovery_timeline, Milestone, MilestoneState, MilestoneTable,
    HEART_RECOVERY, LUNG_RECOVERY, RECOVERY_TIMELINE,
};
use crate::profile::QuitProfile;
use crate::recovery::{
    default_curve, default_prediction, BodySystem, RecoveryCurve, RecoveryStage,
};
use crate::savings::{compute_savings, FinancialSummary};
use crate::snapshot::DerivedSnapshot;
use crate::time_basis::{days_since, elapsed_breakdown};

/// Validated curves and tables. Construct once at startup; every computation on it
/// is pure.
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    curves: BTreeMap<BodySystem, RecoveryCurve>,
    predictions: BTreeMap<BodySystem, RecoveryCurve>,
    milestones: MilestoneTable,
    named_milestones: BTreeMap<String, MilestoneTable>,
    achievements: AchievementTable,
}

pub struct ProgressEngineBuilder {
    curves: BTreeMap<BodySystem, RecoveryCurve>,
    predictions: BTreeMap<BodySystem, RecoveryCurve>,
    milestones: Vec<Milestone>,
    named_milestones: BTreeMap<String, Vec<Milestone>>,
    achievements: Vec<Achievement>,
}

impl ProgressEngineBuilder {
    pub fn new() -> Self {
        let mut named_milestones = BTreeMap::new();
        named_milestones.insert(HEART_RECOVERY.to_string(), heart_recovery());
        named_milestones.insert(LUNG_RECOVERY.to_string(), lung_recovery());
        Self {
            curves: BodySystem::ALL
                .iter()
                .map(|&system| (system, default_curve(system)))
                .collect(),
            predictions: BodySystem::ALL
                .iter()
                .map(|&system| (system, default_prediction(system)))
                .collect(),
            milestones: recovery_timeline(),
            named_milestones,
            achievements: standard_achievements(),
        }
    }

    pub fn with_curve(mut self, system: BodySystem, curve: RecoveryCurve) -> Self {
        self.curves.insert(system, curve);
        self
    }

    pub fn with_prediction(mut self, system: BodySystem, curve: RecoveryCurve) -> Self {
        self.predictions.insert(system, curve);
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<Milestone>) -> Self {
        self.milestones = milestones;
        self
    }

    /// Adds or replaces a named milestone table (for example a per-body-system timeline).
    pub fn with_milestone_table(
        mut self,
        name: impl Into<String>,
        milestones: Vec<Milestone>,
    ) -> Self {
        self.named_milestones.insert(name.into(), milestones);
        self
    }

    pub fn with_achievements(mut self, achievements: Vec<Achievement>) -> Self {
        self.achievements = achievements;
        self
    }

    pub fn build(self) -> EngineResult<ProgressEngine> {
        let milestones = MilestoneTable::new(RECOVERY_TIMELINE, self.milestones)?;
        let named_milestones = self
            .named_milestones
            .into_iter()
            .map(|(name, entries)| {
                let table = MilestoneTable::new(name.clone(), entries)?;
                Ok((name, table))
            })
            .collect::<EngineResult<BTreeMap<_, _>>>()?;
        let achievements = AchievementTable::new(ACHIEVEMENTS, self.achievements)?;
        tracing::debug!(
            milestones = milestones.len(),
            named_tables = named_milestones.len(),
            achievements = achievements.len(),
            "progress engine configured"
        );
        Ok(ProgressEngine {
            curves: self.curves,
            predictions: self.predictions,
            milestones,
            named_milestones,
            achievements,
        })
    }
}

impl Default for ProgressEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressEngine {
    pub fn builder() -> ProgressEngineBuilder {
        ProgressEngineBuilder::new()
    }

    /// Default curves, the canonical milestone timeline and the standard badges.
    pub fn standard() -> EngineResult<Self> {
        Self::builder().build()
    }

    pub fn milestones(&self) -> &MilestoneTable {
        &self.milestones
    }

    pub fn milestone_table(&self, name: &str) -> Option<&MilestoneTable> {
        if name == RECOVERY_TIMELINE {
            return Some(&self.milestones);
        }
        self.named_milestones.get(name)
    }

    pub fn milestone_table_names(&self) -> Vec<&str> {
        std::iter::once(RECOVERY_TIMELINE)
            .chain(self.named_milestones.keys().map(String::as_str))
            .collect()
    }

    pub fn achievements(&self) -> &AchievementTable {
        &self.achievements
    }

    pub fn recovery_for(&self, system: BodySystem, days: u32) -> f64 {
        self.curves
            .get(&system)
            .map(|curve| curve.percentage(days))
            .unwrap_or(0.0)
    }

    pub fn recovery(&self, days: u32) -> BTreeMap<BodySystem, f64> {
        Self::evaluate(&self.curves, days)
    }

    pub fn predictions(&self, days: u32) -> BTreeMap<BodySystem, f64> {
        Self::evaluate(&self.predictions, days)
    }

    pub fn milestone_states(&self, days: u32) -> Vec<MilestoneState> {
        self.milestones.milestone_states(days)
    }

    pub fn achievement_summary(&self, days: u32) -> AchievementSummary {
        self.achievements.summary(days)
    }

    pub fn savings(&self, profile: &QuitProfile, days: u32) -> EngineResult<FinancialSummary> {
        compute_savings(profile, days)
    }

    pub fn snapshot(
        &self,
        profile: &QuitProfile,
        now: DateTime<Utc>,
    ) -> EngineResult<DerivedSnapshot> {
        let days = days_since(profile.quit_instant, now);
        Ok(DerivedSnapshot {
            now,
            quit_instant: profile.quit_instant,
            days_since_quit: days,
            elapsed: elapsed_breakdown(profile.quit_instant, now),
            recovery: self.recovery(days),
            predictions: self.predictions(days),
            recovery_stage: RecoveryStage::for_days(days),
            financials: self.savings(profile, days)?,
            milestones: self.milestone_states(days),
            next_milestone: self.milestones.next_milestone(days),
            achievements: self.achievement_summary(days),
        })
    }

    fn evaluate(
        curves: &BTreeMap<BodySystem, RecoveryCurve>,
        days: u32,
    ) -> BTreeMap<BodySystem, f64> {
        curves
            .iter()
            .map(|(&system, curve)| (system, curve.percentage(days)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-11T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn standard_engine_exposes_all_tables() {
        let engine = ProgressEngine::standard().unwrap();
        assert_eq!(
            engine.milestone_table_names(),
            vec![RECOVERY_TIMELINE, HEART_RECOVERY, LUNG_RECOVERY]
        );
        assert!(engine.milestone_table(LUNG_RECOVERY).is_some());
        assert!(engine.milestone_table("kidneys").is_none());
        assert_eq!(engine.achievements().len(), 8);
    }

    #[test]
    fn build_fails_fast_on_bad_tables() {
        let err = ProgressEngine::builder()
            .with_milestones(Vec::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidThresholdTable { ref table, .. } if table == RECOVERY_TIMELINE));

        let err = ProgressEngine::builder()
            .with_milestone_table(
                "skin",
                vec![Milestone::new(30, "1 Month", ""), Milestone::new(7, "1 Week", "")],
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidThresholdTable { ref table, .. } if table == "skin"));
    }

    #[test]
    fn snapshot_ten_days_in() {
        let engine = ProgressEngine::standard().unwrap();
        let profile = QuitProfile::new(now() - Duration::days(10));
        let snapshot = engine.snapshot(&profile, now()).unwrap();
        assert_eq!(snapshot.days_since_quit, 10);
        assert_eq!(snapshot.elapsed.days, 10);
        assert_eq!(snapshot.recovery_stage, RecoveryStage::Improving);
        assert_eq!(snapshot.financials.cigarettes_avoided, 100);
        assert_eq!(snapshot.next_milestone.label, "2 Weeks");
        assert_eq!(snapshot.next_milestone.days_remaining, 4);
        assert_eq!(snapshot.achievements.unlocked_count, 3);
        assert_eq!(snapshot.unlocked_milestones().count(), 3);
    }

    #[test]
    fn custom_curve_overrides_default() {
        let engine = ProgressEngine::builder()
            .with_curve(BodySystem::Lungs, RecoveryCurve::normalized(10.0, 1.0))
            .build()
            .unwrap();
        assert_eq!(engine.recovery_for(BodySystem::Lungs, 5), 50.0);
        assert_eq!(engine.recovery(20)[&BodySystem::Lungs], 100.0);
    }
}
