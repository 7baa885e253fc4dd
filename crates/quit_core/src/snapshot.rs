use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::AchievementSummary;
use crate::milestones::MilestoneState;
use crate::recovery::{BodySystem, RecoveryStage};
use crate::savings::FinancialSummary;
use crate::time_basis::ElapsedBreakdown;

/// Everything a progress screen displays, derived from a profile at one instant.
/// Never persisted; recompute whenever fresher numbers are needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedSnapshot {
    pub now: DateTime<Utc>,
    pub quit_instant: DateTime<Utc>,
    pub days_since_quit: u32,
    pub elapsed: ElapsedBreakdown,
    pub recovery: BTreeMap<BodySystem, f64>,
    pub predictions: BTreeMap<BodySystem, f64>,
    pub recovery_stage: RecoveryStage,
    pub financials: FinancialSummary,
    pub milestones: Vec<MilestoneState>,
    pub next_milestone: MilestoneState,
    pub achievements: AchievementSummary,
}

impl DerivedSnapshot {
    pub fn recovery_for(&self, system: BodySystem) -> f64 {
        self.recovery.get(&system).copied().unwrap_or(0.0)
    }

    pub fn unlocked_milestones(&self) -> impl Iterator<Item = &MilestoneState> + '_ {
        self.milestones.iter().filter(|m| m.unlocked)
    }
}
