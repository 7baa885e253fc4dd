use serde::{Deserialize, Serialize};

use crate::thresholds::{Threshold, ThresholdTable};

pub const ACHIEVEMENTS: &str = "achievements";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Achievement {
    pub id: String,
    pub threshold_days: u32,
    pub title: String,
    pub description: String,
}

impl Achievement {
    pub fn new(
        id: impl Into<String>,
        threshold_days: u32,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            threshold_days,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn state(&self, days: u32) -> AchievementState {
        let progress_fraction = if self.threshold_days == 0 {
            1.0
        } else {
            (f64::from(days) / f64::from(self.threshold_days)).min(1.0)
        };
        AchievementState {
            id: self.id.clone(),
            threshold_days: self.threshold_days,
            title: self.title.clone(),
            description: self.description.clone(),
            unlocked: self.is_unlocked(days),
            progress_fraction,
        }
    }
}

impl Threshold for Achievement {
    fn threshold_days(&self) -> u32 {
        self.threshold_days
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementState {
    pub id: String,
    pub threshold_days: u32,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
    pub progress_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextAchievement {
    pub id: String,
    pub title: String,
    pub threshold_days: u32,
    pub days_remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementSummary {
    pub states: Vec<AchievementState>,
    pub unlocked_count: usize,
    pub total: usize,
    pub overall_progress: f64,
    pub next: Option<NextAchievement>,
}

pub type AchievementTable = ThresholdTable<Achievement>;

impl ThresholdTable<Achievement> {
    pub fn achievement_states(&self, days: u32) -> Vec<AchievementState> {
        self.entries().iter().map(|a| a.state(days)).collect()
    }

    pub fn next_achievement(&self, days: u32) -> Option<NextAchievement> {
        self.first_locked(days).map(|a| NextAchievement {
            id: a.id.clone(),
            title: a.title.clone(),
            threshold_days: a.threshold_days,
            days_remaining: a.days_remaining(days),
        })
    }

    pub fn summary(&self, days: u32) -> AchievementSummary {
        let unlocked_count = self.unlocked_count(days);
        let total = self.len();
        AchievementSummary {
            states: self.achievement_states(days),
            unlocked_count,
            total,
            overall_progress: unlocked_count as f64 / total as f64,
            next: self.next_achievement(days),
        }
    }
}

pub fn standard_achievements() -> Vec<Achievement> {
    [
        ("first_day", 1, "First Day", "Made it through your first full day smoke-free."),
        ("three_day_warrior", 3, "Three Day Warrior", "Nicotine has left your body."),
        ("week_champion", 7, "Week Champion", "A full week without a cigarette."),
        ("fortnight_master", 14, "Fortnight Master", "Two weeks strong."),
        ("monthly_milestone", 30, "Monthly Milestone", "One month smoke-free."),
        ("quarter_year_legend", 90, "Quarter Year Legend", "Three months of freedom."),
        ("half_year_hero", 180, "Half Year Hero", "Six months without smoking."),
        ("annual_champion", 365, "Annual Champion", "A whole year smoke-free."),
    ]
    .into_iter()
    .map(|(id, days, title, description)| Achievement::new(id, days, title, description))
    .collect()
}
