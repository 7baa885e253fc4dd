use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::profile::QuitProfile;

const DAYS_PER_MONTH: u32 = 30;
const DAYS_PER_YEAR: u32 = 365;

/// Whole-cent currency amount.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    pub const fn from_units(units: u64) -> Self {
        Money(units.saturating_mul(100))
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    fn saturating_from(cents: u128) -> Money {
        Money(u64::try_from(cents).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialSummary {
    pub total_saved: Money,
    pub daily_rate: Money,
    pub monthly_rate: Money,
    pub yearly_rate: Money,
    pub cigarettes_avoided: u64,
}

/// Daily spend avoided, kept as the exact fraction `numerator / cigarettes_per_pack` cents.
struct DailyRate {
    numerator: u128,
    pack: u128,
}

impl DailyRate {
    fn of(profile: &QuitProfile) -> EngineResult<Self> {
        if profile.cigarettes_per_pack == 0 {
            return Err(EngineError::DivisionByZero {
                field: "cigarettes_per_pack",
            });
        }
        Ok(Self {
            numerator: u128::from(profile.cigarettes_per_day)
                * u128::from(profile.cost_per_pack_cents),
            pack: u128::from(profile.cigarettes_per_pack),
        })
    }

    /// Daily rate rounded half-up to the cent.
    fn cents(&self) -> Money {
        Money::saturating_from((2 * self.numerator + self.pack) / (2 * self.pack))
    }

    /// Amount for `days`, rounded half-up to a whole currency unit.
    fn whole_units_over(&self, days: u32) -> Money {
        let total = self.numerator.saturating_mul(u128::from(days));
        let units = total.saturating_mul(2).saturating_add(100 * self.pack) / (200 * self.pack);
        Money::saturating_from(units.saturating_mul(100))
    }
}

pub fn compute_savings(profile: &QuitProfile, days: u32) -> EngineResult<FinancialSummary> {
    let rate = DailyRate::of(profile)?;
    Ok(FinancialSummary {
        total_saved: rate.whole_units_over(days),
        daily_rate: rate.cents(),
        monthly_rate: rate.whole_units_over(DAYS_PER_MONTH),
        yearly_rate: rate.whole_units_over(DAYS_PER_YEAR),
        cigarettes_avoided: u64::from(days) * u64::from(profile.cigarettes_per_day),
    })
}

pub fn can_afford(item_cost: Money, total_saved: Money) -> bool {
    total_saved >= item_cost
}

/// `min(1, saved / cost)`; a free item is always fully funded.
pub fn progress_fraction(item_cost: Money, total_saved: Money) -> f64 {
    if item_cost == Money::ZERO {
        return 1.0;
    }
    (total_saved.cents() as f64 / item_cost.cents() as f64).min(1.0)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionHorizon {
    Week,
    Month,
    Year,
    FiveYears,
    TenYears,
}

impl ProjectionHorizon {
    pub const ALL: [ProjectionHorizon; 5] = [
        ProjectionHorizon::Week,
        ProjectionHorizon::Month,
        ProjectionHorizon::Year,
        ProjectionHorizon::FiveYears,
        ProjectionHorizon::TenYears,
    ];

    pub fn days(self) -> u32 {
        match self {
            ProjectionHorizon::Week => 7,
            ProjectionHorizon::Month => DAYS_PER_MONTH,
            ProjectionHorizon::Year => DAYS_PER_YEAR,
            ProjectionHorizon::FiveYears => 5 * DAYS_PER_YEAR,
            ProjectionHorizon::TenYears => 10 * DAYS_PER_YEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsProjection {
    pub horizon: ProjectionHorizon,
    pub days: u32,
    pub saved: Money,
    pub cigarettes_avoided: u64,
}

pub fn project_savings(
    profile: &QuitProfile,
    horizons: &[ProjectionHorizon],
) -> EngineResult<Vec<SavingsProjection>> {
    horizons
        .iter()
        .map(|&horizon| {
            let days = horizon.days();
            let summary = compute_savings(profile, days)?;
            Ok(SavingsProjection {
                horizon,
                days,
                saved: summary.total_saved,
                cigarettes_avoided: summary.cigarettes_avoided,
            })
        })
        .collect()
}

/// Something the user is saving towards with the money not spent on cigarettes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsGoal {
    pub name: String,
    pub cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub name: String,
    pub cost: Money,
    pub affordable: bool,
    pub fraction: f64,
    pub remaining: Money,
}

impl SavingsGoal {
    pub fn new(name: impl Into<String>, cost: Money) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }

    pub fn evaluate(&self, total_saved: Money) -> GoalProgress {
        GoalProgress {
            name: self.name.clone(),
            cost: self.cost,
            affordable: can_afford(self.cost, total_saved),
            fraction: progress_fraction(self.cost, total_saved),
            remaining: self.cost.saturating_sub(total_saved),
        }
    }
}
