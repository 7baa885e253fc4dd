use serde::{Deserialize, Serialize};

pub const MAX_PERCENTAGE: f64 = 100.0;
pub const FULL_RECOVERY_DAYS: f64 = 365.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BodySystem {
    Lungs,
    Heart,
    Energy,
    TasteSmell,
}

impl BodySystem {
    pub const ALL: [BodySystem; 4] = [
        BodySystem::Lungs,
        BodySystem::Heart,
        BodySystem::Energy,
        BodySystem::TasteSmell,
    ];
}

/// How a body system's recovery percentage grows with smoke-free days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryCurve {
    /// `min(cap, days * speed / full_recovery_days * 100)`
    Normalized {
        full_recovery_days: f64,
        speed: f64,
        cap: f64,
    },
    /// `min(cap, base + days * rate_per_day)`
    Linear {
        base: f64,
        rate_per_day: f64,
        cap: f64,
    },
}

impl RecoveryCurve {
    pub const fn normalized(full_recovery_days: f64, speed: f64) -> Self {
        RecoveryCurve::Normalized {
            full_recovery_days,
            speed,
            cap: MAX_PERCENTAGE,
        }
    }

    pub const fn linear(base: f64, rate_per_day: f64) -> Self {
        RecoveryCurve::Linear {
            base,
            rate_per_day,
            cap: MAX_PERCENTAGE,
        }
    }

    /// Percentage in `[0, 100]`, non-decreasing in `days`.
    pub fn percentage(&self, days: u32) -> f64 {
        let days = f64::from(days);
        match *self {
            RecoveryCurve::Normalized {
                full_recovery_days,
                speed,
                cap,
            } => {
                if full_recovery_days.is_nan() || full_recovery_days <= 0.0 {
                    return 0.0;
                }
                bounded(days * speed.max(0.0) / full_recovery_days * 100.0, cap)
            }
            RecoveryCurve::Linear {
                base,
                rate_per_day,
                cap,
            } => bounded(base + days * rate_per_day.max(0.0), cap),
        }
    }
}

/// `min(cap, days * growth_rate_per_day)`, clamped to `[0, 100]`.
pub fn recovery_percentage(days: u32, growth_rate_per_day: f64, cap: f64) -> f64 {
    bounded(f64::from(days) * growth_rate_per_day.max(0.0), cap)
}

fn bounded(value: f64, cap: f64) -> f64 {
    let ceiling = if cap.is_nan() {
        MAX_PERCENTAGE
    } else {
        cap.clamp(0.0, MAX_PERCENTAGE)
    };
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, ceiling)
}

/// Current-state curve for each body system.
pub fn default_curve(system: BodySystem) -> RecoveryCurve {
    match system {
        BodySystem::Lungs => RecoveryCurve::normalized(FULL_RECOVERY_DAYS, 1.0),
        BodySystem::Heart => RecoveryCurve::normalized(FULL_RECOVERY_DAYS, 1.2),
        BodySystem::Energy => RecoveryCurve::normalized(FULL_RECOVERY_DAYS, 1.5),
        BodySystem::TasteSmell => RecoveryCurve::normalized(FULL_RECOVERY_DAYS, 2.0),
    }
}

/// Forecast curve: an immediate baseline improvement plus linear daily gains.
pub fn default_prediction(system: BodySystem) -> RecoveryCurve {
    match system {
        BodySystem::Lungs => RecoveryCurve::linear(10.0, 0.25),
        BodySystem::Heart => RecoveryCurve::linear(15.0, 0.3),
        BodySystem::Energy => RecoveryCurve::linear(20.0, 0.4),
        BodySystem::TasteSmell => RecoveryCurve::linear(25.0, 0.5),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    BeginningRecovery,
    Improving,
    GreatProgress,
}

impl RecoveryStage {
    pub fn for_days(days: u32) -> Self {
        match days {
            0..=6 => RecoveryStage::BeginningRecovery,
            7..=29 => RecoveryStage::Improving,
            _ => RecoveryStage::GreatProgress,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecoveryStage::BeginningRecovery => "Beginning recovery",
            RecoveryStage::Improving => "Improving",
            RecoveryStage::GreatProgress => "Great progress",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DAYS: [u32; 12] = [0, 1, 2, 7, 30, 90, 182, 300, 365, 400, 5000, u32::MAX];

    #[test]
    fn default_curves_match_reference_formulas() {
        for days in [0u32, 10, 100, 200] {
            let d = f64::from(days);
            let lungs = default_curve(BodySystem::Lungs).percentage(days);
            let heart = default_curve(BodySystem::Heart).percentage(days);
            let energy = default_curve(BodySystem::Energy).percentage(days);
            let taste = default_curve(BodySystem::TasteSmell).percentage(days);
            assert!((lungs - (d / 365.0 * 100.0).min(100.0)).abs() < 1e-9);
            assert!((heart - (d * 1.2 / 365.0 * 100.0).min(100.0)).abs() < 1e-9);
            assert!((energy - (d * 1.5 / 365.0 * 100.0).min(100.0)).abs() < 1e-9);
            assert!((taste - (d * 2.0 / 365.0 * 100.0).min(100.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn one_year_is_fully_recovered() {
        assert_eq!(default_curve(BodySystem::Lungs).percentage(365), 100.0);
        assert_eq!(default_curve(BodySystem::Heart).percentage(365), 100.0);
        assert_eq!(default_curve(BodySystem::TasteSmell).percentage(183), 100.0);
    }

    #[test]
    fn day_zero_is_zero_for_current_curves() {
        for system in BodySystem::ALL {
            assert_eq!(default_curve(system).percentage(0), 0.0);
        }
    }

    #[test]
    fn outputs_stay_bounded_and_monotone() {
        let curves = [
            RecoveryCurve::normalized(365.0, 1.0),
            RecoveryCurve::normalized(30.0, 5.0),
            RecoveryCurve::normalized(0.0, 1.0),
            RecoveryCurve::normalized(365.0, -2.0),
            RecoveryCurve::linear(10.0, 0.25),
            RecoveryCurve::linear(-50.0, 0.5),
            RecoveryCurve::linear(150.0, 0.0),
            RecoveryCurve::linear(0.0, f64::NAN),
            RecoveryCurve::Linear {
                base: 0.0,
                rate_per_day: 1.0,
                cap: 250.0,
            },
        ];
        for curve in curves {
            let mut previous = 0.0;
            for days in SAMPLE_DAYS {
                let value = curve.percentage(days);
                assert!((0.0..=100.0).contains(&value), "{curve:?} at {days} gave {value}");
                assert!(value >= previous, "{curve:?} decreased at {days}");
                previous = value;
            }
        }
    }

    #[test]
    fn simple_rate_respects_cap() {
        assert_eq!(recovery_percentage(10, 2.0, 100.0), 20.0);
        assert_eq!(recovery_percentage(10, 2.0, 15.0), 15.0);
        assert_eq!(recovery_percentage(1000, 2.0, 500.0), 100.0);
        assert_eq!(recovery_percentage(10, -1.0, 100.0), 0.0);
    }

    #[test]
    fn predictions_add_base_before_clamping() {
        let lungs = default_prediction(BodySystem::Lungs);
        assert_eq!(lungs.percentage(0), 10.0);
        assert_eq!(lungs.percentage(40), 20.0);
        assert_eq!(lungs.percentage(10_000), 100.0);
    }

    #[test]
    fn stage_breakpoints() {
        assert_eq!(RecoveryStage::for_days(0), RecoveryStage::BeginningRecovery);
        assert_eq!(RecoveryStage::for_days(6), RecoveryStage::BeginningRecovery);
        assert_eq!(RecoveryStage::for_days(7), RecoveryStage::Improving);
        assert_eq!(RecoveryStage::for_days(29), RecoveryStage::Improving);
        assert_eq!(RecoveryStage::for_days(30), RecoveryStage::GreatProgress);
        assert_eq!(RecoveryStage::for_days(30).label(), "Great progress");
    }
}
