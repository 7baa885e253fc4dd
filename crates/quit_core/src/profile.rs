use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_basis::{resolve_quit_instant_or_now, InstantOrigin, RawTimestamp};

pub const DEFAULT_CIGARETTES_PER_DAY: u32 = 10;
pub const DEFAULT_COST_PER_PACK_CENTS: u64 = 1000;
pub const DEFAULT_CIGARETTES_PER_PACK: u32 = 20;

/// Habit baseline and quit instant every computation is derived from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuitProfile {
    pub quit_instant: DateTime<Utc>,
    pub cigarettes_per_day: u32,
    pub cost_per_pack_cents: u64,
    pub cigarettes_per_pack: u32,
}

impl QuitProfile {
    /// Profile with the default habit numbers.
    pub fn new(quit_instant: DateTime<Utc>) -> Self {
        Self {
            quit_instant,
            cigarettes_per_day: DEFAULT_CIGARETTES_PER_DAY,
            cost_per_pack_cents: DEFAULT_COST_PER_PACK_CENTS,
            cigarettes_per_pack: DEFAULT_CIGARETTES_PER_PACK,
        }
    }

    pub fn with_habit(
        mut self,
        cigarettes_per_day: u32,
        cost_per_pack_cents: u64,
        cigarettes_per_pack: u32,
    ) -> Self {
        self.cigarettes_per_day = cigarettes_per_day;
        self.cost_per_pack_cents = cost_per_pack_cents;
        self.cigarettes_per_pack = cigarettes_per_pack;
        self
    }
}

/// Profile as supplied by the external settings layer. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    #[serde(default)]
    pub quit_instant: Option<RawTimestamp>,
    #[serde(default)]
    pub cigarettes_per_day: Option<u32>,
    #[serde(default)]
    pub cost_per_pack_cents: Option<u64>,
    #[serde(default)]
    pub cigarettes_per_pack: Option<u32>,
}

/// What [`RawProfile::resolve`] had to fill in.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResolutionNotes {
    pub quit_instant: Option<InstantOrigin>,
    pub defaulted_fields: Vec<&'static str>,
}

impl ResolutionNotes {
    pub fn is_clean(&self) -> bool {
        self.defaulted_fields.is_empty()
            && matches!(self.quit_instant, Some(InstantOrigin::Provided))
    }
}

impl RawProfile {
    /// Substitutes defaults for missing or zero habit numbers and resolves the quit
    /// instant, falling back to `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> (QuitProfile, ResolutionNotes) {
        let mut notes = ResolutionNotes::default();
        let resolved = resolve_quit_instant_or_now(self.quit_instant.as_ref(), now);
        notes.quit_instant = Some(resolved.origin);

        let cigarettes_per_day = positive_or(
            self.cigarettes_per_day,
            DEFAULT_CIGARETTES_PER_DAY,
            "cigarettes_per_day",
            &mut notes,
        );
        let cost_per_pack_cents = positive_or(
            self.cost_per_pack_cents,
            DEFAULT_COST_PER_PACK_CENTS,
            "cost_per_pack_cents",
            &mut notes,
        );
        let cigarettes_per_pack = positive_or(
            self.cigarettes_per_pack,
            DEFAULT_CIGARETTES_PER_PACK,
            "cigarettes_per_pack",
            &mut notes,
        );

        if !notes.defaulted_fields.is_empty() {
            tracing::debug!(fields = ?notes.defaulted_fields, "habit defaults applied");
        }

        let profile = QuitProfile {
            quit_instant: resolved.instant,
            cigarettes_per_day,
            cost_per_pack_cents,
            cigarettes_per_pack,
        };
        (profile, notes)
    }
}

fn positive_or<T>(
    value: Option<T>,
    default: T,
    field: &'static str,
    notes: &mut ResolutionNotes,
) -> T
where
    T: Copy + PartialEq + Default,
{
    match value {
        Some(v) if v != T::default() => v,
        _ => {
            notes.defaulted_fields.push(field);
            default
        }
    }
}
