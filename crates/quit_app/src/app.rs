use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, NaiveDate};
use quit_core::{
    calendar::{can_advance, CalendarCursor, CalendarGrid},
    profile::{RawProfile, ResolutionNotes},
    service::{JsonFileProfileSource, StaticProfileSource},
    time_basis::{local_date, RawTimestamp},
    DerivedSnapshot, ProgressService,
};
use serde::Serialize;
use tracing::{debug, info, warn};

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub(crate) profile_path: Option<PathBuf>,
    pub(crate) profile: RawProfile,
    pub(crate) calendar_month: Option<CalendarCursor>,
    pub(crate) utc_offset_minutes: i32,
    pub(crate) refresh: Option<Duration>,
}

impl AppConfig {
    /// Never fails today; unusable variables are skipped by [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds the config from any key lookup; unusable values are logged and skipped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("QUIT_PROFILE_PATH") {
            info!(path = %path, "using profile file");
            config.profile_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("QUIT_AT") {
            let raw = raw.trim();
            if !raw.is_empty() {
                config.profile.quit_instant = Some(RawTimestamp::Text(raw.to_string()));
            }
        }
        config.profile.cigarettes_per_day = parse_var(&lookup, "QUIT_CIGARETTES_PER_DAY");
        config.profile.cost_per_pack_cents = parse_var(&lookup, "QUIT_COST_PER_PACK_CENTS");
        config.profile.cigarettes_per_pack = parse_var(&lookup, "QUIT_CIGARETTES_PER_PACK");

        if let Some(month) = lookup("QUIT_CALENDAR_MONTH") {
            match parse_month(&month) {
                Some(cursor) => config.calendar_month = Some(cursor),
                None => warn!(value = %month, "ignoring QUIT_CALENDAR_MONTH, expected YYYY-MM"),
            }
        }
        if let Some(offset) = parse_var::<i32>(&lookup, "QUIT_UTC_OFFSET_MINUTES") {
            if (1 - MAX_OFFSET_MINUTES..MAX_OFFSET_MINUTES).contains(&offset) {
                config.utc_offset_minutes = offset;
            } else {
                warn!(offset, "ignoring out-of-range QUIT_UTC_OFFSET_MINUTES");
            }
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "QUIT_REFRESH_SECS") {
            if secs > 0 {
                config.refresh = Some(Duration::from_secs(secs));
            }
        }
        config
    }

    pub(crate) fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("invalid UTC offset of {} minutes", self.utc_offset_minutes))
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %value, "ignoring unparseable setting");
            None
        }
    }
}

fn parse_month(value: &str) -> Option<CalendarCursor> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()?;
    Some(CalendarCursor::of(first))
}

/// What one refresh prints.
#[derive(Debug, Serialize)]
pub struct ProgressReport {
    pub snapshot: DerivedSnapshot,
    pub calendar: CalendarGrid,
    pub can_advance_month: bool,
    pub profile_notes: ResolutionNotes,
}

fn build_service(config: &AppConfig) -> Result<ProgressService> {
    let builder = ProgressService::builder();
    let builder = match &config.profile_path {
        Some(path) => builder.with_profile_source(JsonFileProfileSource::new(path)),
        None => builder.with_profile_source(StaticProfileSource(config.profile.clone())),
    };
    builder.build().context("failed to initialize progress service")
}

pub fn build_report(service: &ProgressService, config: &AppConfig) -> Result<ProgressReport> {
    let offset = config.offset()?;
    let (_, profile_notes) = service.resolved_profile();
    let snapshot = service.snapshot()?;
    let calendar = service.calendar(config.calendar_month, offset)?;
    let today = local_date(snapshot.now, &offset);
    Ok(ProgressReport {
        can_advance_month: can_advance(calendar.year, calendar.month_index, today),
        snapshot,
        calendar,
        profile_notes,
    })
}

pub fn run(config: AppConfig) -> Result<()> {
    info!(refresh = ?config.refresh, "starting quit progress runner");
    let mut service = build_service(&config)?;
    if config.refresh.is_some() && config.profile_path.is_some() {
        service.watch().context("failed to watch profile file")?;
    }

    loop {
        let report = build_report(&service, &config)?;
        debug!(days = report.snapshot.days_since_quit, "report computed");
        println!("{}", serde_json::to_string_pretty(&report)?);
        match config.refresh {
            Some(interval) => thread::sleep(interval),
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn reads_profile_overrides() {
        let config = config_from(&[
            ("QUIT_AT", "2025-06-01"),
            ("QUIT_CIGARETTES_PER_DAY", "15"),
            ("QUIT_COST_PER_PACK_CENTS", "1250"),
            ("QUIT_CIGARETTES_PER_PACK", "25"),
            ("QUIT_CALENDAR_MONTH", "2025-05"),
            ("QUIT_UTC_OFFSET_MINUTES", "-300"),
            ("QUIT_REFRESH_SECS", "60"),
        ]);
        assert_eq!(
            config.profile.quit_instant,
            Some(RawTimestamp::Text("2025-06-01".into()))
        );
        assert_eq!(config.profile.cigarettes_per_day, Some(15));
        assert_eq!(config.profile.cost_per_pack_cents, Some(1250));
        assert_eq!(config.profile.cigarettes_per_pack, Some(25));
        assert_eq!(
            config.calendar_month,
            Some(CalendarCursor {
                year: 2025,
                month_index: 4
            })
        );
        assert_eq!(config.offset().unwrap().local_minus_utc(), -300 * 60);
        assert_eq!(config.refresh, Some(Duration::from_secs(60)));
    }

    #[test]
    fn bad_values_are_ignored() {
        let config = config_from(&[
            ("QUIT_CIGARETTES_PER_DAY", "a lot"),
            ("QUIT_CALENDAR_MONTH", "May"),
            ("QUIT_UTC_OFFSET_MINUTES", "5000"),
            ("QUIT_REFRESH_SECS", "0"),
        ]);
        assert_eq!(config.profile.cigarettes_per_day, None);
        assert_eq!(config.calendar_month, None);
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.refresh, None);
    }

    #[test]
    fn extreme_offsets_are_ignored() {
        for raw in ["-2147483648", "2147483647", "-1080", "1080"] {
            let config = config_from(&[("QUIT_UTC_OFFSET_MINUTES", raw)]);
            assert_eq!(config.utc_offset_minutes, 0, "{raw}");
            assert!(config.offset().is_ok());
        }
        let config = config_from(&[("QUIT_UTC_OFFSET_MINUTES", "-1079")]);
        assert_eq!(config.utc_offset_minutes, -1079);
    }

    #[test]
    fn report_uses_static_profile() {
        let config = config_from(&[("QUIT_AT", "2020-01-01T00:00:00Z")]);
        let service = build_service(&config).unwrap();
        let report = build_report(&service, &config).unwrap();
        assert!(report.snapshot.days_since_quit > 365);
        assert!(!report.can_advance_month);
        assert!(report.calendar.smoke_free_days() > 0);
        assert!(report.profile_notes.defaulted_fields.contains(&"cigarettes_per_pack"));
    }
}
