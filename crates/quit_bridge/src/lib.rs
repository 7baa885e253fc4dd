use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use napi_derive::napi;
use once_cell::sync::Lazy;
use quit_core::{
    calendar::{can_advance, CalendarCursor},
    profile::RawProfile,
    savings::{Money, SavingsGoal},
    service::StaticProfileSource,
    time_basis::{from_epoch_millis, local_date, FixedClock, RawTimestamp},
    EngineError, ProgressEngine, ProgressService,
};
use serde_json::json;

static ENGINE: Lazy<Result<ProgressEngine, EngineError>> = Lazy::new(ProgressEngine::standard);

/// Habit settings as stored by the app. `quitInstant` wins over `quitInstantMillis`.
#[napi(object)]
#[derive(Clone, Debug)]
pub struct ProfileInput {
    pub quit_instant: Option<String>,
    pub quit_instant_millis: Option<i64>,
    pub cigarettes_per_day: Option<u32>,
    pub cost_per_pack_cents: Option<i64>,
    pub cigarettes_per_pack: Option<u32>,
}

#[napi(object)]
pub struct SnapshotRequest {
    pub profile: ProfileInput,
    pub now_millis: Option<i64>,
}

#[napi(object)]
pub struct CalendarRequest {
    pub profile: ProfileInput,
    pub year: i32,
    pub month_index: u32,
    pub now_millis: Option<i64>,
    pub utc_offset_minutes: Option<i32>,
}

#[napi(object)]
pub struct SelectedDayRequest {
    pub profile: ProfileInput,
    /// `YYYY-MM-DD`
    pub selected_date: String,
    pub now_millis: Option<i64>,
    pub utc_offset_minutes: Option<i32>,
}

#[napi(object)]
pub struct SavingsGoalRequest {
    pub profile: ProfileInput,
    pub name: String,
    pub cost_cents: i64,
    pub now_millis: Option<i64>,
}

#[napi]
pub fn ping() -> String {
    "quit-progress-bridge".to_owned()
}

#[napi]
pub fn derive_snapshot(request: SnapshotRequest) -> napi::Result<serde_json::Value> {
    let service = build_service(&request.profile, request.now_millis).map_err(to_napi_error)?;
    let snapshot = service.snapshot().map_err(to_napi_error)?;
    let (_, notes) = service.resolved_profile();
    Ok(json!({
        "snapshot": snapshot,
        "profileNotes": notes,
    }))
}

#[napi]
pub fn calendar_grid(request: CalendarRequest) -> napi::Result<serde_json::Value> {
    let CalendarRequest {
        profile,
        year,
        month_index,
        now_millis,
        utc_offset_minutes,
    } = request;
    let offset = offset_from(utc_offset_minutes).map_err(to_napi_error)?;
    let service = build_service(&profile, now_millis).map_err(to_napi_error)?;
    let grid = service
        .calendar(Some(CalendarCursor { year, month_index }), offset)
        .map_err(to_napi_error)?;
    let today = local_date(service.now(), &offset);
    Ok(json!({
        "grid": grid,
        "canAdvance": can_advance(year, month_index, today),
    }))
}

#[napi]
pub fn can_advance_month(
    year: i32,
    month_index: u32,
    now_millis: Option<i64>,
    utc_offset_minutes: Option<i32>,
) -> napi::Result<bool> {
    let offset = offset_from(utc_offset_minutes).map_err(to_napi_error)?;
    let now = resolve_now(now_millis).map_err(to_napi_error)?;
    Ok(can_advance(year, month_index, local_date(now, &offset)))
}

#[napi]
pub fn selected_day(request: SelectedDayRequest) -> napi::Result<serde_json::Value> {
    let offset = offset_from(request.utc_offset_minutes).map_err(to_napi_error)?;
    let selected = NaiveDate::parse_from_str(request.selected_date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid selected date {:?}", request.selected_date))
        .map_err(to_napi_error)?;
    let service = build_service(&request.profile, request.now_millis).map_err(to_napi_error)?;
    let day = service.selected_day(selected, offset);
    Ok(json!({
        "day": day,
        "daysSmokeFree": day.days_smoke_free(),
    }))
}

#[napi]
pub fn savings_goal(request: SavingsGoalRequest) -> napi::Result<serde_json::Value> {
    let cost = u64::try_from(request.cost_cents)
        .map_err(|_| anyhow!("goal cost must not be negative"))
        .map_err(to_napi_error)?;
    let service = build_service(&request.profile, request.now_millis).map_err(to_napi_error)?;
    let snapshot = service.snapshot().map_err(to_napi_error)?;
    let goal = SavingsGoal::new(request.name, Money::from_cents(cost));
    let progress = goal.evaluate(snapshot.financials.total_saved);
    serde_json::to_value(progress).map_err(|err| to_napi_error(err.into()))
}

fn engine() -> Result<&'static ProgressEngine> {
    ENGINE
        .as_ref()
        .map_err(|err| anyhow!(err.clone()).context("progress engine misconfigured"))
}

fn raw_profile(input: &ProfileInput) -> Result<RawProfile> {
    let quit_instant = match (&input.quit_instant, input.quit_instant_millis) {
        (Some(text), _) if !text.trim().is_empty() => Some(RawTimestamp::Text(text.clone())),
        (_, Some(millis)) => Some(RawTimestamp::Millis(millis)),
        _ => None,
    };
    let cost_per_pack_cents = input
        .cost_per_pack_cents
        .map(u64::try_from)
        .transpose()
        .map_err(|_| anyhow!("cost per pack must not be negative"))?;
    Ok(RawProfile {
        quit_instant,
        cigarettes_per_day: input.cigarettes_per_day,
        cost_per_pack_cents,
        cigarettes_per_pack: input.cigarettes_per_pack,
    })
}

fn resolve_now(now_millis: Option<i64>) -> Result<DateTime<Utc>> {
    match now_millis {
        Some(millis) => {
            from_epoch_millis(millis).ok_or_else(|| anyhow!("invalid now timestamp {millis}"))
        }
        None => Ok(Utc::now()),
    }
}

fn offset_from(minutes: Option<i32>) -> Result<FixedOffset> {
    let minutes = minutes.unwrap_or(0);
    FixedOffset::east_opt(minutes.saturating_mul(60))
        .ok_or_else(|| anyhow!("invalid UTC offset of {minutes} minutes"))
}

fn build_service(profile: &ProfileInput, now_millis: Option<i64>) -> Result<ProgressService> {
    ProgressService::builder()
        .with_engine(engine()?.clone())
        .with_clock(FixedClock(resolve_now(now_millis)?))
        .with_profile_source(StaticProfileSource(raw_profile(profile)?))
        .build()
        .context("failed to initialize progress service")
}

fn to_napi_error(err: anyhow::Error) -> napi::Error {
    napi::Error::new(napi::Status::GenericFailure, format!("{err:#}"))
}
