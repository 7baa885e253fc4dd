use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub is_smoke_free: bool,
    pub is_today: bool,
}

/// One displayed month, Sunday-first, padded to whole weeks with `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarGrid {
    pub year: i32,
    pub month_index: u32,
    pub leading_blanks: u32,
    pub days_in_month: u32,
    pub weeks: Vec<[Option<DayCell>; DAYS_PER_WEEK]>,
}

impl CalendarGrid {
    pub fn cells(&self) -> impl Iterator<Item = &DayCell> + '_ {
        self.weeks.iter().flatten().flatten()
    }

    pub fn cell(&self, day: u32) -> Option<&DayCell> {
        self.cells().find(|cell| cell.day == day)
    }

    pub fn smoke_free_days(&self) -> usize {
        self.cells().filter(|cell| cell.is_smoke_free).count()
    }
}

fn first_of_month(year: i32, month_index: u32) -> EngineResult<NaiveDate> {
    if month_index > 11 {
        return Err(EngineError::InvalidCalendarMonth { year, month_index });
    }
    NaiveDate::from_ymd_opt(year, month_index + 1, 1)
        .ok_or(EngineError::InvalidCalendarMonth { year, month_index })
}

pub fn days_in_month(year: i32, month_index: u32) -> EngineResult<u32> {
    let first = first_of_month(year, month_index)?;
    let next = if month_index == 11 {
        first_of_month(year + 1, 0)?
    } else {
        first_of_month(year, month_index + 1)?
    };
    Ok(next.signed_duration_since(first).num_days() as u32)
}

/// Lays out `month_index` (0 = January) of `year`, flagging days from the quit date
/// through today as smoke-free. Days after today are never flagged.
pub fn calendar_grid(
    quit_date: NaiveDate,
    year: i32,
    month_index: u32,
    today: NaiveDate,
) -> EngineResult<CalendarGrid> {
    let first = first_of_month(year, month_index)?;
    let days_in_month = days_in_month(year, month_index)?;
    let leading_blanks = first.weekday().num_days_from_sunday();

    let mut slots: Vec<Option<DayCell>> = vec![None; leading_blanks as usize];
    for (offset, date) in first.iter_days().take(days_in_month as usize).enumerate() {
        slots.push(Some(DayCell {
            date,
            day: offset as u32 + 1,
            is_smoke_free: date >= quit_date && date <= today,
            is_today: date == today,
        }));
    }
    while slots.len() % DAYS_PER_WEEK != 0 {
        slots.push(None);
    }

    let weeks = slots
        .chunks(DAYS_PER_WEEK)
        .map(|chunk| {
            let mut week = [None; DAYS_PER_WEEK];
            week.copy_from_slice(chunk);
            week
        })
        .collect();

    Ok(CalendarGrid {
        year,
        month_index,
        leading_blanks,
        days_in_month,
        weeks,
    })
}

/// Forward navigation is only allowed up to the month containing `today`.
pub fn can_advance(year: i32, month_index: u32, today: NaiveDate) -> bool {
    (year, month_index) < (today.year(), today.month0())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarCursor {
    pub year: i32,
    pub month_index: u32,
}

impl CalendarCursor {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month_index: date.month0(),
        }
    }

    /// Following month, or `None` if that would move past today's month.
    pub fn next(self, today: NaiveDate) -> Option<Self> {
        if !can_advance(self.year, self.month_index, today) {
            return None;
        }
        Some(if self.month_index == 11 {
            Self {
                year: self.year + 1,
                month_index: 0,
            }
        } else {
            Self {
                year: self.year,
                month_index: self.month_index + 1,
            }
        })
    }

    pub fn previous(self) -> Self {
        if self.month_index == 0 {
            Self {
                year: self.year - 1,
                month_index: 11,
            }
        } else {
            Self {
                year: self.year,
                month_index: self.month_index - 1,
            }
        }
    }

    pub fn grid(self, quit_date: NaiveDate, today: NaiveDate) -> EngineResult<CalendarGrid> {
        calendar_grid(quit_date, self.year, self.month_index, today)
    }
}

/// `max(0, selected - quit_date)` in days.
pub fn days_since_quit_for_date(quit_date: NaiveDate, selected: NaiveDate) -> u32 {
    let days = selected.signed_duration_since(quit_date).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// A selected date relative to the quit date. Keeps "not yet quit" apart from
/// "quit day", which the clamped day count cannot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectedDay {
    BeforeQuit { days_until_quit: u32 },
    QuitDay,
    SmokeFree { days: u32 },
}

impl SelectedDay {
    pub fn days_smoke_free(self) -> u32 {
        match self {
            SelectedDay::SmokeFree { days } => days,
            SelectedDay::BeforeQuit { .. } | SelectedDay::QuitDay => 0,
        }
    }
}

pub fn classify_selected_date(quit_date: NaiveDate, selected: NaiveDate) -> SelectedDay {
    let delta = selected.signed_duration_since(quit_date).num_days();
    match delta {
        d if d < 0 => SelectedDay::BeforeQuit {
            days_until_quit: u32::try_from(-d).unwrap_or(u32::MAX),
        },
        0 => SelectedDay::QuitDay,
        d => SelectedDay::SmokeFree {
            days: u32::try_from(d).unwrap_or(u32::MAX),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn layout_starts_on_the_right_weekday() {
        // 1 June 2025 is a Sunday, 1 February 2025 a Saturday.
        let june = calendar_grid(date(2025, 1, 1), 2025, 5, date(2025, 6, 30)).unwrap();
        assert_eq!(june.leading_blanks, 0);
        assert_eq!(june.days_in_month, 30);
        assert_eq!(june.weeks.len(), 5);

        let feb = calendar_grid(date(2025, 1, 1), 2025, 1, date(2025, 6, 30)).unwrap();
        assert_eq!(feb.leading_blanks, 6);
        assert_eq!(feb.days_in_month, 28);
        assert_eq!(feb.weeks[0][6].map(|c| c.day), Some(1));
        assert!(feb.weeks[0][..6].iter().all(Option::is_none));
        assert_eq!(feb.cells().count(), 28);
    }

    #[test]
    fn leap_february_and_december_lengths() {
        assert_eq!(days_in_month(2024, 1).unwrap(), 29);
        assert_eq!(days_in_month(2025, 11).unwrap(), 31);
        assert!(matches!(
            days_in_month(2025, 12),
            Err(EngineError::InvalidCalendarMonth { month_index: 12, .. })
        ));
    }

    #[test]
    fn month_before_quit_has_no_smoke_free_days() {
        let grid = calendar_grid(date(2025, 6, 10), 2025, 4, date(2025, 6, 20)).unwrap();
        assert_eq!(grid.smoke_free_days(), 0);
    }

    #[test]
    fn current_month_with_mid_month_quit() {
        let quit = date(2025, 6, 10);
        let today = date(2025, 6, 20);
        let grid = calendar_grid(quit, 2025, 5, today).unwrap();

        assert!(!grid.cell(9).unwrap().is_smoke_free);
        assert!(grid.cell(10).unwrap().is_smoke_free);
        assert!(grid.cell(20).unwrap().is_smoke_free);
        assert!(grid.cell(20).unwrap().is_today);
        assert!(!grid.cell(21).unwrap().is_smoke_free);
        assert_eq!(grid.smoke_free_days(), 11);
        assert_eq!(grid.cells().filter(|c| c.is_today).count(), 1);
    }

    #[test]
    fn advancing_stops_at_current_month() {
        let today = date(2025, 6, 15);
        assert!(!can_advance(2025, 5, today));
        assert!(can_advance(2025, 4, today));
        assert!(can_advance(2024, 11, today));
        assert!(!can_advance(2025, 6, today));

        let cursor = CalendarCursor::of(date(2024, 12, 3));
        let next = cursor.next(today).unwrap();
        assert_eq!(
            next,
            CalendarCursor {
                year: 2025,
                month_index: 0
            }
        );
        assert_eq!(next.previous(), cursor);
        assert_eq!(CalendarCursor::of(today).next(today), None);
    }

    #[test]
    fn selected_dates_relative_to_quit() {
        let quit = date(2025, 6, 10);
        assert_eq!(days_since_quit_for_date(quit, date(2025, 6, 1)), 0);
        assert_eq!(days_since_quit_for_date(quit, date(2025, 6, 10)), 0);
        assert_eq!(days_since_quit_for_date(quit, date(2025, 7, 10)), 30);

        assert_eq!(
            classify_selected_date(quit, date(2025, 6, 7)),
            SelectedDay::BeforeQuit { days_until_quit: 3 }
        );
        assert_eq!(classify_selected_date(quit, quit), SelectedDay::QuitDay);
        assert_eq!(
            classify_selected_date(quit, date(2025, 6, 15)).days_smoke_free(),
            5
        );
    }
}
