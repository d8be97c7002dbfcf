//! Year, month, day and hour pillars.
//!
//! One code path serves both the fixed reference ("base") instant and the
//! observed ("current") instants, so the two can never drift apart.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use bazi_types::{EarthlyBranch, FourPillars, HeavenlyStem, Pillar, verify_sexagenary_table};

use crate::calendar::CalendarConverter;
use crate::errors::{PillarError, ensure_supported};

/// Per-month day-count adjustment, indexed by Gregorian month (1-based).
const MONTH_ADJUSTMENT: [i64; 13] = [0, 1, 2, 0, 1, 1, 2, 2, 3, 4, 4, 5, 5];

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Zero-based sexagenary position of the day pillar for a Gregorian date.
///
/// Continuous day count from 1900 using the month adjustment table, +30 for
/// even months, and a one-day leap correction in January and February.
#[must_use]
pub fn day_cycle_position(date: NaiveDate) -> i64 {
    let year = i64::from(date.year());
    let month = date.month() as usize;
    let since_1900 = year - 1900;
    let skipped_leap_days = (year.div_euclid(100) - 19) - (year.div_euclid(400) - 4);

    let mut count = 5 * since_1900 + since_1900.div_euclid(4) - skipped_leap_days + 9
        + i64::from(date.day())
        + MONTH_ADJUSTMENT[month];
    if month % 2 == 0 {
        count += 30;
    }
    if is_leap_year(year) && month <= 2 {
        count -= 1;
    }
    (count - 1).rem_euclid(60)
}

/// Computes pillars from local date-times, reading solar-term boundaries
/// through a shared [`CalendarConverter`].
#[derive(Debug, Clone)]
pub struct PillarCalculator {
    calendar: CalendarConverter,
}

impl PillarCalculator {
    /// Build a calculator after checking the sixty-term table.
    pub fn new(calendar: CalendarConverter) -> Result<Self, PillarError> {
        verify_sexagenary_table()?;
        Ok(Self { calendar })
    }

    #[must_use]
    pub fn calendar(&self) -> &CalendarConverter {
        &self.calendar
    }

    pub fn year_pillar(&self, instant: NaiveDateTime) -> Result<Pillar, PillarError> {
        let solar_year = self.calendar.solar_year_of(instant)?;
        Ok(Pillar::from_cycle_position(i64::from(solar_year) - 4))
    }

    pub fn month_pillar(&self, instant: NaiveDateTime) -> Result<Pillar, PillarError> {
        let year_stem = self.year_pillar(instant)?.stem();
        let month = i64::from(self.calendar.solar_term_at(instant)?.month_number());
        let stem = HeavenlyStem::new(2 * i64::from(year_stem.index()) + month + 1);
        let branch = EarthlyBranch::YIN + (month - 1);
        Ok(Pillar::new(stem, branch)?)
    }

    pub fn day_pillar(&self, date: NaiveDate) -> Result<Pillar, PillarError> {
        ensure_supported(date.year())?;
        Ok(Pillar::from_cycle_position(day_cycle_position(date)))
    }

    /// Day pillar for an hour of `date`. From 23:00 the 子 hour of the next
    /// day has begun, so the next day's pillar applies.
    pub fn day_pillar_at(&self, date: NaiveDate, hour: u32) -> Result<Pillar, PillarError> {
        check_hour(hour)?;
        ensure_supported(date.year())?;
        let effective = if hour == 23 {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        Ok(Pillar::from_cycle_position(day_cycle_position(effective)))
    }

    pub fn hour_pillar(&self, date: NaiveDate, hour: u32) -> Result<Pillar, PillarError> {
        let day_stem = self.day_pillar_at(date, hour)?.stem();
        let branch = EarthlyBranch::new(i64::from((hour + 1) / 2));
        let stem = HeavenlyStem::new(2 * i64::from(day_stem.index()) + i64::from(branch.index()));
        Ok(Pillar::new(stem, branch)?)
    }

    /// Four pillars of a local instant.
    pub fn four_pillars_at(&self, instant: NaiveDateTime) -> Result<FourPillars, PillarError> {
        let date = instant.date();
        let hour = instant.hour();
        Ok(FourPillars::new(
            self.year_pillar(instant)?,
            self.month_pillar(instant)?,
            self.day_pillar_at(date, hour)?,
            self.hour_pillar(date, hour)?,
        ))
    }

    /// Four pillars of `date` at the top of `hour`.
    pub fn four_pillars_of(&self, date: NaiveDate, hour: u32) -> Result<FourPillars, PillarError> {
        check_hour(hour)?;
        let instant = date
            .and_hms_opt(hour, 0, 0)
            .ok_or(PillarError::InvalidHour { hour })?;
        self.four_pillars_at(instant)
    }
}

fn check_hour(hour: u32) -> Result<(), PillarError> {
    if hour > 23 {
        Err(PillarError::InvalidHour { hour })
    } else {
        Ok(())
    }
}
