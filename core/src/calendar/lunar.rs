//! Gregorian to lunisolar date conversion.
//!
//! Month 11 is the lunar month containing the winter solstice. When two
//! consecutive month-11 starts are more than 365 days apart the sui holds
//! thirteen months, and the first month whose start and end fall in the same
//! 30° solar sector (no principal term) is the leap month.

use chrono::{Datelike, NaiveDate};

use bazi_types::LunarDate;

use super::cache::{SolarTermCache, new_moon_day, solar_sector};
use crate::errors::CalendarError;

pub(crate) fn to_lunar(cache: &SolarTermCache, date: NaiveDate) -> Result<LunarDate, CalendarError> {
    let offset = cache.utc_offset_minutes();
    let year = date.year();
    let month_start = month_start(date, offset)?;

    let this_eleven = cache.year(year)?;
    let (mut lunar_year, a11, b11) = if this_eleven.month_eleven() >= month_start {
        (year, cache.year(year - 1)?, this_eleven)
    } else {
        (year + 1, this_eleven, cache.year(year + 1)?)
    };

    let day = (date - month_start).num_days() as u32 + 1;
    let months_since_eleven = ((month_start - a11.month_eleven()).num_days() / 29) as u32;
    let mut month = months_since_eleven + 11;
    let mut is_leap_month = false;

    if (b11.month_eleven() - a11.month_eleven()).num_days() > 365 {
        let leap = leap_month_offset(a11.month_eleven_lunation(), year, offset)?;
        if months_since_eleven >= leap {
            month = months_since_eleven + 10;
            is_leap_month = months_since_eleven == leap;
        }
    }
    if month > 12 {
        month -= 12;
    }
    if month >= 11 && months_since_eleven < 4 {
        lunar_year -= 1;
    }

    Ok(LunarDate {
        year: lunar_year,
        month,
        day,
        is_leap_month,
    })
}

/// Start day of the lunar month containing `date`.
fn month_start(date: NaiveDate, offset: i32) -> Result<NaiveDate, CalendarError> {
    let midnight = super::astronomy::local_midnight_jd(date, offset);
    let mut lunation = super::astronomy::lunation_before(midnight) + 1.0;
    for _ in 0..4 {
        let day = new_moon_day(lunation, offset).ok_or_else(|| no_new_moon(date.year()))?;
        if day <= date {
            return Ok(day);
        }
        lunation -= 1.0;
    }
    Err(no_new_moon(date.year()))
}

/// Months after month 11 at which the leap month falls, for the sui starting at `eleven`.
fn leap_month_offset(eleven: f64, year: i32, offset: i32) -> Result<u32, CalendarError> {
    let sector_of = |i: u32| {
        new_moon_day(eleven + f64::from(i), offset)
            .map(|day| solar_sector(day, offset))
            .ok_or_else(|| no_new_moon(year))
    };
    let mut previous = sector_of(1)?;
    for i in 2..14 {
        let current = sector_of(i)?;
        if current == previous {
            return Ok(i - 1);
        }
        previous = current;
    }
    Err(CalendarError::SolarTerms {
        year,
        reason: "thirteen-month sui without a month lacking a principal term".to_string(),
    })
}

fn no_new_moon(year: i32) -> CalendarError {
    CalendarError::SolarTerms {
        year,
        reason: "new moon could not be located".to_string(),
    }
}
