//! Solar-term boundaries and lunisolar conversion.

pub mod astronomy;
mod cache;
mod earth;
mod lunar;
mod solar_term;

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use bazi_types::LunarDate;

pub use cache::{BOUNDARIES_PER_YEAR, DEFAULT_UTC_OFFSET_MINUTES, SolarTermCache, YearTable};
pub use solar_term::SolarTerm;

use crate::errors::{CalendarError, ensure_supported};

/// Calendar queries backed by a shared [`SolarTermCache`].
///
/// Cloning is cheap; clones share the cache.
#[derive(Debug, Clone, Default)]
pub struct CalendarConverter {
    cache: Arc<SolarTermCache>,
}

impl CalendarConverter {
    #[must_use]
    pub fn new(cache: Arc<SolarTermCache>) -> Self {
        Self { cache }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<SolarTermCache> {
        &self.cache
    }

    /// Lunisolar date for a Gregorian date in 1900..=2100.
    pub fn to_lunar(&self, year: i32, month: u32, day: u32) -> Result<LunarDate, CalendarError> {
        ensure_supported(year)?;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(CalendarError::InvalidDate { year, month, day })?;
        lunar::to_lunar(&self.cache, date)
    }

    pub fn lunar_of(&self, date: NaiveDate) -> Result<LunarDate, CalendarError> {
        ensure_supported(date.year())?;
        lunar::to_lunar(&self.cache, date)
    }

    /// Index in `0..=23` (立春 = 0) of the last solar term at or before `instant`.
    pub fn solar_term_index(&self, instant: NaiveDateTime) -> Result<usize, CalendarError> {
        self.solar_term_at(instant).map(SolarTerm::index)
    }

    /// The last solar term at or before `instant`. A term instant itself
    /// belongs to the term that begins there.
    pub fn solar_term_at(&self, instant: NaiveDateTime) -> Result<SolarTerm, CalendarError> {
        let year = instant.year();
        ensure_supported(year)?;
        self.cache
            .year(year)?
            .term_at(instant)
            .ok_or_else(|| CalendarError::SolarTerms {
                year,
                reason: format!("{instant} precedes the first boundary"),
            })
    }

    /// Local instant at which `term` begins within Gregorian `year`.
    pub fn term_instant(&self, year: i32, term: SolarTerm) -> Result<NaiveDateTime, CalendarError> {
        ensure_supported(year)?;
        Ok(self.cache.year(year)?.instant(term))
    }

    /// The 24 terms of Gregorian `year` in chronological order (小寒 first).
    pub fn solar_terms(&self, year: i32) -> Result<Vec<(SolarTerm, NaiveDateTime)>, CalendarError> {
        ensure_supported(year)?;
        Ok(self.cache.year(year)?.boundaries()[2..].to_vec())
    }

    /// Year used for the year pillar: `instant`'s Gregorian year, or the one
    /// before when `instant` precedes that year's 立春.
    pub fn solar_year_of(&self, instant: NaiveDateTime) -> Result<i32, CalendarError> {
        let year = instant.year();
        ensure_supported(year)?;
        let lichun = self.cache.year(year)?.lichun();
        Ok(if instant < lichun { year - 1 } else { year })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> CalendarConverter {
        CalendarConverter::default()
    }

    #[test]
    fn term_instant_is_inclusive() {
        let calendar = converter();
        let lichun = calendar.term_instant(2024, SolarTerm::LiChun).unwrap();
        assert_eq!(calendar.solar_term_at(lichun).unwrap(), SolarTerm::LiChun);
        assert_eq!(calendar.solar_term_index(lichun).unwrap(), 0);
        let before = lichun - chrono::TimeDelta::seconds(1);
        assert_eq!(calendar.solar_term_at(before).unwrap(), SolarTerm::DaHan);
        assert_eq!(calendar.solar_term_index(before).unwrap(), 23);
    }

    #[test]
    fn solar_year_switches_at_lichun() {
        let calendar = converter();
        let lichun = calendar.term_instant(2024, SolarTerm::LiChun).unwrap();
        assert_eq!(calendar.solar_year_of(lichun).unwrap(), 2024);
        assert_eq!(
            calendar
                .solar_year_of(lichun - chrono::TimeDelta::seconds(1))
                .unwrap(),
            2023
        );
    }

    #[test]
    fn solar_terms_are_chronological() {
        let terms = converter().solar_terms(2024).unwrap();
        assert_eq!(terms.len(), 24);
        assert_eq!(terms[0].0, SolarTerm::XiaoHan);
        assert_eq!(terms[23].0, SolarTerm::DongZhi);
        assert!(terms.windows(2).all(|w| w[0].1 < w[1].1));
        assert!(terms.iter().all(|(_, at)| at.year() == 2024));
    }

    #[test]
    fn epoch_is_enforced() {
        let calendar = converter();
        assert_eq!(
            calendar.to_lunar(1899, 12, 31),
            Err(CalendarError::DateOutOfRange {
                year: 1899,
                min: 1900,
                max: 2100
            })
        );
        assert!(matches!(
            calendar.to_lunar(2101, 1, 1),
            Err(CalendarError::DateOutOfRange { .. })
        ));
        assert!(calendar.to_lunar(1900, 1, 31).is_ok());
        assert!(calendar.to_lunar(2100, 12, 31).is_ok());
    }

    #[test]
    fn invalid_dates_are_rejected() {
        assert_eq!(
            converter().to_lunar(2023, 2, 29),
            Err(CalendarError::InvalidDate {
                year: 2023,
                month: 2,
                day: 29
            })
        );
    }
}
