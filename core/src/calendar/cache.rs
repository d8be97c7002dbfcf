//! Per-year solar-term boundary tables with lazy, populate-once caching.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use super::astronomy;
use super::solar_term::SolarTerm;
use crate::errors::CalendarError;

/// Default civil offset for calendar days: UTC+8.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 480;

/// Years the cache will compute. One year wider than the public epoch on
/// each side because lunar conversion looks at neighbouring years.
const CACHE_MIN_YEAR: i32 = 1899;
const CACHE_MAX_YEAR: i32 = 2101;

/// Number of term boundaries held per Gregorian year.
pub const BOUNDARIES_PER_YEAR: usize = 26;

/// Solar-term boundaries and the month-11 new moon of one Gregorian year.
///
/// Boundaries run from 大雪 of the previous year to 冬至 of this year, so
/// every instant of the year has a preceding boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTable {
    year: i32,
    boundaries: Vec<(SolarTerm, NaiveDateTime)>,
    month_eleven: NaiveDate,
    month_eleven_lunation: f64,
}

impl YearTable {
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn boundaries(&self) -> &[(SolarTerm, NaiveDateTime)] {
        &self.boundaries
    }

    /// Instant of `term` within this Gregorian year.
    #[must_use]
    pub fn instant(&self, term: SolarTerm) -> NaiveDateTime {
        let position = match term {
            SolarTerm::XiaoHan => 2,
            SolarTerm::DaHan => 3,
            other => other.index() + 4,
        };
        self.boundaries[position].1
    }

    #[must_use]
    pub fn lichun(&self) -> NaiveDateTime {
        self.instant(SolarTerm::LiChun)
    }

    /// The last term whose instant is at or before `instant`.
    #[must_use]
    pub fn term_at(&self, instant: NaiveDateTime) -> Option<SolarTerm> {
        let after = self.boundaries.partition_point(|(_, at)| *at <= instant);
        after.checked_sub(1).map(|i| self.boundaries[i].0)
    }

    /// First day of the lunar month containing this year's winter solstice.
    #[must_use]
    pub fn month_eleven(&self) -> NaiveDate {
        self.month_eleven
    }

    pub(crate) fn month_eleven_lunation(&self) -> f64 {
        self.month_eleven_lunation
    }

    fn compute(year: i32, offset_minutes: i32) -> Result<Self, CalendarError> {
        let mut boundaries = Vec::with_capacity(BOUNDARIES_PER_YEAR);
        for term in [SolarTerm::DaXue, SolarTerm::DongZhi] {
            boundaries.push((term, term_instant(year - 1, term, offset_minutes)?));
        }
        for term in [SolarTerm::XiaoHan, SolarTerm::DaHan] {
            boundaries.push((term, term_instant(year, term, offset_minutes)?));
        }
        for term in &SolarTerm::ALL[..22] {
            boundaries.push((*term, term_instant(year, *term, offset_minutes)?));
        }

        if boundaries.windows(2).any(|pair| pair[0].1 >= pair[1].1) {
            return Err(CalendarError::SolarTerms {
                year,
                reason: "boundaries are not strictly increasing".to_string(),
            });
        }

        let (month_eleven_lunation, month_eleven) = month_eleven(year, offset_minutes)?;
        Ok(Self {
            year,
            boundaries,
            month_eleven,
            month_eleven_lunation,
        })
    }
}

/// Local instant at which `term` begins in Gregorian `year`.
fn term_instant(
    year: i32,
    term: SolarTerm,
    offset_minutes: i32,
) -> Result<NaiveDateTime, CalendarError> {
    let failed = |reason: &str| CalendarError::SolarTerms {
        year,
        reason: format!("{term}: {reason}"),
    };
    let (month, day) = term.approximate_date();
    let seed = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| failed("no seed date"))?;
    let guess = astronomy::ut_to_jde(astronomy::local_midnight_jd(seed, 0));
    let jde = astronomy::solve_solar_longitude(term.longitude(), guess)
        .ok_or_else(|| failed("longitude search did not converge"))?;
    astronomy::local_datetime(astronomy::jde_to_ut(jde), offset_minutes)
        .ok_or_else(|| failed("instant out of range"))
}

pub(crate) fn new_moon_day(lunation: f64, offset_minutes: i32) -> Option<NaiveDate> {
    astronomy::local_date(
        astronomy::jde_to_ut(astronomy::new_moon(lunation)),
        offset_minutes,
    )
}

/// Index of the 30° longitude sector the Sun occupies at local midnight of `date`.
pub(crate) fn solar_sector(date: NaiveDate, offset_minutes: i32) -> u32 {
    (astronomy::solar_longitude_at_midnight(date, offset_minutes) / 30.0).floor() as u32
}

/// Lunation and local start day of the month containing the winter solstice of `year`.
fn month_eleven(year: i32, offset_minutes: i32) -> Result<(f64, NaiveDate), CalendarError> {
    let missing = || CalendarError::SolarTerms {
        year,
        reason: "no new moon found before the winter solstice".to_string(),
    };
    let year_end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(missing)?;
    let mut lunation =
        astronomy::lunation_before(astronomy::local_midnight_jd(year_end, offset_minutes)) + 1.0;
    for _ in 0..4 {
        let day = new_moon_day(lunation, offset_minutes).ok_or_else(missing)?;
        if day <= year_end && solar_sector(day, offset_minutes) < 9 {
            return Ok((lunation, day));
        }
        lunation -= 1.0;
    }
    Err(missing())
}

/// Lazily computed [`YearTable`]s keyed by Gregorian year.
///
/// Each year is computed at most once, under the write lock, and shared
/// read-only afterwards. Entries are never invalidated.
#[derive(Debug)]
pub struct SolarTermCache {
    utc_offset_minutes: i32,
    tables: RwLock<HashMap<i32, Arc<YearTable>>>,
    computations: AtomicUsize,
}

impl Default for SolarTermCache {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_MINUTES)
    }
}

impl SolarTermCache {
    #[must_use]
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self {
            utc_offset_minutes,
            tables: RwLock::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    /// Table for `year`, computing it on first use.
    pub fn year(&self, year: i32) -> Result<Arc<YearTable>, CalendarError> {
        if !(CACHE_MIN_YEAR..=CACHE_MAX_YEAR).contains(&year) {
            return Err(CalendarError::DateOutOfRange {
                year,
                min: CACHE_MIN_YEAR,
                max: CACHE_MAX_YEAR,
            });
        }

        if let Some(table) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&year)
        {
            return Ok(Arc::clone(table));
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = tables.get(&year) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(YearTable::compute(year, self.utc_offset_minutes)?);
        self.computations.fetch_add(1, Ordering::Relaxed);
        debug!(
            year,
            lichun = %table.lichun(),
            month_eleven = %table.month_eleven(),
            "computed solar-term table"
        );
        tables.insert(year, Arc::clone(&table));
        Ok(table)
    }

    /// Populate every year in `years`, stopping at the first failure.
    pub fn warm(&self, years: impl IntoIterator<Item = i32>) -> Result<(), CalendarError> {
        for year in years {
            self.year(year)?;
        }
        Ok(())
    }

    /// How many year tables have been computed so far.
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        years.sort_unstable();
        years
    }
}
