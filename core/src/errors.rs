//! Error types for calendar conversion and pillar calculation.

use thiserror::Error;

use bazi_types::TableIntegrityError;

/// Earliest Gregorian year the calendar supports.
pub const MIN_YEAR: i32 = 1900;
/// Latest Gregorian year the calendar supports.
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("year {year} is outside the supported range {min}..={max}")]
    DateOutOfRange { year: i32, min: i32, max: i32 },
    #[error("{year:04}-{month:02}-{day:02} is not a valid Gregorian date")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("solar terms for {year} could not be computed: {reason}")]
    SolarTerms { year: i32, reason: String },
}

impl CalendarError {
    pub(crate) fn out_of_range(year: i32) -> Self {
        Self::DateOutOfRange {
            year,
            min: MIN_YEAR,
            max: MAX_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PillarError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("hour {hour} is outside 0..=23")]
    InvalidHour { hour: u32 },
    #[error(transparent)]
    Pillar(#[from] bazi_types::PillarError),
    #[error(transparent)]
    Table(#[from] TableIntegrityError),
}

/// Check that `year` lies in the supported epoch.
pub(crate) fn ensure_supported(year: i32) -> Result<(), CalendarError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(CalendarError::out_of_range(year))
    }
}
