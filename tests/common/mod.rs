//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bazi_core::{CalendarConverter, PillarCalculator, SolarTermCache};
use bazi_engine::BatchEnricher;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Reference instant used throughout: 己酉 乙亥 癸卯 丁巳.
pub const REFERENCE: (i32, u32, u32, u32) = (1969, 11, 24, 9);

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn reference() -> NaiveDateTime {
    let (y, m, d, h) = REFERENCE;
    at(y, m, d, h)
}

/// A converter with its own cache, so cache counters are not shared between tests.
pub fn fresh_calendar() -> CalendarConverter {
    CalendarConverter::new(Arc::new(SolarTermCache::default()))
}

pub fn calculator() -> PillarCalculator {
    PillarCalculator::new(fresh_calendar()).unwrap()
}

pub fn enricher() -> BatchEnricher {
    BatchEnricher::new(fresh_calendar()).unwrap()
}

/// `count` timestamps spaced `step_hours` apart.
pub fn hourly(start: NaiveDateTime, count: usize, step_hours: i64) -> Vec<NaiveDateTime> {
    (0..count)
        .map(|i| start + TimeDelta::hours(step_hours * i as i64))
        .collect()
}
