//! Cyclic properties that must hold for every supported instant.

use bazi_core::SolarTerm;
use bazi_types::{Pillar, PillarKind, sixty_stem, sixty_stem_index};
use chrono::{NaiveDate, TimeDelta};

use crate::common::{at, calculator, hourly};

#[test]
fn day_pillar_repeats_every_sixty_days() {
    let calculator = calculator();
    let mut date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2100, 10, 1).unwrap();
    while date < end {
        let today = calculator.day_pillar(date).unwrap();
        let next = calculator.day_pillar(date + TimeDelta::days(1)).unwrap();
        let later = calculator.day_pillar(date + TimeDelta::days(60)).unwrap();
        assert_eq!(next, today.shift(1), "{date}");
        assert_eq!(later, today, "{date}");
        date += TimeDelta::days(97);
    }
}

#[test]
fn every_computed_pillar_has_matching_parity() {
    let calculator = calculator();
    for instant in hourly(at(1955, 1, 1, 0), 2_000, 37) {
        let pillars = calculator.four_pillars_at(instant).unwrap();
        for kind in PillarKind::ALL {
            let pair = pillars.pair(kind);
            for pillar in [pair.main, pair.minus] {
                assert_eq!(
                    pillar.stem().index() % 2,
                    pillar.branch().index() % 2,
                    "{instant} {kind:?}"
                );
            }
        }
    }
}

#[test]
fn sexagenary_index_round_trips() {
    for index in 1..=60 {
        let pillar = Pillar::from_sexagenary(index);
        assert_eq!(i64::from(pillar.sexagenary_index()), index);
        assert_eq!(sixty_stem(index), pillar.glyphs());
        assert_eq!(sixty_stem_index(&pillar.glyphs()), Some(index as u8));
    }
    assert_eq!(Pillar::from_sexagenary(0), Pillar::from_sexagenary(60));
    assert_eq!(Pillar::from_sexagenary(61), Pillar::from_sexagenary(1));
}

#[test]
fn year_pillar_advances_once_per_lichun() {
    let calculator = calculator();
    let calendar = calculator.calendar().clone();
    for year in [1901, 1950, 1984, 2000, 2024, 2099] {
        let lichun = calendar.term_instant(year, SolarTerm::LiChun).unwrap();
        let before = calculator.year_pillar(lichun - TimeDelta::minutes(1)).unwrap();
        let after = calculator.year_pillar(lichun).unwrap();
        assert_eq!(after, before.shift(1), "{year}");
        assert_eq!(after, Pillar::from_cycle_position(i64::from(year) - 4));
    }
}

#[test]
fn month_branch_follows_sectional_term() {
    let calculator = calculator();
    let calendar = calculator.calendar().clone();
    for instant in hourly(at(2023, 1, 1, 0), 400, 22) {
        let term = calendar.solar_term_at(instant).unwrap();
        let month = calculator.month_pillar(instant).unwrap();
        assert_eq!(
            u32::from(month.branch().index()),
            (term.month_number() + 1) % 12,
            "{instant} {term}"
        );
    }
}

#[test]
fn hour_twenty_three_takes_next_day_pillar() {
    let calculator = calculator();
    for day in 1..=28 {
        let date = NaiveDate::from_ymd_opt(2010, 7, day).unwrap();
        let late = calculator.four_pillars_of(date, 23).unwrap();
        let next = calculator.day_pillar(date + TimeDelta::days(1)).unwrap();
        assert_eq!(late.day(), next);
        assert_eq!(late.hour().branch().index(), 0);
    }
}

#[test]
fn chinese_new_year_dates() {
    let calendar = calculator().calendar().clone();
    for (y, m, d) in [(2024, 2, 10), (2023, 1, 22), (2000, 2, 5), (1985, 2, 20)] {
        let lunar = calendar.to_lunar(y, m, d).unwrap();
        assert_eq!((lunar.year, lunar.month, lunar.day), (y, 1, 1), "{y}-{m}-{d}");
        assert!(!lunar.is_leap_month);
    }
}

#[test]
fn leap_fourth_month_of_2020() {
    let calendar = calculator().calendar().clone();
    let lunar = calendar.to_lunar(2020, 5, 23).unwrap();
    assert_eq!((lunar.month, lunar.day, lunar.is_leap_month), (4, 1, true));
    let before = calendar.to_lunar(2020, 5, 22).unwrap();
    assert_eq!((before.month, before.is_leap_month), (4, false));
}
