//! The reference (date + hour) and timestamp paths agree, and both hit known anchors.

use bazi_types::Pillar;
use chrono::{NaiveDate, Timelike};

use crate::common::{at, calculator, hourly, reference};

fn p(glyphs: &str) -> Pillar {
    Pillar::parse(glyphs).unwrap()
}

#[test]
fn reference_instant_matches_known_chart() {
    let calculator = calculator();
    let pillars = calculator.four_pillars_at(reference()).unwrap();
    assert_eq!(pillars.to_string(), "己酉 乙亥 癸卯 丁巳");

    let date = NaiveDate::from_ymd_opt(1969, 11, 24).unwrap();
    assert_eq!(calculator.four_pillars_of(date, 9).unwrap(), pillars);
}

#[test]
fn both_paths_agree_on_the_hour() {
    let calculator = calculator();
    for instant in hourly(at(1999, 12, 25, 0), 600, 5) {
        let by_instant = calculator.four_pillars_at(instant).unwrap();
        let by_hour = calculator
            .four_pillars_of(instant.date(), instant.hour())
            .unwrap();
        assert_eq!(by_instant, by_hour, "{instant}");
    }
}

#[test]
fn calendar_anchors() {
    let calculator = calculator();
    let day = |y, m, d| {
        calculator
            .day_pillar(NaiveDate::from_ymd_opt(y, m, d).unwrap())
            .unwrap()
    };
    assert_eq!(day(2000, 1, 1), p("戊午"));
    assert_eq!(day(2024, 1, 1), p("甲子"));
    assert_eq!(day(1900, 1, 1), p("甲戌"));
    assert_eq!(calculator.year_pillar(at(1984, 6, 1, 12)).unwrap(), p("甲子"));
    assert_eq!(calculator.year_pillar(at(1984, 1, 15, 12)).unwrap(), p("癸亥"));
}

#[test]
fn minus_pillars_shift_every_kind_by_five() {
    let pillars = calculator().four_pillars_at(reference()).unwrap();
    let rendered: Vec<(String, String)> = pillars
        .columns()
        .map(|(name, pillar)| (name, pillar.glyphs()))
        .collect();
    assert!(rendered.contains(&("year_pillar_minus".to_string(), "甲寅".to_string())));
    assert!(rendered.contains(&("month_pillar_minus".to_string(), "庚辰".to_string())));
    assert!(rendered.contains(&("day_pillar_minus".to_string(), "戊申".to_string())));
    assert!(rendered.contains(&("hour_pillar_minus".to_string(), "壬戌".to_string())));
}
