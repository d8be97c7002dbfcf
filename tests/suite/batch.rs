//! Batch enrichment end to end.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use bazi_engine::{BatchControl, WorkerConfig};
use bazi_types::{LifeCycleStage, PillarSlot};
use chrono::NaiveDateTime;

use crate::common::{at, enricher, hourly, reference};

#[test]
fn every_timestamp_yields_one_row() {
    let enricher = enricher();
    let base = enricher.base_pillars(reference()).unwrap();
    let input = hourly(at(2023, 12, 20, 0), 1_000, 2);
    let (table, report) = enricher
        .enrich(&input, &base, &WorkerConfig::default().with_max_workers(8))
        .unwrap();

    assert_eq!(table.len(), input.len());
    assert_eq!(report.total, input.len());
    assert_eq!((report.errors, report.skipped), (0, 0));
    let seen: HashSet<NaiveDateTime> = table.timestamps().collect();
    assert_eq!(seen, input.iter().copied().collect());
    assert_eq!(table.base(), &base);
}

#[test]
fn column_layout_is_fixed() {
    let enricher = enricher();
    let base = enricher.base_pillars(reference()).unwrap();
    let (table, _) = enricher
        .enrich(&[at(2024, 3, 1, 8)], &base, &WorkerConfig::default())
        .unwrap();

    let slots = PillarSlot::ALL.len();
    assert_eq!(table.life_cycle_columns().len(), slots * slots);
    assert_eq!(table.relation_columns().len(), 39);
    assert_eq!(table.life_cycle_columns()[0], "cs_hour_hour");
    assert_eq!(table.relation_columns()[0], "six_combine_子丑");

    let plain = table.columns(false);
    let encoded = table.columns(true);
    assert_eq!(encoded.len(), plain.len() + slots * slots);
    let row = table.rows().next().unwrap();
    assert_eq!(table.cells(row, true).len(), encoded.len());
}

#[test]
fn reference_against_itself_doubles_every_branch() {
    // Slot branches 巳 卯 戌 亥 酉 辰 each appear once on either side, so
    // their self-punishments fire and 午午 does not.
    let enricher = enricher();
    let base = enricher.base_pillars(reference()).unwrap();
    let row = enricher.enrich_row(reference(), &base).unwrap();
    let flag = |name: &str| {
        row.relations
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, flag)| *flag)
            .unwrap()
    };
    assert_eq!(flag("punishment_酉酉"), 1);
    assert_eq!(flag("punishment_亥亥"), 1);
    assert_eq!(flag("punishment_辰辰"), 1);
    assert_eq!(flag("punishment_午午"), 0);
    assert_eq!(flag("clash_卯酉"), 1);
    assert_eq!(flag("clash_子午"), 0);
    assert!(row.life_cycle.iter().all(|(_, stage)| !stage.is_empty()));
}

#[test]
fn out_of_epoch_rows_are_defaulted() {
    let enricher = enricher();
    let base = enricher.base_pillars(reference()).unwrap();
    let input = vec![at(1899, 6, 1, 0), at(2024, 6, 1, 0), at(2101, 1, 1, 0)];
    let (table, report) = enricher
        .enrich(&input, &base, &WorkerConfig::default())
        .unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(report.errors, 2);
    let early = table.get(&at(1899, 6, 1, 0)).unwrap();
    assert!(early.is_defaulted());
    assert!(early.life_cycle.iter().all(|(_, s)| *s == LifeCycleStage::Empty));
    assert!(early.relations.iter().all(|(_, f)| *f == 0));
}

#[test]
fn concurrent_batches_compute_each_year_once() {
    let enricher = Arc::new(enricher());
    let base = enricher.base_pillars(reference()).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let enricher = Arc::clone(&enricher);
            thread::spawn(move || {
                let input = hourly(at(2010, 1, 1, 0), 300, 97);
                enricher
                    .enrich(&input, &base, &WorkerConfig::default().with_max_workers(4))
                    .unwrap()
                    .1
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().errors, 0);
    }
    let cache = enricher.calculator().calendar().cache();
    assert_eq!(cache.computations(), cache.cached_years().len());
}

#[test]
fn progress_reaches_total_and_cancel_is_observed() {
    let enricher = enricher();
    let base = enricher.base_pillars(reference()).unwrap();
    let input = hourly(at(2024, 1, 1, 0), 120, 1);

    let control = BatchControl::new();
    let (_, report) = enricher
        .enrich_with_control(&input, &base, &WorkerConfig::default(), &control)
        .unwrap();
    assert_eq!(control.progress(), 120);
    assert!(!report.cancelled);

    let cancelled = BatchControl::new();
    cancelled.cancel();
    let (table, report) = enricher
        .enrich_with_control(&input, &base, &WorkerConfig::default(), &cancelled)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(table.len() + report.skipped, report.total);
}
