//! Parallel enrichment of a timestamp sequence.
//!
//! Rows are computed independently on a bounded rayon pool and merged into
//! an [`EnrichmentTable`] by a single thread afterwards, so no lock is held
//! while a row is computed. The solar-term cache is the only shared state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use chrono::{Datelike, NaiveDateTime};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use bazi_core::{
    CalendarConverter, CalendarError, LifeCycleMapper, MAX_YEAR, MIN_YEAR, PillarCalculator,
    PillarError, RelationMatcher,
};
use bazi_types::{FourPillars, TableIntegrityError};

use crate::config::WorkerConfig;
use crate::row::EnrichmentRow;
use crate::table::EnrichmentTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {timestamp}: {source}")]
pub struct RowComputationError {
    pub timestamp: NaiveDateTime,
    #[source]
    pub source: PillarError,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("solar-term table unavailable: {0}")]
    SolarTermCache(#[source] CalendarError),
    #[error("worker pool could not be built: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Table(#[from] TableIntegrityError),
    #[error(transparent)]
    Pillar(#[from] PillarError),
}

/// Cancellation flag and progress counter shared with a running batch.
#[derive(Debug, Default)]
pub struct BatchControl {
    cancelled: AtomicBool,
    completed: AtomicUsize,
}

impl BatchControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop dispatching further rows. Rows already being computed finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Rows completed so far, successful or defaulted.
    #[must_use]
    pub fn progress(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    fn record(&self, rows: usize) {
        self.completed.fetch_add(rows, Ordering::Relaxed);
    }
}

/// Summary returned with every batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub errors: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub workers: usize,
    pub elapsed_ms: u64,
}

enum Outcome {
    Computed(EnrichmentRow, usize),
    Failed(EnrichmentRow, usize),
    Skipped(usize),
}

/// Computes pillar, life-cycle and relation features for timestamps.
#[derive(Debug, Clone)]
pub struct BatchEnricher {
    calculator: PillarCalculator,
    mapper: LifeCycleMapper,
    matcher: RelationMatcher,
    life_cycle_columns: Vec<String>,
    relation_columns: Vec<String>,
}

impl BatchEnricher {
    pub fn new(calendar: CalendarConverter) -> Result<Self, BatchError> {
        let calculator = PillarCalculator::new(calendar)?;
        let mapper = LifeCycleMapper::new()?;
        let matcher = RelationMatcher::new()?;
        let life_cycle_columns = bazi_types::PillarSlot::ALL
            .iter()
            .flat_map(|&base| {
                bazi_types::PillarSlot::ALL
                    .iter()
                    .map(move |&current| bazi_core::life_cycle_column(base, current))
            })
            .collect();
        let relation_columns = matcher.column_names().collect();
        Ok(Self {
            calculator,
            mapper,
            matcher,
            life_cycle_columns,
            relation_columns,
        })
    }

    #[must_use]
    pub fn calculator(&self) -> &PillarCalculator {
        &self.calculator
    }

    /// Pillars of the entity's reference instant, computed once per batch.
    pub fn base_pillars(&self, reference: NaiveDateTime) -> Result<FourPillars, BatchError> {
        Ok(self.calculator.four_pillars_at(reference)?)
    }

    /// Features for a single timestamp.
    pub fn enrich_row(
        &self,
        timestamp: NaiveDateTime,
        base: &FourPillars,
    ) -> Result<EnrichmentRow, RowComputationError> {
        let wrap = |source: PillarError| RowComputationError { timestamp, source };
        let current = self.calculator.four_pillars_at(timestamp).map_err(wrap)?;
        let lunar = self
            .calculator
            .calendar()
            .lunar_of(timestamp.date())
            .map_err(|err| wrap(err.into()))?;
        Ok(EnrichmentRow {
            timestamp,
            current: Some(current),
            lunar: Some(lunar),
            life_cycle: self.mapper.matrix(base, &current),
            relations: self.matcher.evaluate_row(base, &current),
        })
    }

    pub fn enrich(
        &self,
        timestamps: &[NaiveDateTime],
        base: &FourPillars,
        config: &WorkerConfig,
    ) -> Result<(EnrichmentTable, BatchReport), BatchError> {
        self.enrich_with_control(timestamps, base, config, &BatchControl::new())
    }

    /// Enrich `timestamps` on a bounded pool.
    ///
    /// Every input timestamp yields exactly one table row unless the batch is
    /// cancelled or runs past its deadline, in which case undispatched
    /// timestamps are reported as `skipped`. A row that fails is replaced by a
    /// defaulted row and counted in `errors`.
    pub fn enrich_with_control(
        &self,
        timestamps: &[NaiveDateTime],
        base: &FourPillars,
        config: &WorkerConfig,
        control: &BatchControl,
    ) -> Result<(EnrichmentTable, BatchReport), BatchError> {
        let started = Instant::now();
        let deadline = config.deadline.map(|limit| started + limit);

        let mut occurrences: BTreeMap<NaiveDateTime, usize> = BTreeMap::new();
        for timestamp in timestamps {
            *occurrences.entry(*timestamp).or_default() += 1;
        }
        let unique: Vec<(NaiveDateTime, usize)> = occurrences.into_iter().collect();

        self.warm_cache(&unique)?;

        let workers = config.pool_size();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bazi-enrich-{i}"))
            .build()?;
        info!(
            total = timestamps.len(),
            distinct = unique.len(),
            workers,
            "enrichment started"
        );

        let outcomes: Vec<Outcome> = pool.install(|| {
            unique
                .par_iter()
                .map(|&(timestamp, count)| {
                    if deadline.is_some_and(|limit| Instant::now() >= limit) {
                        control.cancel();
                    }
                    if control.is_cancelled() {
                        return Outcome::Skipped(count);
                    }
                    let outcome = match self.enrich_row(timestamp, base) {
                        Ok(row) => Outcome::Computed(row, count),
                        Err(err) => {
                            warn!(%timestamp, error = %err, "row replaced with defaults");
                            Outcome::Failed(
                                EnrichmentRow::defaulted(
                                    timestamp,
                                    &self.life_cycle_columns,
                                    &self.relation_columns,
                                ),
                                count,
                            )
                        }
                    };
                    control.record(count);
                    outcome
                })
                .collect()
        });

        let mut table = EnrichmentTable::new(
            *base,
            self.life_cycle_columns.clone(),
            self.relation_columns.clone(),
        );
        let mut errors = 0;
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                Outcome::Computed(row, count) => table.insert(row, count),
                Outcome::Failed(row, count) => {
                    errors += count;
                    table.insert(row, count);
                }
                Outcome::Skipped(count) => skipped += count,
            }
        }

        let report = BatchReport {
            total: timestamps.len(),
            errors,
            skipped,
            cancelled: control.is_cancelled(),
            workers,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            total = report.total,
            errors = report.errors,
            skipped = report.skipped,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms,
            "enrichment finished"
        );
        Ok((table, report))
    }

    /// Populate the solar-term tables every in-range row will read.
    fn warm_cache(&self, unique: &[(NaiveDateTime, usize)]) -> Result<(), BatchError> {
        let years: BTreeSet<i32> = unique
            .iter()
            .map(|(timestamp, _)| timestamp.year())
            .filter(|year| (MIN_YEAR..=MAX_YEAR).contains(year))
            .flat_map(|year| [year - 1, year, year + 1])
            .collect();
        debug!(years = years.len(), "warming solar-term cache");
        self.calculator
            .calendar()
            .cache()
            .warm(years)
            .map_err(BatchError::SolarTermCache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use std::collections::HashSet;
    use std::time::Duration;

    fn enricher() -> BatchEnricher {
        BatchEnricher::new(CalendarConverter::default()).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn series(start: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
        (0..count)
            .map(|i| start + TimeDelta::hours(2 * i as i64))
            .collect()
    }

    #[test]
    fn thousand_rows_on_eight_workers() {
        let enricher = enricher();
        let base = enricher.base_pillars(at(1969, 11, 24, 9)).unwrap();
        let input = series(at(2024, 1, 1, 0), 1000);
        let config = WorkerConfig::default().with_max_workers(8);
        let (table, report) = enricher.enrich(&input, &base, &config).unwrap();

        assert_eq!(table.len(), 1000);
        assert_eq!(report.total, 1000);
        assert_eq!(report.errors, 0);
        assert_eq!(report.skipped, 0);
        assert!(!report.cancelled);
        let expected: HashSet<NaiveDateTime> = input.iter().copied().collect();
        let actual: HashSet<NaiveDateTime> = table.timestamps().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn failed_rows_are_defaulted_not_dropped() {
        let enricher = enricher();
        let base = enricher.base_pillars(at(1969, 11, 24, 9)).unwrap();
        let input = vec![at(2024, 5, 1, 10), at(2150, 1, 1, 0), at(1850, 6, 1, 12)];
        let (table, report) = enricher
            .enrich(&input, &base, &WorkerConfig::default())
            .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(report.errors, 2);
        assert!(table.get(&at(2150, 1, 1, 0)).unwrap().is_defaulted());
        assert!(!table.get(&at(2024, 5, 1, 10)).unwrap().is_defaulted());
    }

    #[test]
    fn duplicate_timestamps_keep_row_count() {
        let enricher = enricher();
        let base = enricher.base_pillars(at(1969, 11, 24, 9)).unwrap();
        let ts = at(2024, 2, 10, 12);
        let input = vec![ts, ts, ts, at(2024, 2, 11, 12)];
        let control = BatchControl::new();
        let (table, report) = enricher
            .enrich_with_control(&input, &base, &WorkerConfig::default(), &control)
            .unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.distinct_len(), 2);
        assert_eq!(report.total, 4);
        assert_eq!(control.progress(), 4);
    }

    #[test]
    fn cancelled_batch_skips_everything_undispatched() {
        let enricher = enricher();
        let base = enricher.base_pillars(at(1969, 11, 24, 9)).unwrap();
        let input = series(at(2024, 1, 1, 0), 50);
        let control = BatchControl::new();
        control.cancel();
        let (table, report) = enricher
            .enrich_with_control(&input, &base, &WorkerConfig::default(), &control)
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.skipped, 50);
        assert!(table.is_empty());
        assert_eq!(table.len() + report.skipped, report.total);
    }

    #[test]
    fn expired_deadline_stops_dispatch() {
        let enricher = enricher();
        let base = enricher.base_pillars(at(1969, 11, 24, 9)).unwrap();
        let input = series(at(2024, 1, 1, 0), 20);
        let config = WorkerConfig::default().with_deadline(Duration::ZERO);
        let (table, report) = enricher.enrich(&input, &base, &config).unwrap();
        assert!(report.cancelled);
        assert_eq!(table.len() + report.skipped, report.total);
    }

    #[test]
    fn rows_match_single_row_computation() {
        let enricher = enricher();
        let base = enricher.base_pillars(at(1969, 11, 24, 9)).unwrap();
        let input = series(at(2023, 12, 30, 0), 40);
        let (table, _) = enricher
            .enrich(&input, &base, &WorkerConfig::default().with_max_workers(4))
            .unwrap();
        for ts in &input {
            assert_eq!(
                table.get(ts).unwrap(),
                &enricher.enrich_row(*ts, &base).unwrap()
            );
        }
    }
}
