//! The four pillars of one instant and the slot layout used for feature columns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pillar::Pillar;

/// Which of the four pillars a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarKind {
    Year,
    Month,
    Day,
    Hour,
}

impl PillarKind {
    pub const ALL: [Self; 4] = [Self::Year, Self::Month, Self::Day, Self::Hour];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }

    /// Sexagenary shift from a pillar to its companion "minus" pillar.
    #[must_use]
    pub const fn minus_offset(self) -> i64 {
        MINUS_OFFSETS[self as usize]
    }
}

/// Shift applied to every pillar kind, in [`PillarKind::ALL`] order.
pub const MINUS_OFFSETS: [i64; 4] = [5, 5, 5, 5];

/// A pillar together with its minus companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PillarPair {
    pub main: Pillar,
    pub minus: Pillar,
}

impl PillarPair {
    #[must_use]
    pub fn derive(kind: PillarKind, main: Pillar) -> Self {
        Self {
            main,
            minus: main.shift(kind.minus_offset()),
        }
    }
}

/// Year, month, day and hour pillars plus their minus variants.
///
/// Built once by the calculator and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FourPillars {
    year: PillarPair,
    month: PillarPair,
    day: PillarPair,
    hour: PillarPair,
}

impl FourPillars {
    #[must_use]
    pub fn new(year: Pillar, month: Pillar, day: Pillar, hour: Pillar) -> Self {
        Self {
            year: PillarPair::derive(PillarKind::Year, year),
            month: PillarPair::derive(PillarKind::Month, month),
            day: PillarPair::derive(PillarKind::Day, day),
            hour: PillarPair::derive(PillarKind::Hour, hour),
        }
    }

    #[must_use]
    pub const fn pair(&self, kind: PillarKind) -> PillarPair {
        match kind {
            PillarKind::Year => self.year,
            PillarKind::Month => self.month,
            PillarKind::Day => self.day,
            PillarKind::Hour => self.hour,
        }
    }

    #[must_use]
    pub const fn year(&self) -> Pillar {
        self.year.main
    }

    #[must_use]
    pub const fn month(&self) -> Pillar {
        self.month.main
    }

    #[must_use]
    pub const fn day(&self) -> Pillar {
        self.day.main
    }

    #[must_use]
    pub const fn hour(&self) -> Pillar {
        self.hour.main
    }

    #[must_use]
    pub const fn slot(&self, slot: PillarSlot) -> Pillar {
        match slot {
            PillarSlot::Hour => self.hour.main,
            PillarSlot::Day => self.day.main,
            PillarSlot::HourMinus => self.hour.minus,
            PillarSlot::Month => self.month.main,
            PillarSlot::Year => self.year.main,
            PillarSlot::MonthMinus => self.month.minus,
        }
    }

    /// The six slot pillars in [`PillarSlot::ALL`] order.
    #[must_use]
    pub fn slots(&self) -> [Pillar; 6] {
        PillarSlot::ALL.map(|slot| self.slot(slot))
    }

    /// `(column suffix, pillar)` for all eight pillars, year first, main before minus.
    pub fn columns(&self) -> impl Iterator<Item = (String, Pillar)> + '_ {
        PillarKind::ALL.into_iter().flat_map(move |kind| {
            let pair = self.pair(kind);
            [
                (format!("{}_pillar", kind.name()), pair.main),
                (format!("{}_pillar_minus", kind.name()), pair.minus),
            ]
        })
    }
}

impl fmt::Display for FourPillars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.year.main, self.month.main, self.day.main, self.hour.main
        )
    }
}

/// The six pillar positions that feed the life-cycle matrix and relation histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarSlot {
    Hour,
    Day,
    HourMinus,
    Month,
    Year,
    MonthMinus,
}

impl PillarSlot {
    pub const ALL: [Self; 6] = [
        Self::Hour,
        Self::Day,
        Self::HourMinus,
        Self::Month,
        Self::Year,
        Self::MonthMinus,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::HourMinus => "hour_minus",
            Self::Month => "month",
            Self::Year => "year",
            Self::MonthMinus => "month_minus",
        }
    }
}

impl fmt::Display for PillarSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
