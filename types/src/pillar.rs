//! Stem/branch pairs and the sixty-term cycle (六十甲子).

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cycle::{EarthlyBranch, HeavenlyStem};

/// The sixty-term cycle, 甲子 first. Position `i` holds sexagenary index `i + 1`.
pub const SEXAGENARY_TABLE: [&str; 60] = [
    "甲子", "乙丑", "丙寅", "丁卯", "戊辰", "己巳", "庚午", "辛未", "壬申", "癸酉", //
    "甲戌", "乙亥", "丙子", "丁丑", "戊寅", "己卯", "庚辰", "辛巳", "壬午", "癸未", //
    "甲申", "乙酉", "丙戌", "丁亥", "戊子", "己丑", "庚寅", "辛卯", "壬辰", "癸巳", //
    "甲午", "乙未", "丙申", "丁酉", "戊戌", "己亥", "庚子", "辛丑", "壬寅", "癸卯", //
    "甲辰", "乙巳", "丙午", "丁未", "戊申", "己酉", "庚戌", "辛亥", "壬子", "癸丑", //
    "甲寅", "乙卯", "丙辰", "丁巳", "戊午", "己未", "庚申", "辛酉", "壬戌", "癸亥", //
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PillarError {
    #[error("{stem}{branch} is not a member of the sixty-term cycle")]
    Parity {
        stem: HeavenlyStem,
        branch: EarthlyBranch,
    },
    #[error("'{0}' is not a stem/branch pair")]
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableIntegrityError {
    #[error("{table} table has {actual} entries, expected {expected}")]
    EntryCount {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{table} table entry '{entry}' is malformed")]
    Malformed { table: &'static str, entry: String },
    #[error("{table} table covers '{entry}' more than once")]
    Duplicate { table: &'static str, entry: String },
    #[error("{table} table entry '{entry}' is out of cycle order")]
    OutOfOrder { table: &'static str, entry: String },
}

/// A (stem, branch) pair whose indices share parity.
///
/// Serialises as its two-glyph string, e.g. `"甲子"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pillar {
    stem: HeavenlyStem,
    branch: EarthlyBranch,
}

impl Pillar {
    pub fn new(stem: HeavenlyStem, branch: EarthlyBranch) -> Result<Self, PillarError> {
        if (i64::from(branch.index()) - i64::from(stem.index())).rem_euclid(2) != 0 {
            return Err(PillarError::Parity { stem, branch });
        }
        Ok(Self { stem, branch })
    }

    /// Pillar at a zero-based position of the sixty-term cycle (0 = 甲子).
    ///
    /// Any integer is accepted and reduced mod 60. Both components are derived
    /// from the same position, so parity holds by construction.
    #[must_use]
    pub fn from_cycle_position(position: i64) -> Self {
        let position = position.rem_euclid(60);
        Self {
            stem: HeavenlyStem::new(position),
            branch: EarthlyBranch::new(position),
        }
    }

    /// Pillar for a one-based sexagenary index. `0` and multiples of 60 map to 癸亥.
    #[must_use]
    pub fn from_sexagenary(index: i64) -> Self {
        Self::from_cycle_position(index - 1)
    }

    #[must_use]
    pub const fn stem(self) -> HeavenlyStem {
        self.stem
    }

    #[must_use]
    pub const fn branch(self) -> EarthlyBranch {
        self.branch
    }

    /// Zero-based position in the sixty-term cycle.
    #[must_use]
    pub fn cycle_position(self) -> u8 {
        // p = stem + 10k with 10k ≡ branch - stem (mod 12); 5 is its own inverse mod 6.
        let stem = i64::from(self.stem.index());
        let branch = i64::from(self.branch.index());
        let half_gap = (branch - stem).rem_euclid(12) / 2;
        (stem + 10 * ((5 * half_gap) % 6)) as u8
    }

    /// One-based sexagenary index (甲子 = 1, 癸亥 = 60).
    #[must_use]
    pub fn sexagenary_index(self) -> u8 {
        self.cycle_position() + 1
    }

    /// Move `steps` positions along the sixty-term cycle.
    #[must_use]
    pub fn shift(self, steps: i64) -> Self {
        Self::from_cycle_position(i64::from(self.cycle_position()) + steps)
    }

    #[must_use]
    pub fn glyphs(self) -> String {
        let mut out = String::with_capacity(6);
        out.push(self.stem.glyph());
        out.push(self.branch.glyph());
        out
    }

    pub fn parse(raw: &str) -> Result<Self, PillarError> {
        let mut chars = raw.trim().chars();
        let (Some(s), Some(b), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(PillarError::Unparseable(raw.to_string()));
        };
        let stem =
            HeavenlyStem::from_glyph(s).ok_or_else(|| PillarError::Unparseable(raw.to_string()))?;
        let branch =
            EarthlyBranch::from_glyph(b).ok_or_else(|| PillarError::Unparseable(raw.to_string()))?;
        Self::new(stem, branch)
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem.glyph(), self.branch.glyph())
    }
}

impl TryFrom<String> for Pillar {
    type Error = PillarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pillar> for String {
    fn from(value: Pillar) -> Self {
        value.glyphs()
    }
}

/// Pillar for a one-based sexagenary index, read from [`SEXAGENARY_TABLE`].
#[must_use]
pub fn sixty_stem(index: i64) -> &'static str {
    SEXAGENARY_TABLE[(index - 1).rem_euclid(60) as usize]
}

/// One-based index of a two-glyph pillar in [`SEXAGENARY_TABLE`].
#[must_use]
pub fn sixty_stem_index(glyphs: &str) -> Option<u8> {
    SEXAGENARY_TABLE
        .iter()
        .position(|&entry| entry == glyphs)
        .map(|i| i as u8 + 1)
}

/// Check that the literal sixty-term table is a bijection onto the
/// parity-valid stem/branch pairs and lists them in cycle order.
///
/// The result is computed once per process.
pub fn verify_sexagenary_table() -> Result<(), TableIntegrityError> {
    static VERIFIED: OnceLock<Result<(), TableIntegrityError>> = OnceLock::new();
    VERIFIED
        .get_or_init(|| check_sexagenary(&SEXAGENARY_TABLE))
        .clone()
}

fn check_sexagenary(table: &[&str]) -> Result<(), TableIntegrityError> {
    const NAME: &str = "sexagenary";
    if table.len() != 60 {
        return Err(TableIntegrityError::EntryCount {
            table: NAME,
            expected: 60,
            actual: table.len(),
        });
    }

    let mut seen = [false; 60];
    for (position, entry) in table.iter().enumerate() {
        let pillar = Pillar::parse(entry).map_err(|_| TableIntegrityError::Malformed {
            table: NAME,
            entry: (*entry).to_string(),
        })?;
        let at = pillar.cycle_position() as usize;
        if seen[at] {
            return Err(TableIntegrityError::Duplicate {
                table: NAME,
                entry: (*entry).to_string(),
            });
        }
        seen[at] = true;
        if at != position {
            return Err(TableIntegrityError::OutOfOrder {
                table: NAME,
                entry: (*entry).to_string(),
            });
        }
    }
    Ok(())
}
