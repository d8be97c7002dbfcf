//! Cyclic indices for the Heavenly Stems (mod 10) and Earthly Branches (mod 12).
//!
//! Both types store a canonical index where 0 is the first member of the
//! cycle (甲 and 子). Any integer can be turned into a member by reducing it
//! modulo the cycle length, so arithmetic never needs a special "zero" symbol.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const STEM_GLYPHS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];

const BRANCH_GLYPHS: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

/// A raw index outside its cycle, rejected when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CycleIndexError {
    #[error("stem index {0} is out of range 0..10")]
    Stem(u8),
    #[error("branch index {0} is out of range 0..12")]
    Branch(u8),
}

/// One of the ten Heavenly Stems (天干).
///
/// Serialized as its index; decoding rejects indices past 癸.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeavenlyStem(u8);

impl HeavenlyStem {
    pub const COUNT: u8 = 10;

    pub const JIA: Self = Self(0);
    pub const YI: Self = Self(1);
    pub const BING: Self = Self(2);
    pub const DING: Self = Self(3);
    pub const WU: Self = Self(4);
    pub const JI: Self = Self(5);
    pub const GENG: Self = Self(6);
    pub const XIN: Self = Self(7);
    pub const REN: Self = Self(8);
    pub const GUI: Self = Self(9);

    /// Reduce any integer onto the stem cycle.
    #[must_use]
    pub const fn new(index: i64) -> Self {
        Self(index.rem_euclid(Self::COUNT as i64) as u8)
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn glyph(self) -> char {
        STEM_GLYPHS[self.0 as usize]
    }

    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        STEM_GLYPHS
            .iter()
            .position(|&g| g == glyph)
            .map(|i| Self(i as u8))
    }

    /// Yang stems sit at even indices (甲, 丙, 戊, 庚, 壬).
    #[must_use]
    pub const fn is_yang(self) -> bool {
        self.0 % 2 == 0
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }
}

impl Add<i64> for HeavenlyStem {
    type Output = Self;

    fn add(self, rhs: i64) -> Self {
        Self::new(i64::from(self.0) + rhs)
    }
}

impl Sub<i64> for HeavenlyStem {
    type Output = Self;

    fn sub(self, rhs: i64) -> Self {
        Self::new(i64::from(self.0) - rhs)
    }
}

impl TryFrom<u8> for HeavenlyStem {
    type Error = CycleIndexError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index < Self::COUNT {
            Ok(Self(index))
        } else {
            Err(CycleIndexError::Stem(index))
        }
    }
}

impl From<HeavenlyStem> for u8 {
    fn from(stem: HeavenlyStem) -> Self {
        stem.0
    }
}

impl fmt::Display for HeavenlyStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// One of the twelve Earthly Branches (地支).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EarthlyBranch(u8);

impl EarthlyBranch {
    pub const COUNT: u8 = 12;

    pub const ZI: Self = Self(0);
    pub const CHOU: Self = Self(1);
    pub const YIN: Self = Self(2);
    pub const MAO: Self = Self(3);
    pub const CHEN: Self = Self(4);
    pub const SI: Self = Self(5);
    pub const WU: Self = Self(6);
    pub const WEI: Self = Self(7);
    pub const SHEN: Self = Self(8);
    pub const YOU: Self = Self(9);
    pub const XU: Self = Self(10);
    pub const HAI: Self = Self(11);

    /// Reduce any integer onto the branch cycle.
    #[must_use]
    pub const fn new(index: i64) -> Self {
        Self(index.rem_euclid(Self::COUNT as i64) as u8)
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn glyph(self) -> char {
        BRANCH_GLYPHS[self.0 as usize]
    }

    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        BRANCH_GLYPHS
            .iter()
            .position(|&g| g == glyph)
            .map(|i| Self(i as u8))
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }
}

impl Add<i64> for EarthlyBranch {
    type Output = Self;

    fn add(self, rhs: i64) -> Self {
        Self::new(i64::from(self.0) + rhs)
    }
}

impl Sub<i64> for EarthlyBranch {
    type Output = Self;

    fn sub(self, rhs: i64) -> Self {
        Self::new(i64::from(self.0) - rhs)
    }
}

impl TryFrom<u8> for EarthlyBranch {
    type Error = CycleIndexError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index < Self::COUNT {
            Ok(Self(index))
        } else {
            Err(CycleIndexError::Branch(index))
        }
    }
}

impl From<EarthlyBranch> for u8 {
    fn from(branch: EarthlyBranch) -> Self {
        branch.0
    }
}

impl fmt::Display for EarthlyBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
