use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the twelve life-cycle stages (長生十二宮), or `Empty` when a
/// stem/branch combination has no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifeCycleStage {
    #[default]
    Empty,
    Birth,
    Bath,
    Crown,
    Office,
    Peak,
    Decline,
    Sickness,
    Death,
    Tomb,
    Extinction,
    Conception,
    Nurture,
}

impl LifeCycleStage {
    /// The twelve stages in cycle order (code 1 first).
    pub const CYCLE: [Self; 12] = [
        Self::Birth,
        Self::Bath,
        Self::Crown,
        Self::Office,
        Self::Peak,
        Self::Decline,
        Self::Sickness,
        Self::Death,
        Self::Tomb,
        Self::Extinction,
        Self::Conception,
        Self::Nurture,
    ];

    #[must_use]
    pub const fn glyphs(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Birth => "長生",
            Self::Bath => "沐浴",
            Self::Crown => "冠帶",
            Self::Office => "臨官",
            Self::Peak => "帝旺",
            Self::Decline => "衰",
            Self::Sickness => "病",
            Self::Death => "死",
            Self::Tomb => "墓庫",
            Self::Extinction => "絕",
            Self::Conception => "胎",
            Self::Nurture => "養",
        }
    }

    /// Categorical code: 1..=12 in cycle order, 0 for `Empty`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Birth => 1,
            Self::Bath => 2,
            Self::Crown => 3,
            Self::Office => 4,
            Self::Peak => 5,
            Self::Decline => 6,
            Self::Sickness => 7,
            Self::Death => 8,
            Self::Tomb => 9,
            Self::Extinction => 10,
            Self::Conception => 11,
            Self::Nurture => 12,
        }
    }

    #[must_use]
    pub fn from_glyphs(raw: &str) -> Option<Self> {
        Self::CYCLE.into_iter().find(|stage| stage.glyphs() == raw)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

impl fmt::Display for LifeCycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyphs())
    }
}
