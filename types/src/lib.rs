//! Core domain types for the four-pillar calendar.
//!
//! Pure values with no IO and no threads: cyclic stem/branch indices, pillars
//! and the sixty-term cycle, the four pillars of an instant, life-cycle stages
//! and lunisolar dates.

mod cycle;
mod four_pillars;
mod life_cycle;
mod lunar;
mod pillar;

pub use cycle::{CycleIndexError, EarthlyBranch, HeavenlyStem};
pub use four_pillars::{FourPillars, MINUS_OFFSETS, PillarKind, PillarPair, PillarSlot};
pub use life_cycle::LifeCycleStage;
pub use lunar::LunarDate;
pub use pillar::{
    Pillar, PillarError, SEXAGENARY_TABLE, TableIntegrityError, sixty_stem, sixty_stem_index,
    verify_sexagenary_table,
};
