//! Calendar and feature logic for the four-pillar calendar.
//!
//! Solar-term boundaries, lunisolar conversion, pillar calculation, and the
//! life-cycle and branch-relation features derived from pairs of pillars.
//! Nothing here performs IO or spawns threads; the solar-term cache is the
//! only shared state and is safe to use from many threads at once.

pub mod calendar;
pub mod errors;
mod life_cycle;
mod pillars;
mod relations;

pub use calendar::{CalendarConverter, SolarTerm, SolarTermCache, YearTable};
pub use errors::{CalendarError, MAX_YEAR, MIN_YEAR, PillarError};
pub use life_cycle::{LifeCycleMapper, column_name as life_cycle_column};
pub use pillars::{PillarCalculator, day_cycle_position};
pub use relations::{
    BranchHistogram, BranchRelationPattern, RelationCategory, RelationMatcher, histogram,
};
