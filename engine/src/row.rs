use chrono::NaiveDateTime;
use serde::Serialize;

use bazi_types::{FourPillars, LifeCycleStage, LunarDate};

/// Features computed for one timestamp.
///
/// A row whose computation failed keeps its timestamp but carries no
/// pillars, empty life-cycle stages and all-zero relation flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentRow {
    pub timestamp: NaiveDateTime,
    pub current: Option<FourPillars>,
    pub lunar: Option<LunarDate>,
    pub life_cycle: Vec<(String, LifeCycleStage)>,
    pub relations: Vec<(String, u8)>,
}

impl EnrichmentRow {
    /// Placeholder row for a timestamp whose features could not be computed.
    #[must_use]
    pub fn defaulted(
        timestamp: NaiveDateTime,
        life_cycle_columns: &[String],
        relation_columns: &[String],
    ) -> Self {
        Self {
            timestamp,
            current: None,
            lunar: None,
            life_cycle: life_cycle_columns
                .iter()
                .map(|name| (name.clone(), LifeCycleStage::Empty))
                .collect(),
            relations: relation_columns
                .iter()
                .map(|name| (name.clone(), 0))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_defaulted(&self) -> bool {
        self.current.is_none()
    }
}
