//! Life-cycle stage (長生十二宮) lookup and the base × current stage matrix.

use std::sync::OnceLock;

use bazi_types::LifeCycleStage::{
    self, Bath, Birth, Conception, Crown, Death, Decline, Extinction, Nurture, Office, Peak,
    Sickness, Tomb,
};
use bazi_types::{EarthlyBranch, FourPillars, HeavenlyStem, PillarSlot, TableIntegrityError};

/// Stage of every stem/branch glyph pair. Yang stems advance through the
/// branches from their birth branch, yin stems retreat.
const STAGE_TABLE: [(&str, LifeCycleStage); 120] = [
    ("甲亥", Birth), ("甲子", Bath), ("甲丑", Crown),
    ("甲寅", Office), ("甲卯", Peak), ("甲辰", Decline),
    ("甲巳", Sickness), ("甲午", Death), ("甲未", Tomb),
    ("甲申", Extinction), ("甲酉", Conception), ("甲戌", Nurture),
    ("乙午", Birth), ("乙巳", Bath), ("乙辰", Crown),
    ("乙卯", Office), ("乙寅", Peak), ("乙丑", Decline),
    ("乙子", Sickness), ("乙亥", Death), ("乙戌", Tomb),
    ("乙酉", Extinction), ("乙申", Conception), ("乙未", Nurture),
    ("丙寅", Birth), ("丙卯", Bath), ("丙辰", Crown),
    ("丙巳", Office), ("丙午", Peak), ("丙未", Decline),
    ("丙申", Sickness), ("丙酉", Death), ("丙戌", Tomb),
    ("丙亥", Extinction), ("丙子", Conception), ("丙丑", Nurture),
    ("丁酉", Birth), ("丁申", Bath), ("丁未", Crown),
    ("丁午", Office), ("丁巳", Peak), ("丁辰", Decline),
    ("丁卯", Sickness), ("丁寅", Death), ("丁丑", Tomb),
    ("丁子", Extinction), ("丁亥", Conception), ("丁戌", Nurture),
    ("戊寅", Birth), ("戊卯", Bath), ("戊辰", Crown),
    ("戊巳", Office), ("戊午", Peak), ("戊未", Decline),
    ("戊申", Sickness), ("戊酉", Death), ("戊戌", Tomb),
    ("戊亥", Extinction), ("戊子", Conception), ("戊丑", Nurture),
    ("己酉", Birth), ("己申", Bath), ("己未", Crown),
    ("己午", Office), ("己巳", Peak), ("己辰", Decline),
    ("己卯", Sickness), ("己寅", Death), ("己丑", Tomb),
    ("己子", Extinction), ("己亥", Conception), ("己戌", Nurture),
    ("庚巳", Birth), ("庚午", Bath), ("庚未", Crown),
    ("庚申", Office), ("庚酉", Peak), ("庚戌", Decline),
    ("庚亥", Sickness), ("庚子", Death), ("庚丑", Tomb),
    ("庚寅", Extinction), ("庚卯", Conception), ("庚辰", Nurture),
    ("辛子", Birth), ("辛亥", Bath), ("辛戌", Crown),
    ("辛酉", Office), ("辛申", Peak), ("辛未", Decline),
    ("辛午", Sickness), ("辛巳", Death), ("辛辰", Tomb),
    ("辛卯", Extinction), ("辛寅", Conception), ("辛丑", Nurture),
    ("壬申", Birth), ("壬酉", Bath), ("壬戌", Crown),
    ("壬亥", Office), ("壬子", Peak), ("壬丑", Decline),
    ("壬寅", Sickness), ("壬卯", Death), ("壬辰", Tomb),
    ("壬巳", Extinction), ("壬午", Conception), ("壬未", Nurture),
    ("癸卯", Birth), ("癸寅", Bath), ("癸丑", Crown),
    ("癸子", Office), ("癸亥", Peak), ("癸戌", Decline),
    ("癸酉", Sickness), ("癸申", Death), ("癸未", Tomb),
    ("癸午", Extinction), ("癸巳", Conception), ("癸辰", Nurture),
];

type StageGrid = [[LifeCycleStage; 12]; 10];

fn build_grid(table: &[(&str, LifeCycleStage)]) -> Result<StageGrid, TableIntegrityError> {
    const NAME: &str = "life-cycle";
    if table.len() != 120 {
        return Err(TableIntegrityError::EntryCount {
            table: NAME,
            expected: 120,
            actual: table.len(),
        });
    }

    let mut grid = [[LifeCycleStage::Empty; 12]; 10];
    for &(key, stage) in table {
        let malformed = || TableIntegrityError::Malformed {
            table: NAME,
            entry: key.to_string(),
        };
        let mut chars = key.chars();
        let stem = chars
            .next()
            .and_then(HeavenlyStem::from_glyph)
            .ok_or_else(malformed)?;
        let branch = chars
            .next()
            .and_then(EarthlyBranch::from_glyph)
            .ok_or_else(malformed)?;
        if chars.next().is_some() || stage.is_empty() {
            return Err(malformed());
        }
        let cell = &mut grid[usize::from(stem.index())][usize::from(branch.index())];
        if !cell.is_empty() {
            return Err(TableIntegrityError::Duplicate {
                table: NAME,
                entry: key.to_string(),
            });
        }
        *cell = stage;
    }

    for (stem, row) in HeavenlyStem::all().zip(grid.iter()) {
        if LifeCycleStage::CYCLE.iter().any(|stage| !row.contains(stage)) {
            return Err(TableIntegrityError::Malformed {
                table: NAME,
                entry: stem.to_string(),
            });
        }
    }
    Ok(grid)
}

fn verified_grid() -> Result<StageGrid, TableIntegrityError> {
    static GRID: OnceLock<Result<StageGrid, TableIntegrityError>> = OnceLock::new();
    GRID.get_or_init(|| build_grid(&STAGE_TABLE)).clone()
}

/// Name of the matrix column pairing a base slot's stem with a current slot's branch.
#[must_use]
pub fn column_name(base: PillarSlot, current: PillarSlot) -> String {
    format!("cs_{base}_{current}")
}

/// Maps stem/branch pairs to life-cycle stages.
#[derive(Debug, Clone)]
pub struct LifeCycleMapper {
    grid: StageGrid,
}

impl LifeCycleMapper {
    /// Build the mapper after checking the literal stage table.
    pub fn new() -> Result<Self, TableIntegrityError> {
        Ok(Self {
            grid: verified_grid()?,
        })
    }

    #[must_use]
    pub fn stage_of(&self, stem: HeavenlyStem, branch: EarthlyBranch) -> LifeCycleStage {
        self.grid[usize::from(stem.index())][usize::from(branch.index())]
    }

    /// Stage for a two-glyph stem/branch string. Anything unrecognised maps to `Empty`.
    #[must_use]
    pub fn stage_of_glyphs(&self, glyphs: &str) -> LifeCycleStage {
        let mut chars = glyphs.chars();
        match (
            chars.next().and_then(HeavenlyStem::from_glyph),
            chars.next().and_then(EarthlyBranch::from_glyph),
            chars.next(),
        ) {
            (Some(stem), Some(branch), None) => self.stage_of(stem, branch),
            _ => LifeCycleStage::Empty,
        }
    }

    /// Stage for every base slot × current slot pair, base-major in slot order.
    ///
    /// The stem always comes from the base slot and the branch from the current slot.
    #[must_use]
    pub fn matrix(
        &self,
        base: &FourPillars,
        current: &FourPillars,
    ) -> Vec<(String, LifeCycleStage)> {
        let mut cells = Vec::with_capacity(PillarSlot::ALL.len() * PillarSlot::ALL.len());
        for base_slot in PillarSlot::ALL {
            let stem = base.slot(base_slot).stem();
            for current_slot in PillarSlot::ALL {
                let branch = current.slot(current_slot).branch();
                cells.push((
                    column_name(base_slot, current_slot),
                    self.stage_of(stem, branch),
                ));
            }
        }
        cells
    }

    #[must_use]
    pub fn encode(stage: LifeCycleStage) -> u8 {
        stage.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazi_types::Pillar;

    fn mapper() -> LifeCycleMapper {
        LifeCycleMapper::new().unwrap()
    }

    #[test]
    fn literal_table_is_complete() {
        assert!(build_grid(&STAGE_TABLE).is_ok());
    }

    #[test]
    fn truncated_table_is_rejected() {
        assert!(matches!(
            build_grid(&STAGE_TABLE[..60]),
            Err(TableIntegrityError::EntryCount { actual: 60, .. })
        ));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut table = STAGE_TABLE;
        table[1] = ("甲亥", Bath);
        assert!(matches!(
            build_grid(&table),
            Err(TableIntegrityError::Duplicate { .. })
        ));
    }

    #[test]
    fn birth_branches() {
        let m = mapper();
        assert_eq!(m.stage_of_glyphs("甲亥"), Birth);
        assert_eq!(m.stage_of_glyphs("乙午"), Birth);
        assert_eq!(m.stage_of_glyphs("庚巳"), Birth);
        assert_eq!(m.stage_of_glyphs("癸卯"), Birth);
        assert_eq!(m.stage_of_glyphs("甲卯"), Peak);
        assert_eq!(m.stage_of_glyphs("乙寅"), Peak);
    }

    #[test]
    fn yang_advances_and_yin_retreats() {
        let m = mapper();
        for stem in HeavenlyStem::all() {
            let birth = EarthlyBranch::all()
                .find(|b| m.stage_of(stem, *b) == Birth)
                .unwrap();
            let step = if stem.is_yang() { 1 } else { -1 };
            for (i, stage) in LifeCycleStage::CYCLE.iter().enumerate() {
                assert_eq!(m.stage_of(stem, birth + step * i as i64), *stage);
            }
        }
    }

    #[test]
    fn unknown_glyphs_map_to_empty() {
        let m = mapper();
        assert_eq!(m.stage_of_glyphs(""), LifeCycleStage::Empty);
        assert_eq!(m.stage_of_glyphs("子甲"), LifeCycleStage::Empty);
        assert_eq!(m.stage_of_glyphs("甲子丑"), LifeCycleStage::Empty);
        assert_eq!(LifeCycleMapper::encode(LifeCycleStage::Empty), 0);
        assert_eq!(LifeCycleMapper::encode(Nurture), 12);
    }

    #[test]
    fn matrix_takes_stem_from_base_and_branch_from_current() {
        let m = mapper();
        let p = |s: &str| Pillar::parse(s).unwrap();
        let base = FourPillars::new(p("甲子"), p("甲子"), p("甲子"), p("甲子"));
        let current = FourPillars::new(p("丁卯"), p("丁卯"), p("丁卯"), p("丁卯"));
        let cells = m.matrix(&base, &current);
        assert_eq!(cells.len(), 36);
        assert_eq!(cells[0].0, "cs_hour_hour");
        assert_eq!(cells[1].0, "cs_hour_day");
        assert_eq!(cells[2].0, "cs_hour_hour_minus");
        assert_eq!(cells[35].0, "cs_month_minus_month_minus");
        let names: std::collections::HashSet<&str> =
            cells.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names.len(), 36);
        // base hour stem 甲 with current hour branch 卯.
        assert_eq!(cells[0].1, Peak);
        // Reversed order (丁 with 子) would be 絕.
        assert_ne!(cells[0].1, m.stage_of_glyphs("丁子"));
    }
}
