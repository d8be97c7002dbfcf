//! Branch relations (合/衝/破/害/刑) evaluated against a row's branch slots.

use std::fmt;

use bazi_types::{EarthlyBranch, FourPillars, PillarSlot, TableIntegrityError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationCategory {
    SixCombine,
    TripleCombine,
    Clash,
    Break,
    Harm,
    Punishment,
}

impl RelationCategory {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SixCombine => "six_combine",
            Self::TripleCombine => "triple_combine",
            Self::Clash => "clash",
            Self::Break => "break",
            Self::Harm => "harm",
            Self::Punishment => "punishment",
        }
    }
}

impl fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const CATALOG: [(RelationCategory, &str); 39] = {
    use RelationCategory::{Break, Clash, Harm, Punishment, SixCombine, TripleCombine};
    [
        (SixCombine, "子丑"),
        (SixCombine, "寅亥"),
        (SixCombine, "卯戌"),
        (SixCombine, "辰酉"),
        (SixCombine, "巳申"),
        (SixCombine, "午未"),
        (TripleCombine, "申子辰"),
        (TripleCombine, "巳酉丑"),
        (TripleCombine, "寅午戌"),
        (TripleCombine, "亥卯未"),
        (Clash, "子午"),
        (Clash, "丑未"),
        (Clash, "寅申"),
        (Clash, "卯酉"),
        (Clash, "辰戌"),
        (Clash, "巳亥"),
        (Break, "子酉"),
        (Break, "午卯"),
        (Break, "巳申"),
        (Break, "寅亥"),
        (Break, "辰丑"),
        (Break, "戌未"),
        (Harm, "子未"),
        (Harm, "丑午"),
        (Harm, "寅巳"),
        (Harm, "卯辰"),
        (Harm, "申亥"),
        (Harm, "酉戌"),
        (Punishment, "寅巳"),
        (Punishment, "巳申"),
        (Punishment, "申寅"),
        (Punishment, "未丑"),
        (Punishment, "丑戌"),
        (Punishment, "戌未"),
        (Punishment, "子卯"),
        (Punishment, "辰辰"),
        (Punishment, "午午"),
        (Punishment, "酉酉"),
        (Punishment, "亥亥"),
    ]
};

/// Occurrences of each branch among a row's slots, indexed by branch.
pub type BranchHistogram = [u8; 12];

#[must_use]
pub fn histogram(slots: &[EarthlyBranch]) -> BranchHistogram {
    let mut counts = [0u8; 12];
    for branch in slots {
        let count = &mut counts[usize::from(branch.index())];
        *count = count.saturating_add(1);
    }
    counts
}

/// A named multiset of branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRelationPattern {
    category: RelationCategory,
    glyphs: &'static str,
    required: BranchHistogram,
}

impl BranchRelationPattern {
    fn parse(category: RelationCategory, glyphs: &'static str) -> Result<Self, TableIntegrityError> {
        let branches: Option<Vec<EarthlyBranch>> =
            glyphs.chars().map(EarthlyBranch::from_glyph).collect();
        match branches {
            Some(branches) if (2..=3).contains(&branches.len()) => Ok(Self {
                category,
                glyphs,
                required: histogram(&branches),
            }),
            _ => Err(TableIntegrityError::Malformed {
                table: "branch relation",
                entry: glyphs.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn category(&self) -> RelationCategory {
        self.category
    }

    #[must_use]
    pub fn glyphs(&self) -> &'static str {
        self.glyphs
    }

    /// `{category}_{glyphs}`, e.g. `triple_combine_寅午戌`.
    #[must_use]
    pub fn column_name(&self) -> String {
        format!("{}_{}", self.category.name(), self.glyphs)
    }

    /// True when one branch must appear more than once (self-punishment).
    #[must_use]
    pub fn is_self_relation(&self) -> bool {
        self.required.iter().any(|&n| n > 1)
    }

    /// Every required branch occurs at least as often as the pattern demands.
    #[must_use]
    pub fn matches(&self, counts: &BranchHistogram) -> bool {
        self.required
            .iter()
            .zip(counts)
            .all(|(required, present)| present >= required)
    }
}

/// The fixed relation catalog.
#[derive(Debug, Clone)]
pub struct RelationMatcher {
    patterns: Vec<BranchRelationPattern>,
}

impl RelationMatcher {
    pub fn new() -> Result<Self, TableIntegrityError> {
        let patterns = CATALOG
            .iter()
            .map(|&(category, glyphs)| BranchRelationPattern::parse(category, glyphs))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn patterns(&self) -> &[BranchRelationPattern] {
        &self.patterns
    }

    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.patterns.iter().map(BranchRelationPattern::column_name)
    }

    /// `(column, 0|1)` for every pattern in catalog order.
    #[must_use]
    pub fn evaluate(&self, slots: &[EarthlyBranch]) -> Vec<(String, u8)> {
        let counts = histogram(slots);
        self.patterns
            .iter()
            .map(|pattern| (pattern.column_name(), u8::from(pattern.matches(&counts))))
            .collect()
    }

    /// Evaluate the six base slot branches followed by the six current slot branches.
    #[must_use]
    pub fn evaluate_row(&self, base: &FourPillars, current: &FourPillars) -> Vec<(String, u8)> {
        let slots: Vec<EarthlyBranch> = PillarSlot::ALL
            .iter()
            .map(|&slot| base.slot(slot).branch())
            .chain(PillarSlot::ALL.iter().map(|&slot| current.slot(slot).branch()))
            .collect();
        self.evaluate(&slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazi_types::Pillar;

    fn branches(glyphs: &str) -> Vec<EarthlyBranch> {
        glyphs
            .chars()
            .map(|c| EarthlyBranch::from_glyph(c).unwrap())
            .collect()
    }

    fn flag(result: &[(String, u8)], column: &str) -> u8 {
        result
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
            .unwrap()
    }

    #[test]
    fn catalog_sizes() {
        let matcher = RelationMatcher::new().unwrap();
        let count = |c| {
            matcher
                .patterns()
                .iter()
                .filter(|p| p.category() == c)
                .count()
        };
        assert_eq!(count(RelationCategory::SixCombine), 6);
        assert_eq!(count(RelationCategory::TripleCombine), 4);
        assert_eq!(count(RelationCategory::Clash), 6);
        assert_eq!(count(RelationCategory::Break), 6);
        assert_eq!(count(RelationCategory::Harm), 6);
        assert_eq!(count(RelationCategory::Punishment), 11);
        let self_punishments: Vec<&str> = matcher
            .patterns()
            .iter()
            .filter(|p| p.is_self_relation())
            .map(BranchRelationPattern::glyphs)
            .collect();
        assert_eq!(self_punishments, ["辰辰", "午午", "酉酉", "亥亥"]);
    }

    #[test]
    fn fire_frame_matches_only_its_triple() {
        let matcher = RelationMatcher::new().unwrap();
        let result = matcher.evaluate(&branches("寅午戌寅戌寅戌寅戌寅戌寅"));
        assert_eq!(flag(&result, "triple_combine_寅午戌"), 1);
        let total: u32 = result.iter().map(|(_, v)| u32::from(*v)).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn self_punishment_needs_two_occurrences() {
        let matcher = RelationMatcher::new().unwrap();
        let once = matcher.evaluate(&branches("辰子子子子子子子子子子子"));
        assert_eq!(flag(&once, "punishment_辰辰"), 0);
        let twice = matcher.evaluate(&branches("辰辰子子子子子子子子子子"));
        assert_eq!(flag(&twice, "punishment_辰辰"), 1);
    }

    #[test]
    fn clash_across_base_and_current() {
        let matcher = RelationMatcher::new().unwrap();
        let p = |s: &str| Pillar::parse(s).unwrap();
        let base = FourPillars::new(p("甲子"), p("甲子"), p("甲子"), p("甲子"));
        let current = FourPillars::new(p("庚午"), p("庚午"), p("庚午"), p("庚午"));
        let result = matcher.evaluate_row(&base, &current);
        assert_eq!(result.len(), 39);
        assert_eq!(flag(&result, "clash_子午"), 1);
        assert_eq!(flag(&result, "six_combine_子丑"), 0);
    }

    #[test]
    fn column_names_keep_catalog_order() {
        let matcher = RelationMatcher::new().unwrap();
        let names: Vec<String> = matcher.column_names().collect();
        assert_eq!(names.first().map(String::as_str), Some("six_combine_子丑"));
        assert_eq!(names.last().map(String::as_str), Some("punishment_亥亥"));
        assert!(names.contains(&"break_巳申".to_string()));
        assert!(names.contains(&"punishment_巳申".to_string()));
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        assert!(BranchRelationPattern::parse(RelationCategory::Clash, "子").is_err());
        assert!(BranchRelationPattern::parse(RelationCategory::Clash, "子甲").is_err());
    }
}
