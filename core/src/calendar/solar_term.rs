use std::fmt;

/// The twenty-four solar terms (節氣), in order from 立春.
///
/// Even indices are the sectional terms that open a pillar month; odd
/// indices are the principal terms (中氣) used for leap-month placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SolarTerm {
    LiChun,
    YuShui,
    JingZhe,
    ChunFen,
    QingMing,
    GuYu,
    LiXia,
    XiaoMan,
    MangZhong,
    XiaZhi,
    XiaoShu,
    DaShu,
    LiQiu,
    ChuShu,
    BaiLu,
    QiuFen,
    HanLu,
    ShuangJiang,
    LiDong,
    XiaoXue,
    DaXue,
    DongZhi,
    XiaoHan,
    DaHan,
}

const NAMES: [&str; 24] = [
    "立春", "雨水", "驚蟄", "春分", "清明", "穀雨", "立夏", "小滿", "芒種", "夏至", "小暑", "大暑",
    "立秋", "處暑", "白露", "秋分", "寒露", "霜降", "立冬", "小雪", "大雪", "冬至", "小寒", "大寒",
];

/// Typical Gregorian (month, day) of each term, used to seed the longitude search.
const APPROXIMATE_DATES: [(u32, u32); 24] = [
    (2, 4),
    (2, 19),
    (3, 6),
    (3, 21),
    (4, 5),
    (4, 20),
    (5, 6),
    (5, 21),
    (6, 6),
    (6, 21),
    (7, 7),
    (7, 23),
    (8, 8),
    (8, 23),
    (9, 8),
    (9, 23),
    (10, 8),
    (10, 23),
    (11, 7),
    (11, 22),
    (12, 7),
    (12, 22),
    (1, 6),
    (1, 20),
];

impl SolarTerm {
    pub const ALL: [Self; 24] = [
        Self::LiChun,
        Self::YuShui,
        Self::JingZhe,
        Self::ChunFen,
        Self::QingMing,
        Self::GuYu,
        Self::LiXia,
        Self::XiaoMan,
        Self::MangZhong,
        Self::XiaZhi,
        Self::XiaoShu,
        Self::DaShu,
        Self::LiQiu,
        Self::ChuShu,
        Self::BaiLu,
        Self::QiuFen,
        Self::HanLu,
        Self::ShuangJiang,
        Self::LiDong,
        Self::XiaoXue,
        Self::DaXue,
        Self::DongZhi,
        Self::XiaoHan,
        Self::DaHan,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    /// Apparent solar longitude in degrees at which the term begins.
    #[must_use]
    pub fn longitude(self) -> f64 {
        ((315 + 15 * self.index()) % 360) as f64
    }

    /// Pillar month (1 = 寅 month) opened or continued by this term.
    #[must_use]
    pub const fn month_number(self) -> u32 {
        (self.index() / 2 + 1) as u32
    }

    #[must_use]
    pub(crate) const fn approximate_date(self) -> (u32, u32) {
        APPROXIMATE_DATES[self as usize]
    }
}

impl fmt::Display for SolarTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
