use std::fmt;

use serde::{Deserialize, Serialize};

/// A date of the Chinese lunisolar calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_leap_month: bool,
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leap = if self.is_leap_month { "閏" } else { "" };
        write!(f, "{}-{leap}{:02}-{:02}", self.year, self.month, self.day)
    }
}
