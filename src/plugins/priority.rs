// Plugin priority levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ranking used when several plugins claim the same URL.
///
/// `No` still matches, but loses against any other level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    No,
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Numeric level (0, 10, 20, 30)
    pub fn level(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Low => 10,
            Self::Normal => 20,
            Self::High => 30,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "no"),
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert!(Priority::Low > Priority::No);
        assert_eq!(Priority::default(), Priority::Normal);
        assert_eq!(Priority::High.level(), 30);
    }
}
