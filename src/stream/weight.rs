// QualityWeigher - maps stream names to comparable weights
//
// Only two name shapes are sortable:
// - "<digits>p" (resolution, e.g. 1080p)
// - "<digits>k" (bitrate, e.g. 1500k)
// Resolution always ranks above bitrate regardless of magnitude.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref RESOLUTION_RE: Regex = Regex::new(r"^(\d+)p$").unwrap();
    static ref BITRATE_RE: Regex = Regex::new(r"^(\d+)k$").unwrap();
}

/// Weight class; declaration order is the rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeightClass {
    Unsortable,
    Bitrate,
    Resolution,
}

impl WeightClass {
    fn rank(self) -> u8 {
        match self {
            Self::Unsortable => 0,
            Self::Bitrate => 1,
            Self::Resolution => 2,
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsortable => write!(f, "unsortable"),
            Self::Bitrate => write!(f, "bitrate"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Weight of a single stream name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualityWeight {
    pub class: WeightClass,
    pub value: u64,
}

impl QualityWeight {
    pub const UNSORTABLE: Self = Self {
        class: WeightClass::Unsortable,
        value: 0,
    };

    pub fn resolution(value: u64) -> Self {
        Self {
            class: WeightClass::Resolution,
            value,
        }
    }

    pub fn bitrate(value: u64) -> Self {
        Self {
            class: WeightClass::Bitrate,
            value,
        }
    }

    pub fn is_sortable(&self) -> bool {
        self.class != WeightClass::Unsortable
    }

    /// Ordering key `(class_rank, value)`; `None` for unsortable weights
    pub fn sort_key(&self) -> Option<(u8, u64)> {
        self.is_sortable().then(|| (self.class.rank(), self.value))
    }
}

/// Weigh a stream name. Never fails.
pub fn weigh(name: &str) -> QualityWeight {
    if let Some(value) = capture_number(&RESOLUTION_RE, name) {
        return QualityWeight::resolution(value);
    }
    if let Some(value) = capture_number(&BITRATE_RE, name) {
        return QualityWeight::bitrate(value);
    }
    QualityWeight::UNSORTABLE
}

fn capture_number(re: &Regex, name: &str) -> Option<u64> {
    re.captures(name)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weigh_resolution_and_bitrate() {
        assert_eq!(weigh("1080p"), QualityWeight::resolution(1080));
        assert_eq!(weigh("350k"), QualityWeight::bitrate(350));
    }

    #[test]
    fn test_weigh_unsortable_names() {
        for name in ["audio", "vod", "vod_alt", "720p60", "p", "k", "1080P", ""] {
            assert!(!weigh(name).is_sortable(), "{name} should be unsortable");
        }
    }

    #[test]
    fn test_weigh_overflow_is_unsortable() {
        assert!(!weigh("99999999999999999999999p").is_sortable());
    }

    #[test]
    fn test_resolution_outranks_any_bitrate() {
        let low_res = weigh("144p").sort_key().unwrap();
        let huge_bitrate = weigh("900000k").sort_key().unwrap();

        assert!(low_res > huge_bitrate);
        assert!(weigh("1500k").sort_key() > weigh("350k").sort_key());
        assert_eq!(weigh("vod").sort_key(), None);
    }
}
