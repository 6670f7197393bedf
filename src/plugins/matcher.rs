// URL matching - pattern matchers and the legacy predicate shim
//
// A plugin claims URLs either through a list of Matchers or through a
// legacy predicate. Both sit behind MatchStrategy so the resolver never
// has to care which kind it is looking at.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::priority::Priority;

/// URL pattern paired with a priority.
///
/// Patterns match from the start of the URL only; anchor the end with `$`
/// when the tail matters.
#[derive(Clone)]
pub struct Matcher {
    source: String,
    pattern: Regex,
    priority: Priority,
}

impl Matcher {
    pub fn new(pattern: &str, priority: Priority) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            pattern: Regex::new(&format!("^(?:{})", pattern))?,
            priority,
        })
    }

    /// Matcher with `Priority::Normal`
    pub fn normal(pattern: &str) -> Result<Self, regex::Error> {
        Self::new(pattern, Priority::Normal)
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Named capture groups of a match
    pub fn groups(&self, url: &str) -> BTreeMap<String, String> {
        let Some(caps) = self.pattern.captures(url) else {
            return BTreeMap::new();
        };
        self.pattern
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect()
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("pattern", &self.source)
            .field("priority", &self.priority)
            .finish()
    }
}

pub type UrlTest = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type PriorityFn = Arc<dyn Fn(&str) -> Priority + Send + Sync>;

/// Deprecated boolean test for plugins without matchers
#[derive(Clone)]
pub struct LegacyPredicate {
    test: UrlTest,
    priority_fn: Option<PriorityFn>,
}

impl LegacyPredicate {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
            priority_fn: None,
        }
    }

    pub fn with_priority<F>(mut self, priority_fn: F) -> Self
    where
        F: Fn(&str) -> Priority + Send + Sync + 'static,
    {
        self.priority_fn = Some(Arc::new(priority_fn));
        self
    }

    pub fn test(&self, url: &str) -> bool {
        (self.test)(url)
    }

    /// Effective priority; `Normal` without a priority function
    pub fn priority(&self, url: &str) -> Priority {
        self.priority_fn
            .as_ref()
            .map_or(Priority::Normal, |priority_fn| priority_fn(url))
    }
}

impl fmt::Debug for LegacyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyPredicate")
            .field("has_priority_fn", &self.priority_fn.is_some())
            .finish()
    }
}

/// Result of a successful claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub priority: Priority,
    /// Index of the winning matcher; `None` for legacy predicates
    pub matcher: Option<usize>,
}

/// How a plugin claims URLs
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    Matchers(Vec<Matcher>),
    Legacy(LegacyPredicate),
}

impl MatchStrategy {
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn matches(&self, url: &str) -> bool {
        self.claim(url).is_some()
    }

    /// Priority this plugin claims `url` with, if it matches at all
    pub fn priority_for(&self, url: &str) -> Option<Priority> {
        self.claim(url).map(|claim| claim.priority)
    }

    /// Highest-priority claim; the first matcher wins among equals
    pub fn claim(&self, url: &str) -> Option<Claim> {
        match self {
            Self::Matchers(matchers) => {
                let mut best: Option<Claim> = None;
                for (index, matcher) in matchers.iter().enumerate() {
                    if !matcher.is_match(url) {
                        continue;
                    }
                    if best.map_or(true, |b| matcher.priority() > b.priority) {
                        best = Some(Claim {
                            priority: matcher.priority(),
                            matcher: Some(index),
                        });
                    }
                }
                best
            }
            Self::Legacy(predicate) => predicate.test(url).then(|| Claim {
                priority: predicate.priority(url),
                matcher: None,
            }),
        }
    }

    /// Capture groups of the matcher at `matcher`
    pub fn groups(&self, url: &str, matcher: Option<usize>) -> BTreeMap<String, String> {
        match (self, matcher) {
            (Self::Matchers(matchers), Some(index)) => matchers
                .get(index)
                .map(|matcher| matcher.groups(url))
                .unwrap_or_default(),
            _ => BTreeMap::new(),
        }
    }
}
