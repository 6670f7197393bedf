// Sorting exclusions - remove qualities from best/worst consideration
//
// A name is excluded when ANY rule flags it. Excluded streams stay
// addressable by name; they only lose eligibility for the synonyms.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::errors::StreamError;
use super::weight::{weigh, QualityWeight};

lazy_static! {
    static ref FILTER_RE: Regex = Regex::new(r"^(<=|>=|==|<|>)?([A-Za-z0-9_+]+)$").unwrap();
}

/// Comparison operator of a filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl CompareOp {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "==" => Some(Self::Eq),
            _ => None,
        }
    }

    fn holds(self, left: u64, right: u64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => left == right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
        };
        f.write_str(token)
    }
}

/// Predicate over a stream name; `true` means excluded
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Single exclusion rule
#[derive(Clone)]
pub enum ExclusionRule {
    /// Exact stream name
    Name(String),
    /// Weight comparison, only applied within the same weight class
    Compare { op: CompareOp, weight: QualityWeight },
    /// Arbitrary predicate
    Predicate(NamePredicate),
}

impl ExclusionRule {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Parse an expression like `1080p`, `>=720p` or `<1500k`
    pub fn parse(expr: &str) -> Result<Self, StreamError> {
        let caps = FILTER_RE
            .captures(expr.trim())
            .ok_or_else(|| StreamError::InvalidFilter(expr.to_string()))?;
        let value = &caps[2];

        let Some(op) = caps.get(1).and_then(|m| CompareOp::from_token(m.as_str())) else {
            return Ok(Self::Name(value.to_string()));
        };

        let weight = weigh(value);
        if !weight.is_sortable() {
            return Err(StreamError::InvalidFilter(expr.to_string()));
        }
        Ok(Self::Compare { op, weight })
    }

    /// Whether this rule removes `name` from sorting
    pub fn excludes(&self, name: &str) -> bool {
        match self {
            Self::Name(excluded) => excluded == name,
            Self::Compare { op, weight } => {
                let candidate = weigh(name);
                candidate.class == weight.class && op.holds(candidate.value, weight.value)
            }
            Self::Predicate(f) => f(name),
        }
    }
}

impl fmt::Debug for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Compare { op, weight } => f
                .debug_struct("Compare")
                .field("op", op)
                .field("weight", weight)
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl FromStr for ExclusionRule {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// OR'd set of exclusion rules
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    rules: Vec<ExclusionRule>,
}

impl Exclusions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self { rules }
    }

    /// Single predicate form
    pub fn from_predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::new(vec![ExclusionRule::predicate(f)])
    }

    /// Parse a list of filter expressions
    pub fn parse<S: AsRef<str>>(exprs: &[S]) -> Result<Self, StreamError> {
        let rules = exprs
            .iter()
            .map(|expr| ExclusionRule::parse(expr.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn with_rule(mut self, rule: ExclusionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn excludes(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.excludes(name))
    }
}

impl From<Vec<ExclusionRule>> for Exclusions {
    fn from(rules: Vec<ExclusionRule>) -> Self {
        Self::new(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let rule = ExclusionRule::parse("1080p").unwrap();

        assert!(matches!(rule, ExclusionRule::Name(ref n) if n == "1080p"));
        assert!(rule.excludes("1080p"));
        assert!(!rule.excludes("720p"));
    }

    #[test]
    fn test_parse_comparison() {
        let rule: ExclusionRule = ">=1080p".parse().unwrap();

        assert!(rule.excludes("1080p"));
        assert!(rule.excludes("1440p"));
        assert!(!rule.excludes("720p"));
    }

    #[test]
    fn test_comparison_stays_within_class() {
        let rule = ExclusionRule::parse(">1500k").unwrap();

        assert!(rule.excludes("3000k"));
        assert!(!rule.excludes("1500k"));
        assert!(!rule.excludes("1080p"));
        assert!(!rule.excludes("audio"));
    }

    #[test]
    fn test_parse_rejects_invalid_expressions() {
        assert!(ExclusionRule::parse("").is_err());
        assert!(ExclusionRule::parse(">=").is_err());
        assert!(ExclusionRule::parse("<audio").is_err());
        assert!(ExclusionRule::parse("10 80p").is_err());
    }

    #[test]
    fn test_exclusions_are_ored() {
        let exclusions = Exclusions::parse(&["1080p", "<500k"])
            .unwrap()
            .with_rule(ExclusionRule::predicate(|name| name.starts_with("vod")));

        assert!(exclusions.excludes("1080p"));
        assert!(exclusions.excludes("350k"));
        assert!(exclusions.excludes("vod_alt"));
        assert!(!exclusions.excludes("720p"));
        assert!(!Exclusions::none().excludes("1080p"));
    }
}
