use derive_more::From;
use regex::Regex;

use crate::Result;

/// A pattern rule: subjects whose string form matches it are always enabled.
///
/// Matching is an unanchored search, use `^`/`$` to anchor.
#[derive(Debug, Clone, From)]
pub struct Rule(Regex);

impl Rule {
    /// Compile a rule from a regular expression.
    pub fn new(pattern: &str) -> Result<Rule> {
        Ok(Rule(Regex::new(pattern)?))
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the pattern matches anywhere in `subject_key`.
    pub fn matches(&self, subject_key: &str) -> bool {
        self.0.is_match(subject_key)
    }
}
