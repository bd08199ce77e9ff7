//! Storage for features, whitelists and rules.
//!
//! All backends make identical decisions for identical state; they only differ in where the
//! state lives and what that costs:
//!
//! - [`MemoryBackEnd`] keeps everything in the process.
//! - [`RedisBackEnd`] stores one record per feature, whitelist included, and can enumerate
//!   features.
//! - [`RedisHighPerfBackEnd`] keeps the whitelist in a separate set for O(1) membership checks,
//!   and cannot enumerate features.
//!
//! Backends take `&mut self` and do no locking. Remote backends read, modify and write whole
//! records, so concurrent writers to the same feature can lose updates.
mod attachments;
mod memory;
mod record;
mod redis;
mod redis_high_perf;

pub use memory::MemoryBackEnd;
pub use redis::RedisBackEnd;
pub use redis_high_perf::RedisHighPerfBackEnd;

use crate::{feature::Percentage, rules::Rule, Feature, Result, Subject};

/// Operations every backend implements.
pub trait Backend {
    /// Store `feature`, replacing any feature with the same name together with its whitelist and
    /// rule.
    fn add_functionality(&mut self, feature: Feature) -> Result<()>;

    /// Get a feature by name. `None` if it doesn't exist.
    fn get_functionality(&mut self, name: &str) -> Result<Option<Feature>>;

    /// Names of all known features.
    fn get_functionalities(&mut self) -> Result<Vec<String>>;

    /// Whitelist `subject` for the feature. Fails with
    /// [`Error::UnknownFeature`](crate::Error::UnknownFeature) if the feature doesn't exist.
    fn add(&mut self, name: &str, subject: &dyn Subject) -> Result<()>;

    /// Install the feature's rule, replacing the previous one.
    fn set_rule(&mut self, name: &str, rule: Rule) -> Result<()>;

    /// Change the rollout percentage.
    fn set_percentage(&mut self, name: &str, percentage: Percentage) -> Result<()>;

    /// Enable the feature. With `promote_to_all`, also roll it out to 100%.
    fn enable(&mut self, name: &str, promote_to_all: bool) -> Result<()>;

    /// Disable the feature for everybody.
    fn disable(&mut self, name: &str) -> Result<()>;

    /// Flip the enabled state.
    fn toggle(&mut self, name: &str) -> Result<()>;

    /// Whether the feature is active for `subject`, or globally if `subject` is `None`.
    ///
    /// Unknown features are never enabled.
    fn is_enabled(&mut self, name: &str, subject: Option<&dyn Subject>) -> Result<bool>;

    /// The variant `subject` is bucketed into, if the feature is enabled and has variants.
    fn variant(&mut self, name: &str, subject: &dyn Subject) -> Result<Option<String>>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn add_functionality(&mut self, feature: Feature) -> Result<()> {
        (**self).add_functionality(feature)
    }

    fn get_functionality(&mut self, name: &str) -> Result<Option<Feature>> {
        (**self).get_functionality(name)
    }

    fn get_functionalities(&mut self) -> Result<Vec<String>> {
        (**self).get_functionalities()
    }

    fn add(&mut self, name: &str, subject: &dyn Subject) -> Result<()> {
        (**self).add(name, subject)
    }

    fn set_rule(&mut self, name: &str, rule: Rule) -> Result<()> {
        (**self).set_rule(name, rule)
    }

    fn set_percentage(&mut self, name: &str, percentage: Percentage) -> Result<()> {
        (**self).set_percentage(name, percentage)
    }

    fn enable(&mut self, name: &str, promote_to_all: bool) -> Result<()> {
        (**self).enable(name, promote_to_all)
    }

    fn disable(&mut self, name: &str) -> Result<()> {
        (**self).disable(name)
    }

    fn toggle(&mut self, name: &str) -> Result<()> {
        (**self).toggle(name)
    }

    fn is_enabled(&mut self, name: &str, subject: Option<&dyn Subject>) -> Result<bool> {
        (**self).is_enabled(name, subject)
    }

    fn variant(&mut self, name: &str, subject: &dyn Subject) -> Result<Option<String>> {
        (**self).variant(name, subject)
    }
}

#[cfg(test)]
mod tests;
