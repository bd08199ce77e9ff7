use crate::{rules::Rule, sharder::Sharder, Feature, Result, Subject};

/// The step of the activation algorithm that settled a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Feature is globally disabled. Nothing can override that.
    Disabled,
    /// Global query on an enabled feature.
    Enabled,
    /// Percentage is 100.
    FullRollout,
    Whitelisted,
    RuleMatched,
    /// Identifier fell in the percentage bucket.
    InRollout,
    NotSelected,
}

impl Decision {
    pub(crate) fn is_enabled(self) -> bool {
        !matches!(self, Decision::Disabled | Decision::NotSelected)
    }
}

impl Feature {
    /// Decide whether the feature is active for `subject` (or globally, if `subject` is `None`).
    ///
    /// Checks run in a fixed order and stop at the first positive one: full rollout, whitelist,
    /// rule, percentage bucket. `is_whitelisted` receives the resolved identifier and is only
    /// called when the earlier checks were negative.
    pub(crate) fn eval(
        &self,
        subject: Option<&dyn Subject>,
        rule: Option<&Rule>,
        is_whitelisted: impl FnOnce(&str) -> Result<bool>,
        sharder: &impl Sharder,
    ) -> Result<bool> {
        let decision = self.decide(subject, rule, is_whitelisted, sharder)?;

        log::trace!(target: "hanoi",
                    feature:display = self.name(),
                    subject_key:display = subject.map(|s| s.subject_key()).unwrap_or_default(),
                    decision:?;
                    "evaluated a feature");

        Ok(decision.is_enabled())
    }

    fn decide(
        &self,
        subject: Option<&dyn Subject>,
        rule: Option<&Rule>,
        is_whitelisted: impl FnOnce(&str) -> Result<bool>,
        sharder: &impl Sharder,
    ) -> Result<Decision> {
        if !self.is_enabled() {
            return Ok(Decision::Disabled);
        }

        let Some(subject) = subject else {
            return Ok(Decision::Enabled);
        };

        if self.percentage() == 100 {
            return Ok(Decision::FullRollout);
        }

        let id = self.get_item_id(subject)?;

        if is_whitelisted(&id)? {
            return Ok(Decision::Whitelisted);
        }

        if rule.is_some_and(|rule| rule.matches(&subject.subject_key())) {
            return Ok(Decision::RuleMatched);
        }

        // Kept bit-compatible with existing stores: subjects whose bucket is at or above the
        // percentage are selected.
        let percentage = u64::from(self.percentage());
        if percentage > 0 && sharder.get_shard(&id, 100) >= percentage {
            return Ok(Decision::InRollout);
        }

        Ok(Decision::NotSelected)
    }

    /// Deterministically pick one of the feature's variants for `subject`.
    ///
    /// Returns `None` if the feature is disabled or has no variants.
    pub(crate) fn eval_variant(
        &self,
        subject: &dyn Subject,
        sharder: &impl Sharder,
    ) -> Result<Option<String>> {
        if !self.is_enabled() || self.variants().is_empty() {
            return Ok(None);
        }

        let id = self.get_item_id(subject)?;
        let shard = sharder.get_shard(&id, self.variants().len() as u64);
        let variant = usize::try_from(shard)
            .ok()
            .and_then(|index| self.variants().get(index))
            .cloned();

        log::trace!(target: "hanoi",
                    feature:display = self.name(),
                    id:display = id,
                    variant:? = variant;
                    "assigned a variant");

        Ok(variant)
    }
}
