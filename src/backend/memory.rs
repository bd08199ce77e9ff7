use std::collections::{HashMap, HashSet};

use crate::{
    feature::Percentage, rules::Rule, sharder::Crc32Sharder, Error, Feature, Result, Subject,
};

use super::Backend;

/// Process-local backend.
///
/// Not synchronized: wrap it in a `Mutex` to share it between threads.
#[derive(Debug, Default)]
pub struct MemoryBackEnd {
    features: HashMap<String, Feature>,
    /// Feature names in insertion order.
    order: Vec<String>,
    whitelists: HashMap<String, HashSet<String>>,
    rules: HashMap<String, Rule>,
}

impl MemoryBackEnd {
    /// An empty backend.
    pub fn new() -> Self {
        MemoryBackEnd::default()
    }

    /// Whitelisted identifiers of a feature, sorted.
    pub fn whitelist(&self, name: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .whitelists
            .get(name)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn update(&mut self, name: &str, f: impl FnOnce(&mut Feature)) -> Result<()> {
        let feature = self
            .features
            .get_mut(name)
            .ok_or_else(|| Error::UnknownFeature(name.to_owned()))?;
        f(feature);
        log::debug!(target: "hanoi", feature:serde = &*feature; "updated feature");
        Ok(())
    }
}

impl Backend for MemoryBackEnd {
    fn add_functionality(&mut self, feature: Feature) -> Result<()> {
        let name = feature.name().to_owned();
        log::debug!(target: "hanoi", feature:serde = feature; "storing feature");

        self.whitelists.remove(&name);
        self.rules.remove(&name);
        if self.features.insert(name.clone(), feature).is_none() {
            self.order.push(name);
        }
        Ok(())
    }

    fn get_functionality(&mut self, name: &str) -> Result<Option<Feature>> {
        Ok(self.features.get(name).cloned())
    }

    fn get_functionalities(&mut self) -> Result<Vec<String>> {
        Ok(self.order.clone())
    }

    fn add(&mut self, name: &str, subject: &dyn Subject) -> Result<()> {
        let feature = self
            .features
            .get(name)
            .ok_or_else(|| Error::UnknownFeature(name.to_owned()))?;
        let id = feature.get_item_id(subject)?;

        log::debug!(target: "hanoi", feature:display = name, id:display = id; "whitelisting subject");
        self.whitelists
            .entry(name.to_owned())
            .or_default()
            .insert(id);
        Ok(())
    }

    fn set_rule(&mut self, name: &str, rule: Rule) -> Result<()> {
        if !self.features.contains_key(name) {
            return Err(Error::UnknownFeature(name.to_owned()));
        }
        log::debug!(target: "hanoi", feature:display = name, rule:display = rule.as_str(); "setting rule");
        self.rules.insert(name.to_owned(), rule);
        Ok(())
    }

    fn set_percentage(&mut self, name: &str, percentage: Percentage) -> Result<()> {
        self.update(name, |feature| feature.set_validated_percentage(percentage))
    }

    fn enable(&mut self, name: &str, promote_to_all: bool) -> Result<()> {
        self.update(name, |feature| {
            feature.set_enabled(true);
            if promote_to_all {
                feature.set_validated_percentage(Percentage::ALL);
            }
        })
    }

    fn disable(&mut self, name: &str) -> Result<()> {
        self.update(name, |feature| feature.set_enabled(false))
    }

    fn toggle(&mut self, name: &str) -> Result<()> {
        self.update(name, Feature::toggle)
    }

    fn is_enabled(&mut self, name: &str, subject: Option<&dyn Subject>) -> Result<bool> {
        let Some(feature) = self.features.get(name) else {
            return Ok(false);
        };
        let whitelist = self.whitelists.get(name);
        feature.eval(
            subject,
            self.rules.get(name),
            |id| Ok(whitelist.is_some_and(|ids| ids.contains(id))),
            &Crc32Sharder,
        )
    }

    fn variant(&mut self, name: &str, subject: &dyn Subject) -> Result<Option<String>> {
        match self.features.get(name) {
            Some(feature) => feature.eval_variant(subject, &Crc32Sharder),
            None => Ok(None),
        }
    }
}
