use crate::{
    feature::Percentage, rules::Rule, sharder::Crc32Sharder, store::KeyValueStore, Error,
    Feature, Result, Subject,
};

use super::{
    attachments::Attachments,
    record::{check_name, decode, encode, feature_key, users_key},
    Backend,
};

/// Redis backend built for throughput.
///
/// Per feature it stores:
/// - a string record `enabled|percentage|field` under `rollout:<name>`,
/// - a set of whitelisted identifiers under `rollout:users:<name>`.
///
/// Whitelisting and membership checks are O(1). In exchange features cannot be enumerated:
/// [`get_functionalities`](Backend::get_functionalities) always fails with
/// [`Error::NotSupported`]. Use [`RedisBackEnd`](crate::RedisBackEnd) when you need it.
///
/// Names starting with `users:` are rejected with [`Error::ReservedName`].
pub struct RedisHighPerfBackEnd<C = redis::Connection> {
    store: C,
    attachments: Attachments,
}

impl<C: KeyValueStore> RedisHighPerfBackEnd<C> {
    /// Create a backend on top of an existing connection.
    pub fn new(store: C) -> Self {
        RedisHighPerfBackEnd {
            store,
            attachments: Attachments::default(),
        }
    }

    /// Whitelisted identifiers of a feature. Reads the whole set.
    pub fn whitelist(&mut self, name: &str) -> Result<Vec<String>> {
        let mut ids = self.store.smembers(&users_key(name))?;
        ids.sort();
        Ok(ids)
    }

    fn read(&mut self, name: &str) -> Result<Option<Feature>> {
        let key = feature_key(name);
        let record = match self.store.get(&key)? {
            Some(record) if !record.is_empty() => record,
            _ => return Ok(None),
        };

        let (mut feature, _) = decode(name, &record, false).inspect_err(|err| {
            log::warn!(target: "hanoi", key:display = key; "unable to decode feature record: {:?}", err);
        })?;
        self.attachments.attach(&mut feature);
        Ok(Some(feature))
    }

    fn write(&mut self, feature: &Feature) -> Result<()> {
        let record = encode(feature, None)?;
        self.store.set(&feature_key(feature.name()), &record)
    }

    /// Read, modify and write back the record. Not atomic.
    fn update(&mut self, name: &str, f: impl FnOnce(&mut Feature)) -> Result<()> {
        let mut feature = self
            .read(name)?
            .ok_or_else(|| Error::UnknownFeature(name.to_owned()))?;
        f(&mut feature);
        log::debug!(target: "hanoi", feature:serde = feature; "updated feature");
        self.write(&feature)
    }
}

impl<C: KeyValueStore> Backend for RedisHighPerfBackEnd<C> {
    fn add_functionality(&mut self, feature: Feature) -> Result<()> {
        check_name(feature.name())?;
        log::debug!(target: "hanoi", feature:serde = feature; "storing feature");
        self.write(&feature)?;
        self.store.del(&users_key(feature.name()))?;
        self.attachments.replace(&feature);
        Ok(())
    }

    fn get_functionality(&mut self, name: &str) -> Result<Option<Feature>> {
        self.read(name)
    }

    fn get_functionalities(&mut self) -> Result<Vec<String>> {
        Err(Error::NotSupported("get_functionalities"))
    }

    fn add(&mut self, name: &str, subject: &dyn Subject) -> Result<()> {
        let feature = self
            .read(name)?
            .ok_or_else(|| Error::UnknownFeature(name.to_owned()))?;
        let id = feature.get_item_id(subject)?;

        log::debug!(target: "hanoi", feature:display = name, id:display = id; "whitelisting subject");
        self.store.sadd(&users_key(name), &id)
    }

    fn set_rule(&mut self, name: &str, rule: Rule) -> Result<()> {
        if self.read(name)?.is_none() {
            return Err(Error::UnknownFeature(name.to_owned()));
        }
        log::debug!(target: "hanoi", feature:display = name, rule:display = rule.as_str(); "setting rule");
        self.attachments.set_rule(name, rule);
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
        let Some(feature) = self.read(name)? else {
            return Ok(false);
        };
        let set_key = users_key(name);
        let Self { store, attachments } = self;
        feature.eval(
            subject,
            attachments.rule(name),
            |id| store.sismember(&set_key, id),
            &Crc32Sharder,
        )
    }

    fn variant(&mut self, name: &str, subject: &dyn Subject) -> Result<Option<String>> {
        match self.read(name)? {
            Some(feature) => feature.eval_variant(subject, &Crc32Sharder),
            None => Ok(None),
        }
    }
}
