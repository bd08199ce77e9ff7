use crate::{
    feature::Percentage, rules::Rule, sharder::Crc32Sharder, store::KeyValueStore, Error,
    Feature, Result, Subject,
};

use super::{
    attachments::Attachments,
    record::{self, check_encodable, check_name, decode, encode, feature_key},
    Backend,
};

/// Redis backend storing each feature as a single string record
/// `enabled|percentage|field|whitelist` under `rollout:<name>`.
///
/// - Every feature lives under its own key, [`get_functionalities`](Backend::get_functionalities)
///   finds them with `KEYS rollout:*`. That scans the whole keyspace; keep it off hot paths on
///   large databases.
/// - Whitelisting is O(N) in the number of whitelisted subjects: the record is read, the
///   identifier appended and the record written back. Use
///   [`RedisHighPerfBackEnd`](crate::RedisHighPerfBackEnd) for large whitelists.
/// - Rules, extractors and variants are not persisted; they live in this instance.
/// - Names starting with `users:` are rejected with [`Error::ReservedName`], they would collide
///   with the whitelist sets of [`RedisHighPerfBackEnd`](crate::RedisHighPerfBackEnd).
pub struct RedisBackEnd<C = redis::Connection> {
    store: C,
    attachments: Attachments,
}

impl<C: KeyValueStore> RedisBackEnd<C> {
    /// Create a backend on top of an existing connection.
    ///
    /// See [`RedisConfig`](crate::RedisConfig) to open one.
    pub fn new(store: C) -> Self {
        RedisBackEnd {
            store,
            attachments: Attachments::default(),
        }
    }

    /// Whitelisted identifiers of a feature, in the order they were added.
    pub fn whitelist(&mut self, name: &str) -> Result<Vec<String>> {
        Ok(self.read(name)?.map(|(_, users)| users).unwrap_or_default())
    }

    fn read(&mut self, name: &str) -> Result<Option<(Feature, Vec<String>)>> {
        let key = feature_key(name);
        let record = match self.store.get(&key)? {
            Some(record) if !record.is_empty() => record,
            _ => return Ok(None),
        };

        let (mut feature, users) = decode(name, &record, true).inspect_err(|err| {
            log::warn!(target: "hanoi", key:display = key; "unable to decode feature record: {:?}", err);
        })?;
        self.attachments.attach(&mut feature);
        Ok(Some((feature, users)))
    }

    fn write(&mut self, feature: &Feature, users: &[String]) -> Result<()> {
        let record = encode(feature, Some(users))?;
        self.store.set(&feature_key(feature.name()), &record)
    }

    /// Read, modify and write back a whole record. Not atomic.
    fn update(&mut self, name: &str, f: impl FnOnce(&mut Feature)) -> Result<()> {
        let (mut feature, users) = self
            .read(name)?
            .ok_or_else(|| Error::UnknownFeature(name.to_owned()))?;
        f(&mut feature);
        log::debug!(target: "hanoi", feature:serde = feature; "updated feature");
        self.write(&feature, &users)
    }
}

impl<C: KeyValueStore> Backend for RedisBackEnd<C> {
    fn add_functionality(&mut self, feature: Feature) -> Result<()> {
        check_name(feature.name())?;
        log::debug!(target: "hanoi", feature:serde = feature; "storing feature");
        self.write(&feature, &[])?;
        self.attachments.replace(&feature);
        Ok(())
    }

    fn get_functionality(&mut self, name: &str) -> Result<Option<Feature>> {
        Ok(self.read(name)?.map(|(feature, _)| feature))
    }

    fn get_functionalities(&mut self) -> Result<Vec<String>> {
        let keys = self.store.keys(&record::feature_pattern())?;
        let mut names: Vec<String> = keys
            .iter()
            .filter_map(|key| record::name_from_key(key))
            .map(ToOwned::to_owned)
            .collect();
        names.sort();
        Ok(names)
    }

    fn add(&mut self, name: &str, subject: &dyn Subject) -> Result<()> {
        let (feature, mut users) = self
            .read(name)?
            .ok_or_else(|| Error::UnknownFeature(name.to_owned()))?;

        let id = feature.get_item_id(subject)?;
        if users.contains(&id) {
            return Ok(());
        }
        check_encodable(&id)?;

        log::debug!(target: "hanoi", feature:display = name, id:display = id; "whitelisting subject");
        users.push(id);
        self.write(&feature, &users)
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
        let Some((feature, users)) = self.read(name)? else {
            return Ok(false);
        };
        feature.eval(
            subject,
            self.attachments.rule(name),
            |id| Ok(users.iter().any(|user| user == id)),
            &Crc32Sharder,
        )
    }

    fn variant(&mut self, name: &str, subject: &dyn Subject) -> Result<Option<String>> {
        match self.read(name)? {
            Some((feature, _)) => feature.eval_variant(subject, &Crc32Sharder),
            None => Ok(None),
        }
    }
}
