//! Persisted record format shared with other rollout implementations:
//! `enabled|percentage|field` followed by `|comma,joined,whitelist` in [`RedisBackEnd`]
//! records.
//!
//! [`RedisBackEnd`]: super::RedisBackEnd
use crate::{feature::Percentage, Error, Feature, Field, Result};

const PREFIX: &str = "rollout:";
const SET_PREFIX: &str = "rollout:users:";

pub(crate) fn feature_key(name: &str) -> String {
    format!("{PREFIX}{name}")
}

pub(crate) fn users_key(name: &str) -> String {
    format!("{SET_PREFIX}{name}")
}

/// Pattern matching every feature record.
pub(crate) fn feature_pattern() -> String {
    format!("{PREFIX}*")
}

/// Feature name of a record key. `None` for whitelist sets, which share the prefix.
pub(crate) fn name_from_key(key: &str) -> Option<&str> {
    if key.starts_with(SET_PREFIX) {
        return None;
    }
    key.strip_prefix(PREFIX)
}

/// Reject names whose record key would fall among the whitelist sets.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if feature_key(name).starts_with(SET_PREFIX) {
        Err(Error::ReservedName(name.to_owned()))
    } else {
        Ok(())
    }
}

/// Reject values that would break the record layout.
pub(crate) fn check_encodable(value: &str) -> Result<()> {
    if value.contains(['|', ',']) {
        Err(Error::Unencodable(value.to_owned()))
    } else {
        Ok(())
    }
}

pub(crate) fn encode(feature: &Feature, whitelist: Option<&[String]>) -> Result<String> {
    let field = feature.field().persisted_name();
    check_encodable(field)?;

    let mut record = format!(
        "{}|{}|{}",
        if feature.is_enabled() { '1' } else { '0' },
        feature.percentage(),
        field,
    );
    if let Some(whitelist) = whitelist {
        record.push('|');
        record.push_str(&whitelist.join(","));
    }
    Ok(record)
}

/// Decode a record. `with_whitelist` selects the four-field layout.
pub(crate) fn decode(
    name: &str,
    record: &str,
    with_whitelist: bool,
) -> Result<(Feature, Vec<String>)> {
    let corrupt = || Error::CorruptRecord {
        key: feature_key(name),
        record: record.to_owned(),
    };

    let parts: Vec<&str> = record.split('|').collect();
    let (enabled, percentage, field, users) = match (parts.as_slice(), with_whitelist) {
        ([enabled, percentage, field, users], true) => (*enabled, *percentage, *field, *users),
        ([enabled, percentage, field], false) => (*enabled, *percentage, *field, ""),
        _ => return Err(corrupt()),
    };

    let percentage: Percentage = percentage.parse().map_err(|_| corrupt())?;
    let field = match field {
        "" => Field::Key,
        attribute => Field::attribute(attribute),
    };

    let mut feature = Feature::new(name)?
        .with_field(field)
        .with_enabled(enabled == "1");
    feature.set_validated_percentage(percentage);

    let users = if users.is_empty() {
        Vec::new()
    } else {
        users.split(',').map(ToOwned::to_owned).collect()
    };

    Ok((feature, users))
}
