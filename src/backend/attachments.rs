use std::collections::HashMap;

use crate::{feature::Extractor, rules::Rule, Feature, Field};

/// Per-feature state the persisted record cannot hold: rules, extractors and variants. Kept by
/// each remote backend instance and lost with it.
#[derive(Debug, Default)]
pub(crate) struct Attachments {
    entries: HashMap<String, Attachment>,
}

#[derive(Debug, Default)]
struct Attachment {
    rule: Option<Rule>,
    extractor: Option<Extractor>,
    variants: Vec<String>,
}

impl Attachments {
    /// Record the in-process parts of a newly stored feature. Drops any previous rule.
    pub(crate) fn replace(&mut self, feature: &Feature) {
        let extractor = match feature.field() {
            Field::Extractor(extractor) => Some(extractor.clone()),
            Field::Key | Field::Attribute(_) => None,
        };
        self.entries.insert(
            feature.name().to_owned(),
            Attachment {
                rule: None,
                extractor,
                variants: feature.variants().to_vec(),
            },
        );
    }

    pub(crate) fn set_rule(&mut self, name: &str, rule: Rule) {
        self.entries.entry(name.to_owned()).or_default().rule = Some(rule);
    }

    pub(crate) fn rule(&self, name: &str) -> Option<&Rule> {
        self.entries.get(name)?.rule.as_ref()
    }

    /// Restore the in-process parts on a feature decoded from its record.
    pub(crate) fn attach(&self, feature: &mut Feature) {
        let Some(attachment) = self.entries.get(feature.name()) else {
            return;
        };
        let decoded_as_key = matches!(feature.field(), Field::Key);
        if let (Some(extractor), true) = (&attachment.extractor, decoded_as_key) {
            feature.set_field(Field::Extractor(extractor.clone()));
        }
        feature.set_variants(attachment.variants.clone());
    }
}
