//! Scenarios every backend must agree on.
use std::borrow::Cow;

use regex::Regex;

use crate::{
    feature::Percentage, rules::Rule, store::testing::FakeStore, Backend, Extractor, Feature,
    Field, Subject,
};

use super::{MemoryBackEnd, RedisBackEnd, RedisHighPerfBackEnd};

struct Account {
    id: String,
    plan: Option<String>,
}

impl Subject for Account {
    fn subject_key(&self) -> Cow<'_, str> {
        Cow::Owned(format!("account-{}", self.id))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "plan" => self.plan.clone(),
            _ => None,
        }
    }
}

fn account(id: &str) -> Account {
    Account {
        id: id.to_owned(),
        plan: None,
    }
}

fn rule(pattern: &str) -> Rule {
    Regex::new(pattern).unwrap().into()
}

macro_rules! backend_scenarios {
    ($($module:ident => $backend:expr),* $(,)?) => {
        $(
            mod $module {
                use super::*;

                fn backend() -> impl Backend {
                    $backend
                }

                fn backend_with(feature: Feature) -> impl Backend {
                    let mut backend = backend();
                    backend.add_functionality(feature).unwrap();
                    backend
                }

                fn feature(percentage: u8) -> Feature {
                    Feature::new("FOO").unwrap().with_percentage(percentage).unwrap()
                }

                #[test]
                fn is_enabled_func_does_not_exist() {
                    let mut backend = backend();
                    assert!(!backend.is_enabled("FOO", None).unwrap());
                    assert!(!backend.is_enabled("FOO", Some(&"bar")).unwrap());
                }

                #[test]
                fn is_enabled_func_exists() {
                    assert!(backend_with(feature(100)).is_enabled("FOO", None).unwrap());
                }

                #[test]
                fn is_enabled_func_exists_but_is_disabled() {
                    let mut backend = backend_with(feature(50).with_enabled(false));
                    assert!(!backend.is_enabled("FOO", None).unwrap());
                }

                #[test]
                fn user_not_added_but_percentage_is_100() {
                    let mut backend = backend_with(feature(100));
                    assert!(backend.is_enabled("FOO", Some(&"bar")).unwrap());
                }

                #[test]
                fn user_not_added() {
                    let mut backend = backend_with(feature(0));
                    assert!(!backend.is_enabled("FOO", Some(&"bar")).unwrap());
                    assert!(backend.is_enabled("FOO", None).unwrap());
                }

                #[test]
                fn user_added() {
                    let mut backend = backend_with(feature(0));
                    backend.add("FOO", &"bar").unwrap();
                    assert!(backend.is_enabled("FOO", Some(&"bar")).unwrap());
                    assert!(!backend.is_enabled("FOO", Some(&"bazz")).unwrap());
                }

                #[test]
                fn whitelisted_user_of_disabled_feature() {
                    let mut backend = backend_with(feature(0));
                    backend.add("FOO", &"bar").unwrap();
                    backend.disable("FOO").unwrap();
                    assert!(!backend.is_enabled("FOO", Some(&"bar")).unwrap());
                }

                #[test]
                fn rule_that_matches() {
                    let mut backend = backend_with(feature(0));
                    backend.set_rule("FOO", rule("00$")).unwrap();
                    assert!(backend.is_enabled("FOO", Some(&"4400")).unwrap());
                }

                #[test]
                fn rule_that_doesnt_match() {
                    let mut backend = backend_with(feature(0));
                    backend.set_rule("FOO", rule("00$")).unwrap();
                    assert!(!backend.is_enabled("FOO", Some(&"44001")).unwrap());
                }

                #[test]
                fn rule_is_replaced() {
                    let mut backend = backend_with(feature(0));
                    backend.set_rule("FOO", rule("00$")).unwrap();
                    assert!(!backend.is_enabled("FOO", Some(&"0000010")).unwrap());
                    backend.set_rule("FOO", rule("10$")).unwrap();
                    assert!(backend.is_enabled("FOO", Some(&"0000010")).unwrap());
                    assert!(!backend.is_enabled("FOO", Some(&"0000000")).unwrap());
                }

                #[test]
                fn user_that_does_not_match_the_percentage() {
                    let mut backend = backend_with(feature(50));
                    assert!(!backend.is_enabled("FOO", Some(&"0")).unwrap());
                }

                #[test]
                fn user_that_does_match_the_percentage() {
                    let mut backend = backend_with(feature(50));
                    assert!(backend.is_enabled("FOO", Some(&"1")).unwrap());
                }

                #[test]
                fn decisions_are_stable() {
                    let mut backend = backend_with(feature(50));
                    for _ in 0..3 {
                        assert!(!backend.is_enabled("FOO", Some(&"0")).unwrap());
                        assert!(backend.is_enabled("FOO", Some(&"1")).unwrap());
                    }
                }

                #[test]
                fn disable() {
                    let mut backend = backend_with(feature(100));
                    backend.disable("FOO").unwrap();
                    assert!(!backend.is_enabled("FOO", None).unwrap());
                }

                #[test]
                fn enable() {
                    let mut backend = backend_with(feature(50).with_enabled(false));
                    assert!(!backend.is_enabled("FOO", None).unwrap());
                    backend.enable("FOO", false).unwrap();
                    assert!(backend.is_enabled("FOO", None).unwrap());
                    assert_eq!(backend.get_functionality("FOO").unwrap().unwrap().percentage(), 50);
                }

                #[test]
                fn enable_to_all() {
                    let mut backend = backend_with(feature(0).with_enabled(false));
                    backend.enable("FOO", true).unwrap();
                    assert!(backend.is_enabled("FOO", Some(&"anyone")).unwrap());
                    assert_eq!(backend.get_functionality("FOO").unwrap().unwrap().percentage(), 100);
                }

                #[test]
                fn toggle() {
                    let mut backend = backend_with(feature(100));
                    assert!(backend.is_enabled("FOO", None).unwrap());
                    backend.toggle("FOO").unwrap();
                    assert!(!backend.is_enabled("FOO", None).unwrap());
                    backend.toggle("FOO").unwrap();
                    assert!(backend.is_enabled("FOO", None).unwrap());
                }

                #[test]
                fn set_percentage() {
                    let mut backend = backend_with(feature(0));
                    assert!(!backend.is_enabled("FOO", Some(&"bar")).unwrap());
                    backend.set_percentage("FOO", Percentage::ALL).unwrap();
                    assert!(backend.is_enabled("FOO", Some(&"bar")).unwrap());
                }

                #[test]
                fn round_trip() {
                    let stored = feature(30)
                        .with_field(Field::attribute("id"))
                        .with_enabled(false);
                    let mut backend = backend_with(stored.clone());
                    assert_eq!(backend.get_functionality("FOO").unwrap(), Some(stored));
                    assert_eq!(backend.get_functionality("BAR").unwrap(), None);
                }

                #[test]
                fn round_trip_keeps_extractor_and_variants() {
                    let stored = feature(30)
                        .with_field(Extractor::new(|subject| subject.attribute("plan")))
                        .with_variants(["a", "b"]);
                    let mut backend = backend_with(stored.clone());
                    assert_eq!(backend.get_functionality("FOO").unwrap(), Some(stored));
                }

                #[test]
                fn whitelist_by_attribute() {
                    let mut backend = backend_with(feature(0).with_field(Field::attribute("id")));
                    backend.add("FOO", &account("42")).unwrap();
                    assert!(backend.is_enabled("FOO", Some(&account("42"))).unwrap());
                    assert!(backend.is_enabled("FOO", Some(&"42")).unwrap());
                    assert!(!backend.is_enabled("FOO", Some(&account("43"))).unwrap());
                }

                #[test]
                fn missing_attribute_fails() {
                    let mut backend = backend_with(feature(0).with_field(Field::attribute("email")));
                    assert!(backend.add("FOO", &account("42")).is_err());
                    assert!(backend.is_enabled("FOO", Some(&account("42"))).is_err());
                }

                #[test]
                fn whitelist_by_extractor() {
                    let by_plan = Extractor::new(|subject| subject.attribute("plan"));
                    let mut backend = backend_with(feature(0).with_field(by_plan));
                    let pro = Account { id: "1".into(), plan: Some("pro".into()) };
                    let free = Account { id: "2".into(), plan: Some("free".into()) };
                    backend.add("FOO", &pro).unwrap();
                    assert!(backend.add("FOO", &"pro").is_err());
                    assert!(backend.is_enabled("FOO", Some(&pro)).unwrap());
                    assert!(!backend.is_enabled("FOO", Some(&free)).unwrap());
                }

                #[test]
                fn rule_matches_the_subject_key() {
                    let mut backend = backend_with(feature(0).with_field(Field::attribute("id")));
                    backend.set_rule("FOO", rule("^account-7")).unwrap();
                    assert!(backend.is_enabled("FOO", Some(&account("77"))).unwrap());
                    assert!(!backend.is_enabled("FOO", Some(&account("17"))).unwrap());
                }

                #[test]
                fn variant() {
                    let mut backend = backend_with(feature(0).with_variants(["a", "b", "c"]));
                    // "USER-1" is in bucket 0 of 3
                    assert_eq!(backend.variant("FOO", &"USER-1").unwrap().as_deref(), Some("a"));
                    backend.disable("FOO").unwrap();
                    assert_eq!(backend.variant("FOO", &"USER-1").unwrap(), None);
                    assert_eq!(backend.variant("BAR", &"USER-1").unwrap(), None);
                }
            }
        )*
    };
}

backend_scenarios! {
    memory => MemoryBackEnd::new(),
    redis => RedisBackEnd::new(FakeStore::default()),
    redis_high_perf => RedisHighPerfBackEnd::new(FakeStore::default()),
}

#[test]
fn backends_make_identical_decisions() {
    let mut backends: Vec<Box<dyn Backend>> = vec![
        Box::new(MemoryBackEnd::new()),
        Box::new(RedisBackEnd::new(FakeStore::default())),
        Box::new(RedisHighPerfBackEnd::new(FakeStore::default())),
    ];
    for backend in &mut backends {
        let feature = Feature::new("FOO").unwrap().with_percentage(30).unwrap();
        backend.add_functionality(feature).unwrap();
        backend.add("FOO", &"17").unwrap();
        backend.set_rule("FOO", rule("^9")).unwrap();
    }

    for i in 0..500 {
        let id = i.to_string();
        let decisions: Vec<bool> = backends
            .iter_mut()
            .map(|backend| backend.is_enabled("FOO", Some(&id)).unwrap())
            .collect();
        assert!(
            decisions.iter().all(|decision| *decision == decisions[0]),
            "backends disagree on {id}: {decisions:?}"
        );
    }
}
