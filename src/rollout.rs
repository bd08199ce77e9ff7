use std::collections::HashMap;

use regex::Regex;

use crate::{
    feature::Percentage,
    guard::{Guard, SubjectSource},
    rules::Rule,
    Backend, Error, Feature, Result, Subject,
};

/// Entry point for deciding whether features are active.
///
/// `Rollout` creates features, registers subjects and rules, and answers activation queries,
/// delegating storage to a [`Backend`].
///
/// # Examples
/// ```
/// # use hanoi::{Feature, MemoryBackEnd, Rollout};
/// let mut rollout = Rollout::new(MemoryBackEnd::new());
/// rollout.add_func(Feature::new("new_checkout")?)?;
/// rollout.register("new_checkout", "alice")?;
///
/// assert!(rollout.is_enabled_for("new_checkout", "alice")?);
/// assert!(!rollout.is_enabled_for("new_checkout", "bob")?);
/// # Ok::<(), hanoi::Error>(())
/// ```
pub struct Rollout<B> {
    backend: B,
    accessors: HashMap<String, Accessor>,
}

impl<B: Backend> Rollout<B> {
    /// Create a facade over `backend`.
    pub fn new(backend: B) -> Self {
        Rollout {
            backend,
            accessors: HashMap::new(),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the underlying backend, e.g. for backend-specific inspection.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Store a feature, replacing any previous feature with the same name (its whitelist and rule
    /// are dropped too). Also registers its `is_<name>` accessor.
    pub fn add_func(&mut self, feature: Feature) -> Result<()> {
        let accessor = Accessor {
            feature: feature.name().to_owned(),
        };
        self.backend.add_functionality(feature)?;
        self.accessors
            .insert(format!("is_{}", accessor.feature), accessor);
        Ok(())
    }

    /// Whitelist a subject, or install a rule.
    ///
    /// ```
    /// # use hanoi::{Feature, MemoryBackEnd, Rollout};
    /// # use regex::Regex;
    /// # let mut rollout = Rollout::new(MemoryBackEnd::new());
    /// # rollout.add_func(Feature::new("foo")?)?;
    /// rollout.register("foo", "alice")?;
    /// rollout.register("foo", Regex::new("@example\\.com$").unwrap())?;
    /// # Ok::<(), hanoi::Error>(())
    /// ```
    pub fn register<'a>(
        &mut self,
        name: &str,
        registration: impl Into<Registration<'a>>,
    ) -> Result<()> {
        match registration.into() {
            Registration::Rule(rule) => self.backend.set_rule(name, rule),
            Registration::Subject(subject) => self.backend.add(name, &*subject),
        }
    }

    /// Whether the feature is globally enabled. `false` for unknown features.
    pub fn is_enabled(&mut self, name: &str) -> Result<bool> {
        self.backend.is_enabled(name, None)
    }

    /// Whether the feature is active for `subject`. `false` for unknown features.
    pub fn is_enabled_for<S: Subject + ?Sized>(&mut self, name: &str, subject: &S) -> Result<bool> {
        self.backend.is_enabled(name, Some(&subject))
    }

    /// See [`Backend::variant`].
    pub fn variant<S: Subject + ?Sized>(
        &mut self,
        name: &str,
        subject: &S,
    ) -> Result<Option<String>> {
        self.backend.variant(name, &subject)
    }

    /// Set the rollout percentage of an existing feature. Integers and numeric strings are
    /// accepted.
    pub fn set_percentage(
        &mut self,
        name: &str,
        percentage: impl TryInto<Percentage, Error = Error>,
    ) -> Result<()> {
        let percentage = percentage.try_into()?;
        self.backend.set_percentage(name, percentage)
    }

    /// Enable the feature. With `promote_to_all`, roll it out to every subject too.
    pub fn enable(&mut self, name: &str, promote_to_all: bool) -> Result<()> {
        self.backend.enable(name, promote_to_all)
    }

    /// Disable the feature for everybody, whitelist and rule included.
    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.backend.disable(name)
    }

    /// Flip the enabled state of the feature.
    pub fn toggle(&mut self, name: &str) -> Result<()> {
        self.backend.toggle(name)
    }

    /// Get a feature by name.
    pub fn get_functionality(&mut self, name: &str) -> Result<Option<Feature>> {
        self.backend.get_functionality(name)
    }

    /// Names of all known features. Not supported by every backend.
    pub fn get_functionalities(&mut self) -> Result<Vec<String>> {
        self.backend.get_functionalities()
    }

    /// Guard calls on the feature being active for the call's subject.
    ///
    /// The subject is the argument at `argument_index` when given, otherwise the current
    /// identifier of the [`CallContext`](crate::CallContext).
    pub fn check(&self, name: impl Into<String>, argument_index: Option<usize>) -> Guard {
        let source = match argument_index {
            Some(index) => SubjectSource::Argument(index),
            None => SubjectSource::Context,
        };
        Guard::new(name.into(), source)
    }

    /// Guard calls on the feature being globally enabled.
    pub fn enabled(&self, name: impl Into<String>) -> Guard {
        Guard::new(name.into(), SubjectSource::Global)
    }

    /// Look up an `is_<name>` accessor.
    ///
    /// Features added through [`add_func`](Rollout::add_func) are found in the accessor table.
    /// Others (stored through [`backend_mut`](Rollout::backend_mut) or by another process sharing
    /// the store) are looked up in the backend and registered on first use.
    ///
    /// ```
    /// # use hanoi::{Feature, MemoryBackEnd, Rollout};
    /// # let mut rollout = Rollout::new(MemoryBackEnd::new());
    /// rollout.add_func(Feature::new("cdc_on")?)?;
    /// rollout.register("cdc_on", "foo")?;
    ///
    /// let is_cdc_on = rollout.accessor("is_cdc_on")?;
    /// assert!(is_cdc_on.is_enabled(&mut rollout, "foo")?);
    /// assert!(rollout.accessor("is_cdc_o").is_err());
    /// # Ok::<(), hanoi::Error>(())
    /// ```
    pub fn accessor(&mut self, accessor: &str) -> Result<Accessor> {
        if let Some(found) = self.accessors.get(accessor) {
            return Ok(found.clone());
        }

        let name = accessor.strip_prefix("is_").unwrap_or(accessor);
        if !accessor.starts_with("is_") || self.backend.get_functionality(name)?.is_none() {
            return Err(Error::UnknownFeature(name.to_owned()));
        }
        let found = Accessor {
            feature: name.to_owned(),
        };
        self.accessors.insert(accessor.to_owned(), found.clone());
        Ok(found)
    }

    /// Names of all registered accessors.
    pub fn accessors(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }
}

/// What [`Rollout::register`] installs.
pub enum Registration<'a> {
    /// Install a rule.
    Rule(Rule),
    /// Whitelist a subject.
    Subject(Box<dyn Subject + 'a>),
}

impl From<Rule> for Registration<'_> {
    fn from(value: Rule) -> Self {
        Registration::Rule(value)
    }
}

impl From<Regex> for Registration<'_> {
    fn from(value: Regex) -> Self {
        Registration::Rule(value.into())
    }
}

impl<'a, T: Subject + ?Sized> From<&'a T> for Registration<'a> {
    fn from(value: &'a T) -> Self {
        Registration::Subject(Box::new(value))
    }
}

/// A check bound to one feature, named `is_<feature>`.
#[derive(Debug, Clone)]
pub struct Accessor {
    feature: String,
}

impl Accessor {
    /// Name of the bound feature.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Same as [`Rollout::is_enabled_for`] on the bound feature.
    pub fn is_enabled<B: Backend, S: Subject + ?Sized>(
        &self,
        rollout: &mut Rollout<B>,
        subject: &S,
    ) -> Result<bool> {
        rollout.is_enabled_for(&self.feature, subject)
    }
}
