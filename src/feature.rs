use std::{fmt, str::FromStr, sync::Arc};

use serde::{Serialize, Serializer};

use crate::{Error, Result, Subject};

/// A named togglable capability and the state its activation rules depend on.
///
/// The name is fixed at construction. Percentage is validated on every write.
///
/// ```
/// # use hanoi::{Feature, Field};
/// let feature = Feature::new("new_checkout")?
///     .with_field(Field::attribute("id"))
///     .with_percentage(25)?
///     .with_variants(["control", "treatment"]);
/// assert_eq!(feature.percentage(), 25);
/// # Ok::<(), hanoi::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    name: String,
    field: Field,
    percentage: Percentage,
    enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    variants: Vec<String>,
}

impl Feature {
    /// Create an enabled feature with percentage `0`, identifying subjects by their string form.
    pub fn new(name: impl Into<String>) -> Result<Feature> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        Ok(Feature {
            name,
            field: Field::Key,
            percentage: Percentage::ZERO,
            enabled: true,
            variants: Vec::new(),
        })
    }

    /// How subjects are identified, see [`Field`].
    pub fn with_field(mut self, field: impl Into<Field>) -> Self {
        self.field = field.into();
        self
    }

    /// Rollout percentage, validated like [`set_percentage`](Feature::set_percentage).
    pub fn with_percentage(
        mut self,
        percentage: impl TryInto<Percentage, Error = Error>,
    ) -> Result<Self> {
        self.set_percentage(percentage)?;
        Ok(self)
    }

    /// Start enabled or disabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Labels for deterministic bucket assignment, see [`Backend::variant`](crate::Backend::variant).
    pub fn with_variants(mut self, variants: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// The name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How subjects are identified.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Rollout percentage, in `0..=100`.
    pub fn percentage(&self) -> u8 {
        self.percentage.value()
    }

    /// Whether the feature is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Variant labels, in bucket order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Set the rollout percentage. Integers and numeric strings are accepted; values outside
    /// `0..=100` fail with [`Error::InvalidPercentage`] and leave the feature unchanged.
    pub fn set_percentage(
        &mut self,
        percentage: impl TryInto<Percentage, Error = Error>,
    ) -> Result<()> {
        self.percentage = percentage.try_into()?;
        Ok(())
    }

    pub(crate) fn set_validated_percentage(&mut self, percentage: Percentage) {
        self.percentage = percentage;
    }

    /// Enable or disable the feature.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip the enabled state.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub(crate) fn set_field(&mut self, field: Field) {
        self.field = field;
    }

    pub(crate) fn set_variants(&mut self, variants: Vec<String>) {
        self.variants = variants;
    }

    /// Identifier used for whitelist lookups and percentage hashing.
    ///
    /// An extractor is invoked on every subject, plain identifiers included. An attribute is read
    /// off the subject, failing if the subject doesn't expose it; plain identifiers (strings,
    /// integers) skip that lookup and are used as is. Otherwise the subject's string form is used.
    pub fn get_item_id(&self, subject: &dyn Subject) -> Result<String> {
        match &self.field {
            Field::Key => Ok(subject.subject_key().into_owned()),
            Field::Attribute(_) if subject.is_identifier() => Ok(subject.subject_key().into_owned()),
            Field::Attribute(attribute) => {
                subject
                    .attribute(attribute)
                    .ok_or_else(|| Error::MissingAttribute {
                        feature: self.name.clone(),
                        attribute: attribute.clone(),
                    })
            }
            Field::Extractor(extractor) => extractor
                .extract(subject)
                .ok_or_else(|| Error::UnresolvedIdentifier(self.name.clone())),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}> applying {} to {}% users",
            self.name, self.field, self.percentage
        )
    }
}

/// How a feature derives an identifier from a subject.
#[derive(Debug, Clone, Default)]
pub enum Field {
    /// Use the subject's string form.
    #[default]
    Key,
    /// Read a named attribute off the subject. Persisted by the Redis backends.
    Attribute(String),
    /// Caller-supplied extraction. Lives in-process only.
    Extractor(Extractor),
}

impl Field {
    /// Shorthand for [`Field::Attribute`].
    pub fn attribute(name: impl Into<String>) -> Field {
        Field::Attribute(name.into())
    }

    /// Name persisted in the field slot of a stored record.
    pub(crate) fn persisted_name(&self) -> &str {
        match self {
            Field::Attribute(name) => name,
            Field::Key | Field::Extractor(_) => "",
        }
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Field::Key, Field::Key) => true,
            (Field::Attribute(a), Field::Attribute(b)) => a == b,
            (Field::Extractor(a), Field::Extractor(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<Extractor> for Field {
    fn from(value: Extractor) -> Self {
        Field::Extractor(value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Key => f.write_str("subject key"),
            Field::Attribute(name) => write!(f, "attribute {name:?}"),
            Field::Extractor(_) => f.write_str("extractor"),
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Field::Key => serializer.serialize_none(),
            Field::Attribute(name) => serializer.serialize_str(name),
            Field::Extractor(_) => serializer.serialize_str("<extractor>"),
        }
    }
}

/// A caller-supplied function from subject to identifier.
///
/// It receives every subject the feature resolves, including plain string and integer
/// identifiers, so it can normalize them.
///
/// ```
/// # use hanoi::{Extractor, Feature};
/// let by_tenant = Extractor::new(|subject| subject.attribute("tenant"));
/// let feature = Feature::new("reports")?.with_field(by_tenant);
/// # Ok::<(), hanoi::Error>(())
/// ```
#[derive(Clone)]
pub struct Extractor(Arc<dyn Fn(&dyn Subject) -> Option<String> + Send + Sync>);

impl Extractor {
    /// Wrap a closure. Returning `None` fails resolution with
    /// [`Error::UnresolvedIdentifier`].
    pub fn new(f: impl Fn(&dyn Subject) -> Option<String> + Send + Sync + 'static) -> Self {
        Extractor(Arc::new(f))
    }

    /// Run the closure on `subject`.
    pub fn extract(&self, subject: &dyn Subject) -> Option<String> {
        (self.0)(subject)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor(..)")
    }
}

/// An integer percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// Nobody outside the whitelist and rule.
    pub const ZERO: Percentage = Percentage(0);
    /// Everybody.
    pub const ALL: Percentage = Percentage(100);

    /// The percentage as an integer.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

macro_rules! impl_percentage_from_integers {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<$ty> for Percentage {
                type Error = Error;

                fn try_from(value: $ty) -> Result<Percentage> {
                    match i64::try_from(value) {
                        Ok(v @ 0..=100) => Ok(Percentage(v as u8)),
                        _ => Err(Error::InvalidPercentage(value.to_string())),
                    }
                }
            }
        )*
    };
}

impl_percentage_from_integers!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

/// Numeric strings are coerced, surrounding whitespace is ignored.
impl FromStr for Percentage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Percentage> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidPercentage(s.to_owned()))?;
        Percentage::try_from(value)
    }
}

impl TryFrom<&str> for Percentage {
    type Error = Error;

    fn try_from(value: &str) -> Result<Percentage> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use crate::{Error, Subject};

    use super::{Extractor, Feature, Field, Percentage};

    struct Foo {
        id: String,
    }

    impl Subject for Foo {
        fn subject_key(&self) -> Cow<'_, str> {
            Cow::Borrowed(&self.id)
        }

        fn attribute(&self, name: &str) -> Option<String> {
            (name == "id").then(|| format!("id-{}", self.id))
        }
    }

    #[test]
    fn name_is_kept() {
        assert_eq!(Feature::new("foo").unwrap().name(), "foo");
        assert_eq!(Feature::new("üéê").unwrap().name(), "üéê");
    }

    #[test]
    fn name_should_not_be_empty() {
        assert!(matches!(Feature::new(""), Err(Error::InvalidName)));
    }

    #[test]
    fn defaults() {
        let f = Feature::new("foo").unwrap();
        assert_eq!(f.percentage(), 0);
        assert!(f.is_enabled());
        assert_eq!(f.field(), &Field::Key);
        assert!(f.variants().is_empty());
    }

    #[test]
    fn percentage_is_casted_to_integer_if_valid_number_as_string() {
        let f = Feature::new("foo").unwrap().with_percentage("100").unwrap();
        assert_eq!(f.percentage(), 100);
        assert_eq!(" 42 ".parse::<Percentage>().unwrap().value(), 42);
    }

    #[test]
    fn percentage_should_be_a_number() {
        assert!(matches!(
            Feature::new("foo").unwrap().with_percentage("bar"),
            Err(Error::InvalidPercentage(value)) if value == "bar"
        ));
    }

    #[test]
    fn percentage_should_be_within_bounds() {
        assert!(Feature::new("foo").unwrap().with_percentage(101).is_err());
        assert!(Feature::new("foo").unwrap().with_percentage(-1).is_err());
        assert!(Percentage::try_from(u64::MAX).is_err());
        assert_eq!(Percentage::try_from(100u8).unwrap(), Percentage::ALL);
    }

    #[test]
    fn percentage_is_validated_on_every_write() {
        let mut f = Feature::new("foo").unwrap().with_percentage(20).unwrap();
        assert!(f.set_percentage(200).is_err());
        assert_eq!(f.percentage(), 20);
        f.set_percentage("70").unwrap();
        assert_eq!(f.percentage(), 70);
    }

    #[test]
    fn toggle_flips_enabled() {
        let mut f = Feature::new("foo").unwrap();
        f.toggle();
        assert!(!f.is_enabled());
        f.toggle();
        assert!(f.is_enabled());
    }

    #[test]
    fn item_id_of_plain_identifiers() {
        let f = Feature::new("foo")
            .unwrap()
            .with_field(Field::attribute("id"));
        assert_eq!(f.get_item_id(&"bar").unwrap(), "bar");
        assert_eq!(f.get_item_id(&42u64).unwrap(), "42");
    }

    #[test]
    fn item_id_from_attribute() {
        let f = Feature::new("foo")
            .unwrap()
            .with_field(Field::attribute("id"));
        let subject = Foo { id: "1".into() };
        assert_eq!(f.get_item_id(&subject).unwrap(), "id-1");
    }

    #[test]
    fn item_id_fails_on_missing_attribute() {
        let f = Feature::new("foo")
            .unwrap()
            .with_field(Field::attribute("email"));
        let subject = Foo { id: "1".into() };
        assert!(matches!(
            f.get_item_id(&subject),
            Err(Error::MissingAttribute { attribute, .. }) if attribute == "email"
        ));
    }

    #[test]
    fn item_id_from_extractor() {
        let f = Feature::new("foo").unwrap().with_field(Extractor::new(|subject| {
            Some(subject.subject_key().to_uppercase())
        }));
        let subject = Foo { id: "abc".into() };
        assert_eq!(f.get_item_id(&subject).unwrap(), "ABC");

        let none = Feature::new("foo")
            .unwrap()
            .with_field(Extractor::new(|_| None));
        assert!(matches!(
            none.get_item_id(&subject),
            Err(Error::UnresolvedIdentifier(_))
        ));
    }

    #[test]
    fn extractor_applies_to_plain_identifiers() {
        let f = Feature::new("foo").unwrap().with_field(Extractor::new(|subject| {
            Some(subject.subject_key().to_lowercase())
        }));
        assert_eq!(f.get_item_id(&"Alice@Example.com").unwrap(), "alice@example.com");
        assert_eq!(f.get_item_id(&"Alice@Example.com".to_owned()).unwrap(), "alice@example.com");

        let by_attribute = Feature::new("foo")
            .unwrap()
            .with_field(Extractor::new(|subject| subject.attribute("id")));
        assert!(matches!(
            by_attribute.get_item_id(&"bar"),
            Err(Error::UnresolvedIdentifier(_))
        ));
    }

    #[test]
    fn item_id_defaults_to_subject_key() {
        let f = Feature::new("foo").unwrap();
        let subject = Foo { id: "abc".into() };
        assert_eq!(f.get_item_id(&subject).unwrap(), "abc");
    }

    #[test]
    fn display() {
        let f = Feature::new("foo").unwrap().with_percentage(20).unwrap();
        assert_eq!(f.to_string(), "<foo> applying subject key to 20% users");
    }
}
