use std::borrow::Cow;

/// Something a feature can be enabled for: a user, an account, an item.
///
/// Implement it for your own types to control how they are identified:
///
/// ```
/// # use std::borrow::Cow;
/// # use hanoi::Subject;
/// struct User {
///     id: String,
///     country: String,
/// }
///
/// impl Subject for User {
///     fn subject_key(&self) -> Cow<'_, str> {
///         Cow::Borrowed(&self.id)
///     }
///
///     fn attribute(&self, name: &str) -> Option<String> {
///         match name {
///             "id" => Some(self.id.clone()),
///             "country" => Some(self.country.clone()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Subject {
    /// String form of the subject. Rules are matched against it and it is the identifier of
    /// features that don't declare a field.
    fn subject_key(&self) -> Cow<'_, str>;

    /// Value of a named attribute, used by [`Field::Attribute`](crate::Field::Attribute).
    fn attribute(&self, _name: &str) -> Option<String> {
        None
    }

    /// Plain identifiers are used verbatim by features that read an attribute. Extractors still
    /// see them.
    fn is_identifier(&self) -> bool {
        false
    }
}

impl<T: Subject + ?Sized> Subject for &T {
    fn subject_key(&self) -> Cow<'_, str> {
        (**self).subject_key()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }

    fn is_identifier(&self) -> bool {
        (**self).is_identifier()
    }
}

impl Subject for str {
    fn subject_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn is_identifier(&self) -> bool {
        true
    }
}

impl Subject for String {
    fn subject_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn is_identifier(&self) -> bool {
        true
    }
}

macro_rules! impl_subject_for_integers {
    ($($ty:ty),*) => {
        $(
            impl Subject for $ty {
                fn subject_key(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }

                fn is_identifier(&self) -> bool {
                    true
                }
            }
        )*
    };
}

impl_subject_for_integers!(i32, i64, u32, u64, usize);
