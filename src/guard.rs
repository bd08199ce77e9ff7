//! Gating calls behind feature checks.
use crate::{Backend, Error, Result, Rollout, Subject};

/// Per-call context handed to [`Guard::call`].
///
/// Holds the identifier of the subject the current call acts on. It is owned by the caller, so
/// concurrent calls for different subjects each carry their own.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    current_id: Option<String>,
}

impl CallContext {
    /// A context without a current identifier.
    pub fn new() -> Self {
        CallContext::default()
    }

    /// A context acting on `id`.
    pub fn with_current_id(id: impl Into<String>) -> Self {
        CallContext {
            current_id: Some(id.into()),
        }
    }

    /// Make `id` the subject of subsequent calls.
    pub fn set_current_id(&mut self, id: impl Into<String>) {
        self.current_id = Some(id.into());
    }

    /// Forget the current identifier.
    pub fn clear_current_id(&mut self) {
        self.current_id = None;
    }

    /// The current identifier, if any.
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubjectSource {
    /// Subject-less check.
    Global,
    /// [`CallContext::current_id`].
    Context,
    /// Positional argument of the guarded call.
    Argument(usize),
}

/// A feature check wrapped around calls. Create one with [`Rollout::check`] or
/// [`Rollout::enabled`].
///
/// ```
/// # use hanoi::{CallContext, Error, Feature, MemoryBackEnd, Rollout, Subject};
/// let mut rollout = Rollout::new(MemoryBackEnd::new());
/// rollout.add_func(Feature::new("beta_search")?)?;
/// rollout.register("beta_search", "alice")?;
///
/// let guard = rollout.check("beta_search", Some(0));
/// let search = |user: &str| format!("results for {user}");
///
/// let alice = "alice";
/// let args: [&dyn Subject; 1] = [&alice];
/// let results = guard.call(&mut rollout, &CallContext::new(), &args, || search(alice))?;
/// assert_eq!(results, "results for alice");
///
/// let bob = "bob";
/// let args: [&dyn Subject; 1] = [&bob];
/// let denied = guard.call(&mut rollout, &CallContext::new(), &args, || search(bob));
/// assert!(matches!(denied, Err(Error::FeatureDisabled(_))));
/// # Ok::<(), hanoi::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Guard {
    feature: String,
    source: SubjectSource,
}

impl Guard {
    pub(crate) fn new(feature: String, source: SubjectSource) -> Self {
        Guard { feature, source }
    }

    /// Name of the guarded feature.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Run `f` if the feature is active for the call's subject.
    ///
    /// Fails with [`Error::MissingIdentifier`] if the subject can't be resolved from `args` or
    /// `context`, and with [`Error::FeatureDisabled`] if the check is negative. Global guards fail
    /// with [`Error::UnknownFeature`] for features that don't exist.
    pub fn call<B: Backend, R>(
        &self,
        rollout: &mut Rollout<B>,
        context: &CallContext,
        args: &[&dyn Subject],
        f: impl FnOnce() -> R,
    ) -> Result<R> {
        let allowed = match self.source {
            SubjectSource::Global => rollout
                .get_functionality(&self.feature)?
                .ok_or_else(|| Error::UnknownFeature(self.feature.clone()))?
                .is_enabled(),
            SubjectSource::Context => {
                let id = context.current_id().ok_or(Error::MissingIdentifier)?;
                rollout.is_enabled_for(&self.feature, id)?
            }
            SubjectSource::Argument(index) => {
                let subject = args.get(index).ok_or(Error::MissingIdentifier)?;
                rollout.is_enabled_for(&self.feature, *subject)?
            }
        };

        if !allowed {
            log::warn!(target: "hanoi", feature:display = self.feature; "guard rejected a call");
            return Err(Error::FeatureDisabled(self.feature.clone()));
        }
        Ok(f())
    }
}
