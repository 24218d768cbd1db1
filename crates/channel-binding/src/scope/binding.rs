use channel_sink::Overrides;

use crate::encapsulate::{self, Api, Encapsulated};
use crate::error::BindingError;
use crate::lock::UnlockToken;

use super::{BindingSpec, Rebinder, ScopeHandle};

/// Reusable binding tied to one rebinder.
///
/// A `Binding` pushes nothing until used. [`rebind`](Self::rebind) derives a
/// new binding with more overrides laid on top, which makes bindings
/// chainable:
///
/// ```
/// use channel_binding::Rebinder;
/// use channel_sink::{Channel, MemorySink, Overrides, Preset, StreamRegistry};
///
/// let out = MemorySink::new("out");
/// let err = MemorySink::new("err");
/// let audit = MemorySink::new("audit");
/// let rebinder = Rebinder::new(StreamRegistry::new(out.sink(), err.sink()));
///
/// let binding = rebinder
///     .binding(Preset::Diagnostics)?
///     .rebind(Overrides::new().bind(Channel::WARN, audit.sink()))?;
/// binding.run(|| {
///     rebinder.info("diagnostic").ok();
///     rebinder.warn("audited").ok();
/// })?;
///
/// assert_eq!(err.lines(), ["diagnostic"]);
/// assert_eq!(audit.lines(), ["audited"]);
/// # Ok::<(), channel_binding::BindingError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Binding {
    rebinder: Rebinder,
    overrides: Overrides,
}

impl Binding {
    pub(crate) const fn new(rebinder: Rebinder, overrides: Overrides) -> Self {
        Self {
            rebinder,
            overrides,
        }
    }

    /// Returns the overrides this binding pushes.
    #[must_use]
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Returns the rebinder this binding pushes onto.
    #[must_use]
    pub fn rebinder(&self) -> &Rebinder {
        &self.rebinder
    }

    /// Returns a binding with `spec` laid over this one.
    pub fn rebind(&self, spec: impl Into<BindingSpec>) -> Result<Self, BindingError> {
        let more = self.rebinder.overrides_for(spec)?;
        Ok(Self::new(
            self.rebinder.clone(),
            more.layered_over(&self.overrides),
        ))
    }

    /// Pushes this binding; see [`Rebinder::rebind`].
    pub fn push(&self) -> Result<ScopeHandle, BindingError> {
        self.rebinder.rebind(&self.overrides)
    }

    /// Runs `work` inside this binding; see [`Rebinder::with`].
    pub fn with<R, E, F>(&self, work: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
        E: From<BindingError>,
    {
        self.rebinder.with(&self.overrides, work)
    }

    /// Runs infallible `work` inside this binding; see [`Rebinder::run`].
    pub fn run<R, F>(&self, work: F) -> Result<R, BindingError>
    where
        F: FnOnce() -> R,
    {
        self.rebinder.run(&self.overrides, work)
    }

    /// Pushes this binding as the locked frame; see [`Rebinder::lock`].
    pub fn lock(&self) -> Result<UnlockToken, BindingError> {
        self.rebinder.lock(&self.overrides)
    }

    /// Wraps `api` so each of its methods runs inside this binding.
    ///
    /// Properties are copied as they are. A method returning the wrapped
    /// object itself returns the wrapper instead, so chained calls stay inside
    /// the binding. Calling a wrapper method with the wrapper as receiver hands
    /// the original object to the underlying method.
    #[must_use]
    pub fn encapsulate(&self, api: &Api) -> Api {
        encapsulate::wrap(api, self)
    }

    /// Wraps an arbitrary value so closures run against it inside this binding.
    #[must_use]
    pub fn wrap<T>(&self, value: T) -> Encapsulated<T> {
        Encapsulated::new(value, self.clone())
    }
}

impl From<Binding> for BindingSpec {
    fn from(binding: Binding) -> Self {
        Self::Overrides(binding.overrides)
    }
}

impl From<&Binding> for BindingSpec {
    fn from(binding: &Binding) -> Self {
        Self::Overrides(binding.overrides.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_sink::{Channel, MemorySink, Preset, StreamRegistry};

    #[test]
    fn chained_binding_layers_over_parent() {
        let out = MemorySink::new("out");
        let err = MemorySink::new("err");
        let rebinder = Rebinder::new(StreamRegistry::new(out.sink(), err.sink()));

        let data = rebinder.binding(Preset::Data).expect("preset");
        let chained = data
            .rebind(Overrides::new().bind(Channel::ERROR, out.sink()))
            .expect("overrides");

        assert_eq!(chained.overrides().get(&Channel::LOG), Some(&out.sink()));
        assert_eq!(chained.overrides().get(&Channel::ERROR), Some(&out.sink()));
        assert_eq!(data.overrides().get(&Channel::ERROR), None);
        assert_eq!(rebinder.depth(), 1);
    }

    #[test]
    fn push_returns_handle_for_exactly_one_frame() {
        let rebinder = Rebinder::new(StreamRegistry::new(
            MemorySink::new("out").sink(),
            MemorySink::new("err").sink(),
        ));
        let binding = rebinder.binding(Preset::Diagnostics).expect("preset");
        let handle = binding.push().expect("push");
        assert_eq!(rebinder.depth(), 2);
        handle.unbind().expect("pop");
        assert_eq!(rebinder.depth(), 1);
    }
}
