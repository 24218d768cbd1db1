use crate::error::BindingError;
use crate::scope::Binding;

/// Value whose every access runs inside a binding.
///
/// The typed counterpart of [`Binding::encapsulate`]: instead of wrapping
/// named methods, each closure passed to [`call`](Self::call) runs against the
/// value with the binding pushed for exactly that call.
#[derive(Clone, Debug)]
pub struct Encapsulated<T> {
    inner: T,
    binding: Binding,
}

impl<T> Encapsulated<T> {
    /// Wraps `inner` under `binding`.
    pub const fn new(inner: T, binding: Binding) -> Self {
        Self { inner, binding }
    }

    /// Runs `f` against the value inside the binding.
    pub fn call<R, F>(&self, f: F) -> Result<R, BindingError>
    where
        F: FnOnce(&T) -> R,
    {
        self.binding.run(|| f(&self.inner))
    }

    /// Runs fallible `f` against the value inside the binding.
    pub fn try_call<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&T) -> Result<R, E>,
        E: From<BindingError>,
    {
        self.binding.with(|| f(&self.inner))
    }

    /// Runs `f` against the value mutably inside the binding.
    pub fn call_mut<R, F>(&mut self, f: F) -> Result<R, BindingError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let Self { inner, binding } = self;
        binding.run(|| f(inner))
    }

    /// Returns the binding calls run under.
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Returns the value without the binding.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
