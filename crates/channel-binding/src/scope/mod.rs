//! crates/channel-binding/src/scope/mod.rs
//!
//! Scoped rebinding over per-thread binding stacks.
//!
//! A [`Rebinder`] owns one binding stack per thread, the console whose channel
//! members are intercepted, and the lock slot. Pushing a frame installs an
//! interceptor on every channel the new top frame binds; popping it restores
//! the members those interceptors replaced. Interceptors resolve their sink
//! through the emitting thread's stack on every call, so a frame affects
//! exactly the emits its own thread makes while it is on top.
//!
//! The state mutex is never held while user closures or emitters run. Emits
//! from inside a scope, from nested scopes and from other threads therefore
//! never contend with the scope bookkeeping for longer than a stack lookup.

mod binding;
mod handle;
mod spec;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use channel_sink::{Channel, Overrides, Sink, SinkSlot, StreamRegistry};

use crate::console::{Console, FrameProvider};
use crate::encapsulate::Api;
use crate::error::{BindingError, EmitError};
use crate::frame::{Frame, FrameHandle};
use crate::stack::ThreadStacks;
use crate::trace;

pub use self::binding::Binding;
pub use self::handle::{ScopeGuard, ScopeHandle};
pub use self::spec::BindingSpec;

/// Cheaply cloneable handle to one binding stack and its console.
///
/// Clones share the same stacks; independent stacks come from separate
/// [`Rebinder::new`] calls.
///
/// # Threads
///
/// Every thread sees its own binding stack. A frame pushed on one thread
/// changes where that thread's emits land and nothing else: other threads keep
/// resolving through their own frames, or the registry defaults when they have
/// none, and a scope closing on one thread never discards another thread's
/// frames. The console members and the lock are shared, so at most one
/// [`UnlockToken`](crate::UnlockToken) is outstanding across all threads.
///
/// # Examples
///
/// ```
/// use channel_binding::Rebinder;
/// use channel_sink::{MemorySink, Preset, StreamRegistry};
///
/// let out = MemorySink::new("out");
/// let err = MemorySink::new("err");
/// let rebinder = Rebinder::new(StreamRegistry::new(out.sink(), err.sink()));
///
/// rebinder.log("to stdout")?;
/// rebinder.run(Preset::Diagnostics, || rebinder.log("to stderr"))??;
/// rebinder.log("to stdout again")?;
///
/// assert_eq!(out.lines(), ["to stdout", "to stdout again"]);
/// assert_eq!(err.lines(), ["to stderr"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Rebinder {
    shared: Arc<Shared>,
}

struct Shared {
    registry: Arc<StreamRegistry>,
    provider: Arc<dyn FrameProvider>,
    state: Mutex<State>,
}

pub(crate) struct State {
    pub(crate) stacks: ThreadStacks,
    pub(crate) console: Console,
    pub(crate) lock: Option<Outstanding>,
}

/// Lock currently held, if any.
pub(crate) struct Outstanding {
    pub(crate) token: u64,
    pub(crate) frame: FrameHandle,
}

/// Resolves channels against the live top frame of a rebinder.
struct StackProvider(Weak<Shared>);

impl FrameProvider for StackProvider {
    fn resolve(&self, channel: &Channel) -> Option<Sink> {
        let shared = self.0.upgrade()?;
        let state = shared.lock_state();
        state.stacks.resolve(channel)
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Rebinder {
    /// Creates a rebinder with a standard console over `registry`.
    #[must_use]
    pub fn new(registry: StreamRegistry) -> Self {
        Self::with_console(Console::standard(Arc::new(registry)))
    }

    /// Creates a rebinder that intercepts the members of `console`.
    #[must_use]
    pub fn with_console(console: Console) -> Self {
        let registry = Arc::clone(console.registry());
        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| Shared {
            registry: Arc::clone(&registry),
            provider: Arc::new(StackProvider(weak.clone())),
            state: Mutex::new(State {
                stacks: ThreadStacks::new(registry),
                console,
                lock: None,
            }),
        });
        Self { shared }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.shared.lock_state()
    }

    /// Returns the registry supplying process defaults.
    #[must_use]
    pub fn registry(&self) -> &StreamRegistry {
        &self.shared.registry
    }

    /// Returns the sink `channel` resolves to on the calling thread right now.
    #[must_use]
    pub fn resolve(&self, channel: &Channel) -> Option<Sink> {
        self.state().stacks.resolve(channel)
    }

    /// Returns the calling thread's number of frames, including the
    /// process-default frame.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state().stacks.depth()
    }

    /// Returns the sink the calling thread sees in a process-visible slot.
    ///
    /// Outside of an emit call this is always the registry default.
    #[must_use]
    pub fn stream(&self, slot: SinkSlot) -> Sink {
        let streams = self.state().console.streams().clone();
        streams.get(slot)
    }

    /// Returns a snapshot of the console, interceptors included.
    #[must_use]
    pub fn console(&self) -> Console {
        self.state().console.clone()
    }

    /// Emits `bytes` through the console member for `channel`.
    pub fn emit(&self, channel: &Channel, bytes: &[u8]) -> Result<(), EmitError> {
        let (emitter, streams) = {
            let state = self.state();
            (
                state.console.emitter(channel)?.clone(),
                state.console.streams().clone(),
            )
        };
        emitter.call(&streams, bytes)?;
        Ok(())
    }

    /// Emits on [`Channel::LOG`].
    pub fn log(&self, message: impl AsRef<[u8]>) -> Result<(), EmitError> {
        self.emit(&Channel::LOG, message.as_ref())
    }

    /// Emits on [`Channel::INFO`].
    pub fn info(&self, message: impl AsRef<[u8]>) -> Result<(), EmitError> {
        self.emit(&Channel::INFO, message.as_ref())
    }

    /// Emits on [`Channel::WARN`].
    pub fn warn(&self, message: impl AsRef<[u8]>) -> Result<(), EmitError> {
        self.emit(&Channel::WARN, message.as_ref())
    }

    /// Emits on [`Channel::ERROR`].
    pub fn error(&self, message: impl AsRef<[u8]>) -> Result<(), EmitError> {
        self.emit(&Channel::ERROR, message.as_ref())
    }

    /// Expands `spec` against this rebinder's registry.
    pub fn overrides_for(&self, spec: impl Into<BindingSpec>) -> Result<Overrides, BindingError> {
        spec.into().resolve(self.registry())
    }

    /// Pushes a frame and returns the handle that pops it.
    ///
    /// Nothing is pushed or installed when any bound channel cannot be
    /// intercepted.
    pub fn rebind(&self, spec: impl Into<BindingSpec>) -> Result<ScopeHandle, BindingError> {
        let overrides = self.overrides_for(spec)?;
        let frame = self.push_overrides(&overrides)?;
        Ok(ScopeHandle::new(self.clone(), frame))
    }

    /// Pops the frame pushed by the rebind `handle` belongs to.
    pub fn unbind(&self, handle: &ScopeHandle) -> Result<(), BindingError> {
        let mut state = self.state();
        Self::pop_locked(&mut state, handle.frame())
    }

    /// Pushes a frame popped when the returned guard is dropped or closed.
    pub fn scope(&self, spec: impl Into<BindingSpec>) -> Result<ScopeGuard, BindingError> {
        let overrides = self.overrides_for(spec)?;
        let frame = self.push_overrides(&overrides)?;
        Ok(ScopeGuard::new(self.clone(), frame))
    }

    /// Runs `work` with `spec` pushed and returns its result.
    ///
    /// The frame is popped on every exit path, including a panic unwinding
    /// through `work`. Frames `work` pushed and never popped are discarded
    /// first. When `work` fails, its error is returned even if cleanup also
    /// failed.
    pub fn with<R, E, F>(&self, spec: impl Into<BindingSpec>, work: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
        E: From<BindingError>,
    {
        let guard = self.scope(spec)?;
        let result = work();
        let closed = guard.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Infallible-work variant of [`with`](Self::with).
    pub fn run<R, F>(&self, spec: impl Into<BindingSpec>, work: F) -> Result<R, BindingError>
    where
        F: FnOnce() -> R,
    {
        self.with(spec, || Ok(work()))
    }

    /// Returns a reusable binding value for `spec`.
    pub fn binding(&self, spec: impl Into<BindingSpec>) -> Result<Binding, BindingError> {
        let overrides = self.overrides_for(spec)?;
        Ok(Binding::new(self.clone(), overrides))
    }

    /// Wraps `api` so every method call runs inside `spec`.
    ///
    /// See [`Binding::encapsulate`].
    pub fn encapsulate(&self, api: &Api, spec: impl Into<BindingSpec>) -> Result<Api, BindingError> {
        Ok(self.binding(spec)?.encapsulate(api))
    }

    pub(crate) fn push_overrides(&self, overrides: &Overrides) -> Result<FrameHandle, BindingError> {
        let mut state = self.state();
        self.push_locked(&mut state, overrides)
    }

    /// Pushes `overrides` and intercepts every channel the new top binds.
    ///
    /// On an install failure the interceptors already installed are removed
    /// and the frame is popped again before the error is returned.
    pub(crate) fn push_locked(
        &self,
        state: &mut State,
        overrides: &Overrides,
    ) -> Result<FrameHandle, BindingError> {
        let stack = state.stacks.current();
        let frame = stack.push(overrides);
        let channels: Vec<Channel> = stack.top().bindings().channels().cloned().collect();
        for (installed, channel) in channels.iter().enumerate() {
            if let Err(error) = state
                .console
                .install(channel, Arc::clone(&self.shared.provider))
            {
                for channel in channels[..installed].iter().rev() {
                    state.console.uninstall(channel);
                }
                let rolled_back = state.stacks.pop(frame);
                debug_assert!(rolled_back.is_ok(), "a freshly pushed frame is on top");
                return Err(error.into());
            }
        }
        trace::frame_pushed(frame.id(), state.stacks.depth());
        Ok(frame)
    }

    /// Pops `frame` if it is on top and removes its interceptors.
    pub(crate) fn pop_locked(state: &mut State, frame: FrameHandle) -> Result<(), BindingError> {
        match state.stacks.pop(frame) {
            Ok((popped, depth)) => {
                retire(&mut state.console, &popped);
                trace::frame_popped(popped.id(), depth);
                Ok(())
            }
            Err(error) => {
                if let BindingError::StackDiscipline { expected, top } = &error {
                    trace::pop_refused(*expected, *top);
                }
                Err(error)
            }
        }
    }

    /// Closes a scope opened by [`scope`](Self::scope).
    ///
    /// Frames pushed above `frame` on its own thread's stack are discarded
    /// innermost first before `frame` itself is popped. A lock whose frame is
    /// discarded this way is released.
    pub(crate) fn close_scope(&self, frame: FrameHandle) -> Result<(), BindingError> {
        let mut state = self.state();
        let (leaked, depth) = state.stacks.discard_above(frame);
        if !leaked.is_empty() {
            for discarded in leaked.iter().rev() {
                retire(&mut state.console, discarded);
            }
            let lock_discarded = state
                .lock
                .as_ref()
                .is_some_and(|held| leaked.iter().any(|f| f.id() == held.frame.id()));
            if lock_discarded {
                state.lock = None;
            }
            trace::stack_repaired(leaked.len(), depth);
        }
        Self::pop_locked(&mut state, frame)
    }
}

/// Removes the interceptors `frame` installed, last installed first.
fn retire(console: &mut Console, frame: &Frame) {
    for channel in frame.bindings().channels().rev() {
        console.uninstall(channel);
    }
}

impl fmt::Debug for Rebinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Rebinder")
            .field("depth", &state.stacks.depth())
            .field("threads", &state.stacks.threads())
            .field("locked", &state.lock.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_sink::{MemorySink, Preset};

    struct Fixture {
        out: MemorySink,
        err: MemorySink,
        rebinder: Rebinder,
    }

    fn fixture() -> Fixture {
        let out = MemorySink::new("out");
        let err = MemorySink::new("err");
        let rebinder = Rebinder::new(StreamRegistry::new(out.sink(), err.sink()));
        Fixture { out, err, rebinder }
    }

    #[test]
    fn rebind_then_unbind_restores_console_members() {
        let fixture = fixture();
        let before = fixture.rebinder.console();
        let handle = fixture.rebinder.rebind(Preset::Diagnostics).expect("push");
        for channel in Channel::WELL_KNOWN {
            let emitter = fixture.rebinder.console().emitter(&channel).expect("member").clone();
            assert!(emitter.is_interceptor());
        }

        handle.unbind().expect("pop");
        let after = fixture.rebinder.console();
        for channel in Channel::WELL_KNOWN {
            let restored = after.emitter(&channel).expect("member");
            assert!(restored.ptr_eq(before.emitter(&channel).expect("member")));
        }
        assert_eq!(fixture.rebinder.depth(), 1);
    }

    #[test]
    fn failed_install_leaves_no_trace() {
        let fixture = fixture();
        let audit = Channel::new("audit");
        let overrides = Overrides::new()
            .bind(Channel::LOG, fixture.err.sink())
            .bind(audit, fixture.err.sink());

        let error = fixture.rebinder.rebind(overrides).expect_err("audit has no member");
        assert!(matches!(error, BindingError::Configuration(_)));
        assert_eq!(fixture.rebinder.depth(), 1);
        let log = fixture.rebinder.console().emitter(&Channel::LOG).expect("member").clone();
        assert!(!log.is_interceptor());

        fixture.rebinder.log("still plain").expect("emit");
        assert_eq!(fixture.out.lines(), ["still plain"]);
    }

    #[test]
    fn with_discards_leaked_inner_frames() {
        let fixture = fixture();
        let result = fixture.rebinder.with(Preset::Diagnostics, || {
            let _leaked = fixture.rebinder.rebind(Preset::Data)?;
            Ok::<_, BindingError>(fixture.rebinder.depth())
        });
        assert_eq!(result, Ok(3));
        assert_eq!(fixture.rebinder.depth(), 1);
        assert!(!fixture
            .rebinder
            .console()
            .emitter(&Channel::LOG)
            .expect("member")
            .is_interceptor());
    }

    #[test]
    fn work_error_wins_over_cleanup() {
        let fixture = fixture();
        let result: Result<(), BindingError> = fixture
            .rebinder
            .with(Preset::Diagnostics, || Err(BindingError::AlreadyLocked));
        assert_eq!(result, Err(BindingError::AlreadyLocked));
        assert_eq!(fixture.rebinder.depth(), 1);
    }

    #[test]
    fn stream_slots_are_untouched_outside_emits() {
        let fixture = fixture();
        let _guard = fixture.rebinder.scope(Preset::Diagnostics).expect("push");
        fixture.rebinder.log("routed").expect("emit");
        assert_eq!(fixture.rebinder.stream(SinkSlot::Primary), fixture.out.sink());
        assert_eq!(fixture.err.lines(), ["routed"]);
    }
}
