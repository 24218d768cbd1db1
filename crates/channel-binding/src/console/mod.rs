//! crates/channel-binding/src/console/mod.rs
//!
//! The emit-capable object whose channel members get intercepted.
//!
//! A [`Console`] maps channels to members. Callable members are [`Emitter`]
//! values; [`Console::install`] replaces one with an interceptor that routes
//! the call through the sink a [`FrameProvider`] resolves, and
//! [`Console::uninstall`] puts the replaced emitter back by reference.

mod emitter;
mod streams;

use std::collections::BTreeMap;
use std::sync::Arc;

use channel_sink::{Channel, Overrides, Sink, SinkSlot, StreamRegistry};
use serde_json::Value;

use crate::error::{ConfigurationError, EmitError};
use crate::trace;

pub use self::emitter::{EmitFn, Emitter};
pub use self::streams::{ProcessStreams, Redirect};

use self::emitter::Interception;

/// Source of the sink a channel resolves to at emit time.
///
/// Interceptors consult the provider on every call and never cache the
/// answer. Returning `None` leaves the process-visible slot untouched for that
/// call.
pub trait FrameProvider: Send + Sync {
    /// Returns the sink `channel` should write to right now.
    fn resolve(&self, channel: &Channel) -> Option<Sink>;
}

impl FrameProvider for Overrides {
    fn resolve(&self, channel: &Channel) -> Option<Sink> {
        self.get(channel).cloned()
    }
}

/// Member of a [`Console`].
#[derive(Clone, Debug)]
pub enum ConsoleMember {
    /// Callable emit implementation.
    Emit(Emitter),
    /// Plain value that cannot be called or intercepted.
    Value(Value),
}

/// Emit-capable object with interceptable channel members.
#[derive(Clone, Debug)]
pub struct Console {
    registry: Arc<StreamRegistry>,
    streams: ProcessStreams,
    members: BTreeMap<Channel, ConsoleMember>,
}

impl Console {
    /// Creates a console with no members over the registry's default sinks.
    #[must_use]
    pub fn empty(registry: Arc<StreamRegistry>) -> Self {
        let streams = ProcessStreams::from_registry(&registry);
        Self {
            registry,
            streams,
            members: BTreeMap::new(),
        }
    }

    /// Creates a console with a standard writer for every registered channel.
    ///
    /// Each writer targets the slot the registry assigns to its channel and
    /// terminates payloads per the registry's line mode.
    #[must_use]
    pub fn standard(registry: Arc<StreamRegistry>) -> Self {
        let line_mode = registry.line_mode();
        let members = registry
            .channels()
            .map(|(channel, slot)| {
                (
                    channel.clone(),
                    ConsoleMember::Emit(Emitter::writer(slot, line_mode)),
                )
            })
            .collect();
        let streams = ProcessStreams::from_registry(&registry);
        Self {
            registry,
            streams,
            members,
        }
    }

    /// Returns the console with `member` stored under `channel`.
    #[must_use]
    pub fn with_member(mut self, channel: impl Into<Channel>, member: ConsoleMember) -> Self {
        self.members.insert(channel.into(), member);
        self
    }

    /// Returns the registry the console routes through.
    #[must_use]
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Returns the process-visible streams.
    #[must_use]
    pub fn streams(&self) -> &ProcessStreams {
        &self.streams
    }

    /// Returns the sink currently occupying `slot`.
    #[must_use]
    pub fn stream(&self, slot: SinkSlot) -> Sink {
        self.streams.get(slot)
    }

    /// Puts `sink` into `slot` and returns the sink it displaced.
    pub fn swap_stream(&self, slot: SinkSlot, sink: Sink) -> Sink {
        self.streams.replace(slot, sink)
    }

    /// Returns the member stored under `channel`.
    #[must_use]
    pub fn member(&self, channel: &Channel) -> Option<&ConsoleMember> {
        self.members.get(channel)
    }

    /// Returns the callable member stored under `channel`.
    pub fn emitter(&self, channel: &Channel) -> Result<&Emitter, ConfigurationError> {
        match self.members.get(channel) {
            Some(ConsoleMember::Emit(emitter)) => Ok(emitter),
            Some(ConsoleMember::Value(_)) => Err(ConfigurationError::NotCallable {
                channel: channel.clone(),
            }),
            None => Err(ConfigurationError::MissingMember {
                channel: channel.clone(),
            }),
        }
    }

    /// Emits `bytes` through the member stored under `channel`.
    pub fn emit(&self, channel: &Channel, bytes: &[u8]) -> Result<(), EmitError> {
        self.emitter(channel)?.call(&self.streams, bytes)?;
        Ok(())
    }

    /// Replaces the `channel` member with an interceptor.
    ///
    /// The interceptor delegates to the true original implementation: if the
    /// current member already is an interceptor, its recorded original is
    /// reused instead of wrapping the interceptor again. The current member is
    /// recorded so [`uninstall`](Self::uninstall) can restore it.
    ///
    /// Fails immediately when the member is missing or not callable, or when
    /// the registry does not assign the channel a slot.
    pub fn install(
        &mut self,
        channel: &Channel,
        provider: Arc<dyn FrameProvider>,
    ) -> Result<(), ConfigurationError> {
        let previous = self.emitter(channel)?.clone();
        let slot = self
            .registry
            .slot(channel)
            .ok_or_else(|| ConfigurationError::NoSlot {
                channel: channel.clone(),
            })?;
        let original = previous.original().clone();

        let delegate = original.clone();
        let target = channel.clone();
        let interceptor = Emitter::intercepting(
            move |streams: &ProcessStreams, bytes: &[u8]| match provider.resolve(&target) {
                Some(sink) => {
                    let _redirect = streams.redirect(slot, sink);
                    delegate.call(streams, bytes)
                }
                None => delegate.call(streams, bytes),
            },
            Interception {
                channel: channel.clone(),
                original,
                previous,
            },
        );

        self.members
            .insert(channel.clone(), ConsoleMember::Emit(interceptor));
        trace::interceptor_installed(channel);
        Ok(())
    }

    /// Restores the member an interceptor replaced.
    ///
    /// Returns `false` without changing anything when the member is not an
    /// interceptor.
    pub fn uninstall(&mut self, channel: &Channel) -> bool {
        let previous = match self.members.get(channel) {
            Some(ConsoleMember::Emit(emitter)) => emitter.previous().cloned(),
            _ => None,
        };
        let Some(previous) = previous else {
            return false;
        };
        self.members
            .insert(channel.clone(), ConsoleMember::Emit(previous));
        trace::interceptor_removed(channel);
        true
    }

    /// Returns a copy whose channels in `binding` are permanently routed to
    /// the bound sinks, independent of any binding stack.
    ///
    /// The copy shares the process-visible streams with `self`.
    pub fn detached(&self, binding: &Overrides) -> Result<Self, ConfigurationError> {
        let mut detached = self.clone();
        let provider: Arc<dyn FrameProvider> = Arc::new(binding.clone());
        for channel in binding.channels() {
            detached.install(channel, Arc::clone(&provider))?;
        }
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_sink::MemorySink;
    use serde_json::json;

    struct Fixture {
        out: MemorySink,
        err: MemorySink,
        console: Console,
    }

    fn fixture() -> Fixture {
        let out = MemorySink::new("out");
        let err = MemorySink::new("err");
        let registry = Arc::new(StreamRegistry::new(out.sink(), err.sink()));
        Fixture {
            console: Console::standard(registry),
            out,
            err,
        }
    }

    fn fixed(channel: Channel, sink: Sink) -> Arc<dyn FrameProvider> {
        Arc::new(Overrides::new().bind(channel, sink))
    }

    #[test]
    fn standard_console_routes_by_slot() {
        let fixture = fixture();
        for channel in Channel::WELL_KNOWN {
            fixture
                .console
                .emit(&channel, channel.as_str().as_bytes())
                .expect("emit succeeds");
        }
        assert_eq!(fixture.out.lines(), ["log", "info"]);
        assert_eq!(fixture.err.lines(), ["warn", "error"]);
    }

    #[test]
    fn interceptor_swaps_slot_for_the_call_only() {
        let mut fixture = fixture();
        fixture
            .console
            .install(&Channel::LOG, fixed(Channel::LOG, fixture.err.sink()))
            .expect("install succeeds");

        fixture.console.emit(&Channel::LOG, b"rerouted").expect("emit succeeds");
        fixture.console.emit(&Channel::INFO, b"untouched").expect("emit succeeds");

        assert_eq!(fixture.err.lines(), ["rerouted"]);
        assert_eq!(fixture.out.lines(), ["untouched"]);
        assert_eq!(fixture.console.stream(SinkSlot::Primary), fixture.out.sink());
    }

    #[test]
    fn reinstall_unwraps_to_true_original() {
        let mut fixture = fixture();
        let original = fixture.console.emitter(&Channel::LOG).expect("member").clone();

        fixture
            .console
            .install(&Channel::LOG, fixed(Channel::LOG, fixture.err.sink()))
            .expect("first install");
        let first = fixture.console.emitter(&Channel::LOG).expect("member").clone();
        fixture
            .console
            .install(&Channel::LOG, fixed(Channel::LOG, fixture.out.sink()))
            .expect("second install");
        let second = fixture.console.emitter(&Channel::LOG).expect("member").clone();

        assert!(second.original().ptr_eq(&original));
        assert!(second.previous().is_some_and(|previous| previous.ptr_eq(&first)));

        assert!(fixture.console.uninstall(&Channel::LOG));
        assert!(fixture.console.uninstall(&Channel::LOG));
        assert!(!fixture.console.uninstall(&Channel::LOG));
        let restored = fixture.console.emitter(&Channel::LOG).expect("member");
        assert!(restored.ptr_eq(&original));
    }

    #[test]
    fn install_rejects_non_callable_members() {
        let mut fixture = fixture();
        fixture.console = fixture
            .console
            .with_member(Channel::INFO, ConsoleMember::Value(json!("not a function")));

        let error = fixture
            .console
            .install(&Channel::INFO, fixed(Channel::INFO, fixture.err.sink()))
            .expect_err("value members cannot be intercepted");
        assert_eq!(
            error,
            ConfigurationError::NotCallable {
                channel: Channel::INFO
            }
        );
    }

    #[test]
    fn install_rejects_missing_members_and_unslotted_channels() {
        let mut fixture = fixture();
        let audit = Channel::new("audit");
        let provider = fixed(audit.clone(), fixture.err.sink());

        assert!(matches!(
            fixture.console.install(&audit, Arc::clone(&provider)),
            Err(ConfigurationError::MissingMember { .. })
        ));

        fixture.console = fixture.console.with_member(
            audit.clone(),
            ConsoleMember::Emit(Emitter::new(|_, _| Ok(()))),
        );
        assert!(matches!(
            fixture.console.install(&audit, provider),
            Err(ConfigurationError::NoSlot { .. })
        ));
    }

    #[test]
    fn uninstall_without_interceptor_is_a_no_op() {
        let mut fixture = fixture();
        let before = fixture.console.emitter(&Channel::WARN).expect("member").clone();
        assert!(!fixture.console.uninstall(&Channel::WARN));
        assert!(!fixture.console.uninstall(&Channel::new("audit")));
        let after = fixture.console.emitter(&Channel::WARN).expect("member");
        assert!(after.ptr_eq(&before));
    }

    #[test]
    fn detached_copy_keeps_its_binding() {
        let fixture = fixture();
        let binding = Overrides::new().bind(Channel::LOG, fixture.err.sink());
        let detached = fixture.console.detached(&binding).expect("detach succeeds");

        detached.emit(&Channel::LOG, b"detached").expect("emit succeeds");
        fixture.console.emit(&Channel::LOG, b"shared").expect("emit succeeds");

        assert_eq!(fixture.err.lines(), ["detached"]);
        assert_eq!(fixture.out.lines(), ["shared"]);
        assert!(detached.streams().same(fixture.console.streams()));
    }

    #[test]
    fn emitter_failure_still_restores_slot() {
        let out = MemorySink::new("out");
        let err = MemorySink::new("err");
        let registry = Arc::new(StreamRegistry::new(out.sink(), err.sink()));
        let mut console = Console::empty(registry).with_member(
            Channel::LOG,
            ConsoleMember::Emit(Emitter::new(|_, _| {
                Err(std::io::Error::other("sink closed"))
            })),
        );
        console
            .install(&Channel::LOG, fixed(Channel::LOG, err.sink()))
            .expect("install succeeds");

        let error = console.emit(&Channel::LOG, b"lost").expect_err("emit fails");
        assert!(matches!(error, EmitError::Io(_)));
        assert_eq!(console.streams().get(SinkSlot::Primary), out.sink());
    }
}
