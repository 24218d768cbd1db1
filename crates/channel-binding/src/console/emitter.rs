use std::fmt;
use std::io;
use std::sync::Arc;

use channel_sink::{Channel, LineMode, SinkSlot};

use super::streams::ProcessStreams;

/// Signature of an emit implementation.
///
/// The implementation receives the process-visible streams and the
/// pre-formatted payload. It decides on its own which slot to write to; the
/// standard implementation writes to the slot of its channel.
pub type EmitFn = dyn Fn(&ProcessStreams, &[u8]) -> io::Result<()> + Send + Sync;

/// First-class emit implementation.
///
/// Emitters are compared by identity: clones are the same emitter, two
/// emitters built from equal closures are not. An emitter produced by
/// [`Console::install`](super::Console::install) additionally records the true
/// original implementation it delegates to and the emitter it replaced.
#[derive(Clone)]
pub struct Emitter {
    func: Arc<EmitFn>,
    interception: Option<Arc<Interception>>,
}

pub(super) struct Interception {
    pub(super) channel: Channel,
    pub(super) original: Emitter,
    pub(super) previous: Emitter,
}

impl Emitter {
    /// Wraps `func` as an emitter.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&ProcessStreams, &[u8]) -> io::Result<()> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            interception: None,
        }
    }

    /// Standard implementation: writes the payload to whatever sink occupies
    /// `slot` at call time, terminated per `line_mode`.
    #[must_use]
    pub fn writer(slot: SinkSlot, line_mode: LineMode) -> Self {
        Self::new(move |streams, bytes| streams.get(slot).write_line(bytes, line_mode))
    }

    pub(super) fn intercepting<F>(func: F, interception: Interception) -> Self
    where
        F: Fn(&ProcessStreams, &[u8]) -> io::Result<()> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            interception: Some(Arc::new(interception)),
        }
    }

    /// Invokes the implementation.
    pub fn call(&self, streams: &ProcessStreams, bytes: &[u8]) -> io::Result<()> {
        (self.func)(streams, bytes)
    }

    /// Reports whether `self` and `other` are the same implementation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }

    /// Reports whether this emitter is an installed interceptor.
    #[must_use]
    pub fn is_interceptor(&self) -> bool {
        self.interception.is_some()
    }

    /// Returns the true original implementation behind any interceptors.
    #[must_use]
    pub fn original(&self) -> &Self {
        self.interception
            .as_ref()
            .map_or(self, |interception| &interception.original)
    }

    /// Returns the emitter this interceptor replaced, or `None` for plain emitters.
    #[must_use]
    pub fn previous(&self) -> Option<&Self> {
        self.interception
            .as_ref()
            .map(|interception| &interception.previous)
    }

    /// Returns the channel an interceptor was installed for.
    #[must_use]
    pub fn intercepted_channel(&self) -> Option<&Channel> {
        self.interception
            .as_ref()
            .map(|interception| &interception.channel)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("func", &Arc::as_ptr(&self.func).cast::<()>())
            .field("channel", &self.intercepted_channel())
            .finish()
    }
}
