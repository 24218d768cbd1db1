//! crates/channel-binding/src/frame.rs
//! Immutable binding frames and the handles that name them.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use channel_sink::{Channel, Overrides, Sink};

/// Unique identity of a [`Frame`] instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FrameId(u64);

impl FrameId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric identity.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle naming exactly one pushed frame.
///
/// Handles are only produced by a push and are the only way to pop the frame
/// they name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FrameHandle {
    id: FrameId,
}

impl FrameHandle {
    /// Returns the identity of the frame this handle names.
    #[must_use]
    pub const fn id(self) -> FrameId {
        self.id
    }
}

/// Snapshot of explicit channel bindings.
///
/// A frame already contains every binding inherited from the frames beneath
/// it, so resolution only ever consults the top frame. Frames are never
/// modified after construction; clones share the same bindings and identity.
#[derive(Clone, Debug)]
pub struct Frame {
    id: FrameId,
    bindings: Arc<Overrides>,
}

impl Frame {
    /// Creates the process-default frame with no explicit bindings.
    #[must_use]
    pub fn root() -> Self {
        Self::from_overrides(Overrides::new())
    }

    fn from_overrides(bindings: Overrides) -> Self {
        Self {
            id: FrameId::next(),
            bindings: Arc::new(bindings),
        }
    }

    /// Creates a new frame holding this frame's bindings with `overrides` laid on top.
    #[must_use]
    pub fn layered(&self, overrides: &Overrides) -> Self {
        Self::from_overrides(overrides.layered_over(&self.bindings))
    }

    /// Returns the frame identity.
    #[must_use]
    pub const fn id(&self) -> FrameId {
        self.id
    }

    /// Returns a handle naming this frame.
    #[must_use]
    pub const fn handle(&self) -> FrameHandle {
        FrameHandle { id: self.id }
    }

    /// Returns the explicit binding for `channel`, if any.
    #[must_use]
    pub fn get(&self, channel: &Channel) -> Option<&Sink> {
        self.bindings.get(channel)
    }

    /// Returns every explicit binding of the frame.
    #[must_use]
    pub fn bindings(&self) -> &Overrides {
        &self.bindings
    }
}
