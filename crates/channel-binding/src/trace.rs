//! Binding-stack diagnostics.
//!
//! Every hook emits a `tracing` event under the [`TARGET`] target when the
//! `tracing` feature is enabled and compiles to nothing otherwise.

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use channel_sink::Channel;

use crate::frame::FrameId;

/// Target used for every event emitted by this crate.
pub const TARGET: &str = "stdio_rebind::binding";

/// Trace a frame push.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn frame_pushed(frame: FrameId, depth: usize) {
    debug!(
        target: TARGET,
        operation = "push",
        frame = frame.get(),
        depth = depth,
        "pushed binding frame {} (depth {})",
        frame,
        depth
    );
}

/// Trace a frame push - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn frame_pushed(_frame: FrameId, _depth: usize) {}

/// Trace a frame pop.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn frame_popped(frame: FrameId, depth: usize) {
    debug!(
        target: TARGET,
        operation = "pop",
        frame = frame.get(),
        depth = depth,
        "popped binding frame {} (depth {})",
        frame,
        depth
    );
}

/// Trace a frame pop - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn frame_popped(_frame: FrameId, _depth: usize) {}

/// Trace a pop refused for naming a frame other than the top.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn pop_refused(expected: FrameId, top: FrameId) {
    debug!(
        target: TARGET,
        operation = "pop_refused",
        expected = expected.get(),
        top = top.get(),
        "refused pop of frame {} while {} is on top",
        expected,
        top
    );
}

/// Trace a refused pop - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn pop_refused(_expected: FrameId, _top: FrameId) {}

/// Trace frames discarded when a scope exits with inner frames still pushed.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn stack_repaired(discarded: usize, depth: usize) {
    debug!(
        target: TARGET,
        operation = "repair",
        discarded = discarded,
        depth = depth,
        "discarded {} leaked binding frame(s), depth restored to {}",
        discarded,
        depth
    );
}

/// Trace a stack repair - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn stack_repaired(_discarded: usize, _depth: usize) {}

/// Trace an interceptor installation.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn interceptor_installed(channel: &Channel) {
    trace!(
        target: TARGET,
        operation = "install",
        channel = channel.as_str(),
        "installed interceptor on `{}`",
        channel
    );
}

/// Trace an interceptor installation - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn interceptor_installed(_channel: &Channel) {}

/// Trace an interceptor removal.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn interceptor_removed(channel: &Channel) {
    trace!(
        target: TARGET,
        operation = "uninstall",
        channel = channel.as_str(),
        "removed interceptor from `{}`",
        channel
    );
}

/// Trace an interceptor removal - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn interceptor_removed(_channel: &Channel) {}

/// Trace a lock acquisition.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn lock_acquired(frame: FrameId) {
    debug!(
        target: TARGET,
        operation = "lock",
        frame = frame.get(),
        "locked binding frame {}",
        frame
    );
}

/// Trace a lock acquisition - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn lock_acquired(_frame: FrameId) {}

/// Trace a lock release.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn lock_released(frame: FrameId) {
    debug!(
        target: TARGET,
        operation = "unlock",
        frame = frame.get(),
        "unlocked binding frame {}",
        frame
    );
}

/// Trace a lock release - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn lock_released(_frame: FrameId) {}
