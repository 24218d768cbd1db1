//! crates/channel-binding/src/stack.rs
//! Ordered stack of binding frames over a stream registry, and the per-thread
//! set of stacks a rebinder keeps.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use channel_sink::{Channel, Overrides, Sink, StreamRegistry};

use crate::error::BindingError;
use crate::frame::{Frame, FrameHandle};

/// Stack of [`Frame`]s whose top decides where every channel resolves.
///
/// The bottom frame is the process default and is never removed. Pops follow
/// strict LIFO discipline: only the handle of the current top frame is
/// accepted, and a refused pop leaves the stack untouched. A handle that no
/// longer names the top, including one whose frame was already popped, is
/// refused with [`BindingError::StackDiscipline`]; only the process-default
/// frame's own handle reports [`BindingError::StackUnderflow`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use channel_binding::{BindingError, BindingStack};
/// use channel_sink::{Channel, Preset, Sink, StreamRegistry};
///
/// let registry = Arc::new(StreamRegistry::new(
///     Sink::new("out", Vec::new()),
///     Sink::new("err", Vec::new()),
/// ));
/// let mut stack = BindingStack::new(Arc::clone(&registry));
///
/// let outer = stack.push(&registry.preset(Preset::Diagnostics));
/// let inner = stack.push(&registry.preset(Preset::Data));
/// assert_eq!(stack.resolve(&Channel::LOG), Some(registry.primary().clone()));
///
/// assert!(matches!(stack.pop(outer), Err(BindingError::StackDiscipline { .. })));
/// stack.pop(inner)?;
/// stack.pop(outer)?;
/// assert!(matches!(stack.pop(outer), Err(BindingError::StackDiscipline { .. })));
///
/// let root = stack.top().handle();
/// assert_eq!(stack.pop(root).err(), Some(BindingError::StackUnderflow));
/// # Ok::<(), BindingError>(())
/// ```
#[derive(Clone, Debug)]
pub struct BindingStack {
    registry: Arc<StreamRegistry>,
    frames: Vec<Frame>,
}

impl BindingStack {
    /// Creates a stack holding only the process-default frame.
    #[must_use]
    pub fn new(registry: Arc<StreamRegistry>) -> Self {
        Self {
            registry,
            frames: vec![Frame::root()],
        }
    }

    /// Returns the registry supplying process defaults.
    #[must_use]
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Returns the sink `channel` currently resolves to.
    ///
    /// The top frame's explicit binding wins; otherwise the registry default
    /// for the channel's slot applies. Unknown channels with no binding resolve
    /// to `None`.
    #[must_use]
    pub fn resolve(&self, channel: &Channel) -> Option<Sink> {
        self.top()
            .get(channel)
            .or_else(|| self.registry.default_sink(channel))
            .cloned()
    }

    /// Pushes a frame made of the current top with `overrides` laid over it.
    pub fn push(&mut self, overrides: &Overrides) -> FrameHandle {
        let frame = self.top().layered(overrides);
        let handle = frame.handle();
        self.frames.push(frame);
        handle
    }

    /// Pops the top frame if `handle` names it.
    pub fn pop(&mut self, handle: FrameHandle) -> Result<Frame, BindingError> {
        let top = self.top().id();
        if top != handle.id() {
            return Err(BindingError::StackDiscipline {
                expected: handle.id(),
                top,
            });
        }
        if self.frames.len() == 1 {
            return Err(BindingError::StackUnderflow);
        }
        self.frames.pop().ok_or(BindingError::StackUnderflow)
    }

    /// Returns the frame on top of the stack.
    #[must_use]
    pub fn top(&self) -> &Frame {
        // The root frame is pushed in `new` and never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Returns the number of frames, including the process-default frame.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the zero-based depth of the frame named by `handle`.
    #[must_use]
    pub fn position(&self, handle: FrameHandle) -> Option<usize> {
        self.frames
            .iter()
            .rposition(|frame| frame.id() == handle.id())
    }

    /// Removes every frame above `depth`, returning them bottom first.
    ///
    /// The process-default frame survives even when `depth` is zero.
    pub fn truncate(&mut self, depth: usize) -> Vec<Frame> {
        let keep = depth.max(1);
        if keep >= self.frames.len() {
            return Vec::new();
        }
        self.frames.split_off(keep)
    }
}

/// One [`BindingStack`] per thread that currently has frames pushed.
///
/// Pushes land on the calling thread's stack and resolution consults only that
/// stack, so frames pushed on one thread never affect emits made on another. A
/// thread without frames resolves to the registry defaults and owns no entry.
/// Pops and repairs address the stack that holds the named frame, which lets a
/// handle or guard be released from a thread other than the one that pushed.
#[derive(Debug)]
pub(crate) struct ThreadStacks {
    registry: Arc<StreamRegistry>,
    stacks: HashMap<ThreadId, BindingStack>,
}

impl ThreadStacks {
    pub(crate) fn new(registry: Arc<StreamRegistry>) -> Self {
        Self {
            registry,
            stacks: HashMap::new(),
        }
    }

    /// Returns the calling thread's stack, creating it on first use.
    pub(crate) fn current(&mut self) -> &mut BindingStack {
        let registry = &self.registry;
        self.stacks
            .entry(thread::current().id())
            .or_insert_with(|| BindingStack::new(Arc::clone(registry)))
    }

    /// Resolves `channel` against the calling thread's top frame.
    pub(crate) fn resolve(&self, channel: &Channel) -> Option<Sink> {
        match self.stacks.get(&thread::current().id()) {
            Some(stack) => stack.resolve(channel),
            None => self.registry.default_sink(channel).cloned(),
        }
    }

    /// Returns the calling thread's depth, including the process-default frame.
    pub(crate) fn depth(&self) -> usize {
        self.stacks
            .get(&thread::current().id())
            .map_or(1, BindingStack::depth)
    }

    /// Returns the number of threads with frames pushed.
    pub(crate) fn threads(&self) -> usize {
        self.stacks.len()
    }

    /// Pops `handle` from the stack holding it and returns the popped frame
    /// with the depth left behind.
    ///
    /// A handle found on no stack is checked against the calling thread's
    /// stack, which refuses it.
    pub(crate) fn pop(&mut self, handle: FrameHandle) -> Result<(Frame, usize), BindingError> {
        let owner = self.owner(handle);
        let registry = &self.registry;
        let stack = self
            .stacks
            .entry(owner)
            .or_insert_with(|| BindingStack::new(Arc::clone(registry)));
        let result = stack.pop(handle);
        let depth = stack.depth();
        if depth == 1 {
            self.stacks.remove(&owner);
        }
        result.map(|frame| (frame, depth))
    }

    /// Removes every frame pushed above `handle` on the stack holding it.
    ///
    /// Returns the removed frames bottom first, together with the depth of
    /// `handle`'s stack afterwards. Nothing is removed when `handle` is on no
    /// stack.
    pub(crate) fn discard_above(&mut self, handle: FrameHandle) -> (Vec<Frame>, usize) {
        let owner = self.owner(handle);
        let Some(stack) = self.stacks.get_mut(&owner) else {
            return (Vec::new(), 1);
        };
        let discarded = match stack.position(handle) {
            Some(position) => stack.truncate(position + 1),
            None => Vec::new(),
        };
        (discarded, stack.depth())
    }

    fn owner(&self, handle: FrameHandle) -> ThreadId {
        self.stacks
            .iter()
            .find(|(_, stack)| stack.position(handle).is_some())
            .map_or_else(|| thread::current().id(), |(owner, _)| *owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_sink::Preset;

    fn registry() -> Arc<StreamRegistry> {
        Arc::new(StreamRegistry::new(
            Sink::new("out", Vec::new()),
            Sink::new("err", Vec::new()),
        ))
    }

    #[test]
    fn fresh_stack_resolves_registry_defaults() {
        let registry = registry();
        let stack = BindingStack::new(Arc::clone(&registry));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.resolve(&Channel::LOG).as_ref(), Some(registry.primary()));
        assert_eq!(stack.resolve(&Channel::ERROR).as_ref(), Some(registry.secondary()));
        assert!(stack.resolve(&Channel::new("audit")).is_none());
    }

    #[test]
    fn unmentioned_channels_inherit_enclosing_resolution() {
        let registry = registry();
        let mut stack = BindingStack::new(Arc::clone(&registry));
        let audit = Sink::new("audit", Vec::new());
        stack.push(&Overrides::new().bind(Channel::WARN, audit.clone()));
        let before = stack.resolve(&Channel::INFO);

        stack.push(&registry.preset(Preset::Diagnostics));
        assert_eq!(stack.resolve(&Channel::WARN), Some(audit));
        assert_eq!(before.as_ref(), Some(registry.primary()));
        assert_eq!(stack.resolve(&Channel::INFO).as_ref(), Some(registry.secondary()));
    }

    #[test]
    fn refused_pop_leaves_stack_untouched() {
        let registry = registry();
        let mut stack = BindingStack::new(Arc::clone(&registry));
        let outer = stack.push(&registry.preset(Preset::Diagnostics));
        let inner = stack.push(&registry.preset(Preset::Data));

        let error = stack.pop(outer).expect_err("outer is not on top");
        assert_eq!(
            error,
            BindingError::StackDiscipline {
                expected: outer.id(),
                top: inner.id(),
            }
        );
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.top().id(), inner.id());
    }

    #[test]
    fn stale_handle_is_refused_regardless_of_depth() {
        let registry = registry();
        let mut stack = BindingStack::new(Arc::clone(&registry));
        let stale = stack.push(&Overrides::new());
        stack.pop(stale).expect("pop");

        let at_root = stack.pop(stale).expect_err("already popped");
        assert!(matches!(at_root, BindingError::StackDiscipline { expected, .. } if expected == stale.id()));

        let fresh = stack.push(&Overrides::new());
        assert_eq!(
            stack.pop(stale).err(),
            Some(BindingError::StackDiscipline {
                expected: stale.id(),
                top: fresh.id(),
            })
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn root_frame_is_never_popped() {
        let mut stack = BindingStack::new(registry());
        let root = stack.top().handle();
        assert_eq!(stack.pop(root).err(), Some(BindingError::StackUnderflow));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn truncate_keeps_root_and_returns_removed_frames() {
        let registry = registry();
        let mut stack = BindingStack::new(Arc::clone(&registry));
        let first = stack.push(&Overrides::new());
        let second = stack.push(&Overrides::new());

        assert_eq!(stack.position(second), Some(2));
        let removed = stack.truncate(0);
        let ids: Vec<_> = removed.iter().map(Frame::id).collect();
        assert_eq!(ids, [first.id(), second.id()]);
        assert_eq!(stack.depth(), 1);
        assert!(stack.truncate(5).is_empty());
    }

    #[test]
    fn thread_stacks_keep_frames_apart() {
        let registry = registry();
        let mut stacks = ThreadStacks::new(Arc::clone(&registry));
        let frame = stacks.current().push(&registry.preset(Preset::Diagnostics));
        assert_eq!(stacks.depth(), 2);
        assert_eq!(stacks.resolve(&Channel::LOG).as_ref(), Some(registry.secondary()));

        let stacks = std::sync::Mutex::new(stacks);
        thread::scope(|scope| {
            scope.spawn(|| {
                let stacks = stacks.lock().expect("stacks");
                assert_eq!(stacks.depth(), 1);
                assert_eq!(stacks.resolve(&Channel::LOG).as_ref(), Some(registry.primary()));
            });
        });

        let mut stacks = stacks.into_inner().expect("stacks");
        let (popped, depth) = stacks.pop(frame).expect("pop");
        assert_eq!(popped.id(), frame.id());
        assert_eq!(depth, 1);
        assert_eq!(stacks.threads(), 0);
    }

    #[test]
    fn thread_stacks_pop_from_the_owning_thread() {
        let registry = registry();
        let stacks = std::sync::Mutex::new(ThreadStacks::new(Arc::clone(&registry)));
        let frame = thread::scope(|scope| {
            scope
                .spawn(|| stacks.lock().expect("stacks").current().push(&Overrides::new()))
                .join()
                .expect("pusher")
        });

        let mut stacks = stacks.into_inner().expect("stacks");
        assert_eq!(stacks.threads(), 1);
        let (discarded, depth) = stacks.discard_above(frame);
        assert!(discarded.is_empty());
        assert_eq!(depth, 2);
        stacks.pop(frame).expect("pop from another thread");
        assert_eq!(stacks.threads(), 0);
    }
}
