use crate::error::BindingError;
use crate::frame::FrameHandle;

use super::Rebinder;

/// Receipt for one [`Rebinder::rebind`] call.
///
/// [`unbind`](Self::unbind) is the only way to reverse the rebind. Dropping the
/// handle leaves the frame pushed; use [`Rebinder::scope`] or
/// [`Rebinder::with`] when the frame must be popped automatically.
#[derive(Clone, Debug)]
#[must_use = "the frame stays pushed until `unbind` is called"]
pub struct ScopeHandle {
    rebinder: Rebinder,
    frame: FrameHandle,
}

impl ScopeHandle {
    pub(crate) const fn new(rebinder: Rebinder, frame: FrameHandle) -> Self {
        Self { rebinder, frame }
    }

    /// Returns the handle of the pushed frame.
    pub const fn frame(&self) -> FrameHandle {
        self.frame
    }

    /// Pops the frame this rebind pushed.
    ///
    /// Fails with [`BindingError::StackDiscipline`] while frames pushed later
    /// are still on the stack, and when the frame was already popped.
    pub fn unbind(&self) -> Result<(), BindingError> {
        self.rebinder.unbind(self)
    }
}

/// RAII scope that pops its frame on drop.
///
/// Closing the scope first discards any frames pushed after it that were never
/// unbound, then pops its own frame, so the stack always returns to the depth
/// it had when the scope was opened. Drop performs the same cleanup when the
/// guard goes out of scope on an early return or during unwinding.
#[must_use = "dropping the guard immediately unbinds the scope"]
pub struct ScopeGuard {
    rebinder: Rebinder,
    frame: FrameHandle,
    armed: bool,
}

impl ScopeGuard {
    pub(crate) const fn new(rebinder: Rebinder, frame: FrameHandle) -> Self {
        Self {
            rebinder,
            frame,
            armed: true,
        }
    }

    /// Returns the handle of the pushed frame.
    pub const fn frame(&self) -> FrameHandle {
        self.frame
    }

    /// Closes the scope and reports whether its frame could be popped.
    pub fn close(mut self) -> Result<(), BindingError> {
        self.armed = false;
        self.rebinder.close_scope(self.frame)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            let _ = self.rebinder.close_scope(self.frame);
        }
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("frame", &self.frame)
            .field("armed", &self.armed)
            .finish()
    }
}
