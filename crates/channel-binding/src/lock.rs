//! crates/channel-binding/src/lock.rs
//! Single-holder lock over the binding stack.
//!
//! Locking pushes a frame that only the returned [`UnlockToken`] can pop. At
//! most one token is outstanding per rebinder; a second `lock` fails until the
//! first token is used.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BindingError;
use crate::scope::{BindingSpec, Outstanding, Rebinder};
use crate::trace;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl Rebinder {
    /// Pushes `spec` as the locked frame.
    ///
    /// Fails with [`BindingError::AlreadyLocked`] while another token is
    /// outstanding, without pushing anything.
    pub fn lock(&self, spec: impl Into<BindingSpec>) -> Result<UnlockToken, BindingError> {
        let overrides = self.overrides_for(spec)?;
        let mut state = self.state();
        if state.lock.is_some() {
            return Err(BindingError::AlreadyLocked);
        }
        let frame = self.push_locked(&mut state, &overrides)?;
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        state.lock = Some(Outstanding { token, frame });
        trace::lock_acquired(frame.id());
        Ok(UnlockToken {
            id: token,
            rebinder: self.clone(),
        })
    }

    /// Reports whether a lock token is outstanding.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state().lock.is_some()
    }

    fn release(&self, token: u64) -> Result<(), BindingError> {
        let mut state = self.state();
        let frame = match &state.lock {
            Some(held) if held.token == token => held.frame,
            _ => return Err(BindingError::AlreadyUnlocked),
        };
        // A refused pop keeps the lock held so the token can be retried once
        // the frames above it are gone.
        Self::pop_locked(&mut state, frame)?;
        state.lock = None;
        trace::lock_released(frame.id());
        Ok(())
    }
}

/// Capability to pop the locked frame.
///
/// Clones name the same lock; whichever clone unlocks first succeeds and the
/// rest fail with [`BindingError::AlreadyUnlocked`].
#[derive(Clone)]
#[must_use = "the locked frame stays pushed until `unlock` is called"]
pub struct UnlockToken {
    id: u64,
    rebinder: Rebinder,
}

impl UnlockToken {
    /// Pops the locked frame and clears the lock.
    pub fn unlock(&self) -> Result<(), BindingError> {
        self.rebinder.release(self.id)
    }
}

impl fmt::Debug for UnlockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockToken").field("id", &self.id).finish()
    }
}
