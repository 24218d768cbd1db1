use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use channel_sink::{Sink, SinkSlot, StreamRegistry};

/// Process-visible default output streams.
///
/// Emit implementations read the sink currently occupying their channel's slot
/// on every call. Clones share the same slots, so a swap made through one clone
/// is observed by every emitter holding another.
///
/// Redirects are scoped to the thread that made them: while a [`Redirect`] is
/// alive, [`get`](Self::get) on that thread returns the redirected sink and
/// every other thread keeps seeing the shared slot.
#[derive(Clone)]
pub struct ProcessStreams {
    inner: Arc<StreamsInner>,
}

struct StreamsInner {
    slots: Mutex<[Sink; 2]>,
    redirects: Mutex<HashMap<ThreadId, Vec<Redirection>>>,
}

struct Redirection {
    id: u64,
    slot: SinkSlot,
    sink: Sink,
}

static NEXT_REDIRECT: AtomicU64 = AtomicU64::new(1);

impl ProcessStreams {
    /// Creates streams initially occupied by `primary` and `secondary`.
    #[must_use]
    pub fn new(primary: Sink, secondary: Sink) -> Self {
        Self {
            inner: Arc::new(StreamsInner {
                slots: Mutex::new([primary, secondary]),
                redirects: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates streams occupied by the registry's default sinks.
    #[must_use]
    pub fn from_registry(registry: &StreamRegistry) -> Self {
        Self::new(registry.primary().clone(), registry.secondary().clone())
    }

    /// Returns the sink the calling thread sees in `slot`.
    ///
    /// The innermost live redirect of `slot` made on this thread wins over the
    /// shared slot.
    #[must_use]
    pub fn get(&self, slot: SinkSlot) -> Sink {
        let redirected = self
            .redirects()
            .get(&thread::current().id())
            .and_then(|active| active.iter().rev().find(|r| r.slot == slot))
            .map(|r| r.sink.clone());
        redirected.unwrap_or_else(|| self.slots()[slot.index()].clone())
    }

    /// Places `sink` into the shared `slot`, returning the sink it displaced.
    pub fn replace(&self, slot: SinkSlot, sink: Sink) -> Sink {
        std::mem::replace(&mut self.slots()[slot.index()], sink)
    }

    /// Shows `sink` in `slot` to the calling thread until the returned guard
    /// is dropped.
    ///
    /// Redirects nest: dropping the guard restores whatever this thread saw
    /// before, including an enclosing redirect. The shared slot is never
    /// modified.
    pub fn redirect(&self, slot: SinkSlot, sink: Sink) -> Redirect<'_> {
        let previous = self.get(slot);
        let id = NEXT_REDIRECT.fetch_add(1, Ordering::Relaxed);
        let thread = thread::current().id();
        self.redirects()
            .entry(thread)
            .or_default()
            .push(Redirection { id, slot, sink });
        Redirect {
            streams: self,
            thread,
            id,
            previous,
        }
    }

    /// Reports whether `other` shares these streams.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn slots(&self) -> MutexGuard<'_, [Sink; 2]> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn redirects(&self) -> MutexGuard<'_, HashMap<ThreadId, Vec<Redirection>>> {
        self.inner
            .redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ProcessStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessStreams")
            .field("primary", &self.get(SinkSlot::Primary))
            .field("secondary", &self.get(SinkSlot::Secondary))
            .finish()
    }
}

/// RAII guard ending a redirect made by [`ProcessStreams::redirect`].
#[must_use = "dropping the guard immediately restores the previous sink"]
pub struct Redirect<'a> {
    streams: &'a ProcessStreams,
    thread: ThreadId,
    id: u64,
    previous: Sink,
}

impl Redirect<'_> {
    /// Returns the sink the redirecting thread saw before the redirect.
    #[must_use]
    pub fn previous(&self) -> &Sink {
        &self.previous
    }
}

impl Drop for Redirect<'_> {
    fn drop(&mut self) {
        let mut redirects = self.streams.redirects();
        if let Some(active) = redirects.get_mut(&self.thread) {
            active.retain(|r| r.id != self.id);
            if active.is_empty() {
                redirects.remove(&self.thread);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams() -> (ProcessStreams, Sink, Sink) {
        let out = Sink::new("out", Vec::new());
        let err = Sink::new("err", Vec::new());
        (ProcessStreams::new(out.clone(), err.clone()), out, err)
    }

    #[test]
    fn redirect_restores_on_drop() {
        let (streams, out, err) = streams();
        {
            let guard = streams.redirect(SinkSlot::Primary, err.clone());
            assert_eq!(guard.previous(), &out);
            assert_eq!(streams.get(SinkSlot::Primary), err);
        }
        assert_eq!(streams.get(SinkSlot::Primary), out);
    }

    #[test]
    fn nested_redirects_unwind_in_order() {
        let (streams, out, err) = streams();
        let outer = streams.redirect(SinkSlot::Primary, err.clone());
        {
            let inner = streams.redirect(SinkSlot::Primary, out.clone());
            assert_eq!(inner.previous(), &err);
            assert_eq!(streams.get(SinkSlot::Primary), out);
        }
        assert_eq!(streams.get(SinkSlot::Primary), err);
        drop(outer);
        assert_eq!(streams.get(SinkSlot::Primary), out);
    }

    #[test]
    fn redirect_restores_during_unwind() {
        let (streams, out, err) = streams();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = streams.redirect(SinkSlot::Primary, err.clone());
            panic!("emit failed");
        }));
        assert!(result.is_err());
        assert_eq!(streams.get(SinkSlot::Primary), out);

        drop(streams.redirect(SinkSlot::Secondary, out.clone()));
        assert_eq!(streams.get(SinkSlot::Secondary), err);
    }

    #[test]
    fn redirect_is_invisible_to_other_threads() {
        let (streams, out, err) = streams();
        let _guard = streams.redirect(SinkSlot::Primary, err.clone());
        let seen = thread::scope(|scope| {
            scope
                .spawn(|| streams.get(SinkSlot::Primary))
                .join()
                .expect("reader")
        });
        assert_eq!(seen, out);
        assert_eq!(streams.get(SinkSlot::Primary), err);
    }

    #[test]
    fn clones_share_slots() {
        let (streams, _, err) = streams();
        let clone = streams.clone();
        let displaced = clone.replace(SinkSlot::Primary, err.clone());
        assert_eq!(streams.get(SinkSlot::Primary), err);
        assert!(streams.same(&clone));
        assert_eq!(displaced.label(), "out");
    }
}
