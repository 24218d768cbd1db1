//! crates/channel-sink/src/sink.rs
//! Identity-comparable handles over writable destinations.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::line_mode::LineMode;

/// Opaque identifier derived from a [`Sink`]'s shared allocation.
///
/// Two identifiers are equal exactly when the sinks they were taken from are
/// clones of the same handle. Identifiers stay meaningful only while at least
/// one clone of the sink is alive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SinkId(usize);

/// Shared handle to an opaque writable destination.
///
/// A sink owns its [`Write`] implementor behind a mutex so that every clone
/// writes into the same destination. Equality, hashing and [`SinkId`] all use
/// the identity of the shared allocation: two sinks wrapping separate
/// `Vec<u8>` buffers are different sinks even when the buffers hold identical
/// bytes, and two clones of one sink are always the same sink.
///
/// # Examples
///
/// ```
/// use channel_sink::Sink;
///
/// let sink = Sink::new("capture", Vec::new());
/// let alias = sink.clone();
/// assert_eq!(sink, alias);
/// assert_ne!(sink, Sink::new("capture", Vec::new()));
///
/// alias.write_all(b"payload")?;
/// assert_eq!(sink.label(), "capture");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Clone)]
pub struct Sink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    label: Cow<'static, str>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    /// Wraps `writer` in a new sink identified by `label` in diagnostics.
    pub fn new<W>(label: impl Into<Cow<'static, str>>, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            inner: Arc::new(SinkInner {
                label: label.into(),
                writer: Mutex::new(Box::new(writer)),
            }),
        }
    }

    /// Creates a sink over the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    /// Creates a sink over the process's standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }

    /// Returns the label supplied at construction.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the identity of this sink.
    #[must_use]
    pub fn id(&self) -> SinkId {
        SinkId(Arc::as_ptr(&self.inner) as usize)
    }

    /// Reports whether `other` is a clone of this sink.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Writes `bytes` to the destination.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        self.writer().write_all(bytes)
    }

    /// Writes `bytes` followed by the terminator selected by `line_mode`.
    ///
    /// The payload and terminator are written while holding the sink's lock so
    /// concurrent writers never interleave inside one line.
    pub fn write_line(&self, bytes: &[u8], line_mode: LineMode) -> io::Result<()> {
        let mut writer = self.writer();
        writer.write_all(bytes)?;
        writer.write_all(line_mode.terminator())
    }

    /// Flushes the destination.
    pub fn flush(&self) -> io::Result<()> {
        self.writer().flush()
    }

    fn writer(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Sink {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Sink {}

impl Hash for Sink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("label", &self.label())
            .field("id", &self.id())
            .finish()
    }
}
