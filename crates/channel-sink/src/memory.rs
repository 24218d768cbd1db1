//! In-memory capture sinks used by tests across the workspace.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sink::Sink;

/// Capture buffer that hands out a [`Sink`] writing into shared memory.
///
/// Tests build one capture per destination, route channels to
/// [`sink`](Self::sink), and later inspect what arrived with
/// [`text`](Self::text) or [`lines`](Self::lines). Every call to `sink` returns
/// a clone of the same [`Sink`], so identity comparisons against resolved
/// bindings work as expected.
#[derive(Clone, Debug)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    sink: Sink,
}

struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemorySink {
    /// Creates an empty capture whose sink carries `label`.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::new(label, SharedWriter(Arc::clone(&buffer)));
        Self { buffer, sink }
    }

    /// Returns the sink writing into this capture.
    #[must_use]
    pub fn sink(&self) -> Sink {
        self.sink.clone()
    }

    /// Returns a copy of the captured bytes.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.buffer).clone()
    }

    /// Returns the captured bytes as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }

    /// Returns the captured output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_owned).collect()
    }

    /// Reports whether nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.buffer).is_empty()
    }

    /// Discards everything captured so far.
    pub fn clear(&self) {
        lock(&self.buffer).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_clones_write_into_one_buffer() {
        let capture = MemorySink::new("capture");
        capture.sink().write_all(b"one ").expect("write succeeds");
        capture.sink().write_all(b"two").expect("write succeeds");
        assert_eq!(capture.text(), "one two");
        assert_eq!(capture.sink(), capture.sink());
    }

    #[test]
    fn clear_discards_previous_output() {
        let capture = MemorySink::new("capture");
        capture.sink().write_all(b"stale\n").expect("write succeeds");
        assert_eq!(capture.lines(), ["stale"]);
        capture.clear();
        assert!(capture.is_empty());
    }
}
