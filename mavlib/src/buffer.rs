//! Append-and-consume byte reservoir feeding the framer.

/// Initial backing capacity; enough for a dozen full frames.
pub const INITIAL_CAPACITY: usize = 4096;

/// A byte reservoir that tolerates partial and misaligned input.
///
/// Storage is one backing array with `start`/`end` indices; instead of
/// wrapping, live bytes are moved back to index 0 when room runs out,
/// and the array doubles when even that is not enough. Steady-state
/// appends therefore allocate nothing.
///
/// [StreamBuffer::contents] borrows the live range; the borrow ends
/// before the next [StreamBuffer::append] can happen.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    buf: Vec<u8>,
    start: usize,
    end: usize,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            start: 0,
            end: 0,
        }
    }

    /// Number of live bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Copy `bytes` in after the live range, growing or compacting the
    /// backing array as needed.
    pub fn append(&mut self, bytes: &[u8]) {
        let live = self.len();
        let required = live + bytes.len();

        if required > self.buf.len() {
            let mut grown = vec![0; required.max(self.buf.len() * 2)];
            grown[..live].copy_from_slice(&self.buf[self.start..self.end]);
            self.buf = grown;
            self.start = 0;
            self.end = live;
        } else if self.end + bytes.len() > self.buf.len() {
            self.buf.copy_within(self.start..self.end, 0);
            self.start = 0;
            self.end = live;
        }

        self.buf[self.end..self.end + bytes.len()].copy_from_slice(bytes);
        self.end += bytes.len();
    }

    /// The live bytes. Finish with the view before mutating the
    /// buffer; the borrow checker holds you to it.
    pub fn contents(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Discard `n` bytes from the front. Callers pass only counts they
    /// actually consumed; `n` beyond the live length is a bug and
    /// saturates after a debug assertion.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len(), "consumed {} of {} live bytes", n, self.len());
        self.start = (self.start + n).min(self.end);
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    /// Drop everything, keeping the backing array.
    pub fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}
