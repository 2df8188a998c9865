//! Buffered stream reader
//!
//! Presents a contiguous view of unconsumed input backed by one fixed block
//! and a blocking byte source. Unconsumed bytes are moved to the front of the
//! block only when a request would run past its end.

use std::io::{self, ErrorKind, Read};
use tracing::debug;

/// Fixed-capacity buffer over a blocking source
pub struct StreamBuffer<R> {
    source: R,
    buf: Box<[u8]>,
    /// Start of unconsumed bytes
    begin: usize,
    /// End of filled bytes
    end: usize,
    /// Source error that stopped the last fill, if any
    error: Option<io::Error>,
    eof: bool,
}

impl<R: Read> StreamBuffer<R> {
    /// Create a buffer of `capacity` bytes reading from `source`
    pub fn new(source: R, capacity: usize) -> Self {
        Self {
            source,
            buf: vec![0u8; capacity].into_boxed_slice(),
            begin: 0,
            end: 0,
            error: None,
            eof: false,
        }
    }

    /// Guarantee at least `n` unconsumed bytes are resident.
    ///
    /// Returns false when the source hits end-of-stream or fails before `n`
    /// bytes could be accumulated, or when `n` exceeds the capacity.
    pub fn ensure(&mut self, n: usize) -> bool {
        if self.available() >= n {
            return true;
        }
        if n > self.buf.len() {
            debug!(requested = n, capacity = self.buf.len(), "Request exceeds buffer capacity");
            return false;
        }

        if self.begin + n > self.buf.len() {
            self.compact();
        }

        while self.available() < n {
            match self.source.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(read) => self.end += read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.error = Some(e);
                    break;
                }
            }
        }

        self.available() >= n
    }

    /// Mark `n` bytes as consumed. Callers must have ensured them first.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.available());
        self.begin += n;
    }

    /// Unconsumed bytes from the read position
    #[inline]
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.begin..self.end]
    }

    /// Unconsumed bytes starting `offset` past the read position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> &[u8] {
        &self.buf[(self.begin + offset).min(self.end)..self.end]
    }

    /// Number of resident, unconsumed bytes
    #[inline]
    pub fn available(&self) -> usize {
        self.end - self.begin
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Whether the source has reported end-of-stream
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Take the source error that stopped the last fill
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn compact(&mut self) {
        let pending = self.available();
        self.buf.copy_within(self.begin..self.end, 0);
        self.begin = 0;
        self.end = pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Source handing out at most one byte per read
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() || out.is_empty() {
                return Ok(0);
            }
            out[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_ensure_and_advance() {
        let mut reader = StreamBuffer::new(Cursor::new(vec![1u8, 2, 3, 4, 5]), 16);
        assert!(reader.ensure(3));
        assert_eq!(&reader.peek()[..3], &[1, 2, 3]);
        reader.advance(2);
        assert_eq!(reader.peek_at(1)[0], 4);
        assert!(reader.ensure(3));
        assert!(!reader.ensure(4));
        assert!(reader.is_eof());
        assert!(reader.take_error().is_none());
    }

    #[test]
    fn test_trickle_source_fills_request() {
        let data: Vec<u8> = (0..10).collect();
        let mut reader = StreamBuffer::new(Trickle { data, pos: 0 }, 16);
        assert!(reader.ensure(10));
        assert_eq!(reader.peek(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_compaction_preserves_pending_bytes() {
        let data: Vec<u8> = (0..40).collect();
        let mut reader = StreamBuffer::new(Trickle { data, pos: 0 }, 8);

        let mut seen = Vec::new();
        while reader.ensure(3) {
            seen.extend_from_slice(&reader.peek()[..3]);
            reader.advance(3);
        }
        // 40 bytes in chunks of 3 leaves one byte unconsumed
        assert_eq!(seen, (0..39).collect::<Vec<u8>>());
        assert_eq!(reader.peek(), &[39]);
    }

    #[test]
    fn test_request_larger_than_capacity() {
        let mut reader = StreamBuffer::new(Cursor::new(vec![0u8; 64]), 8);
        assert!(!reader.ensure(9));
        assert!(reader.ensure(8));
    }

    #[test]
    fn test_source_error_is_retained() {
        let mut reader = StreamBuffer::new(Broken, 8);
        assert!(!reader.ensure(1));
        let err = reader.take_error().expect("error retained");
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
        assert!(!reader.is_eof());
    }
}
