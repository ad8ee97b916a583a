//! The large-object file-stream engine.
//!
//! [`DbFile`] maps file semantics (read, write, seek, truncate, line
//! iteration) onto chunked large-object calls inside the caller's
//! transaction. Object lifetime is transaction-scoped: a rollback
//! discards objects created here and restores objects deleted elsewhere
//! in the transaction, so closing a stream never finalizes anything.

use std::io::SeekFrom;

use crate::errors::{StorageError, StorageResult};
use crate::lo::{Fd, LargeObjects, Loid, INV_READ, INV_WRITE, SEEK_CUR, SEEK_END, SEEK_SET};

/// Bytes moved per underlying read/write call.
///
/// Large objects are streamed through a row-level API with per-call
/// overhead; fixed-size chunking amortizes that overhead while bounding
/// peak memory for arbitrarily large payloads.
pub const CHUNK_SIZE: usize = 65536;

/// Probe size for [`DbFile::read_line`].
const LINE_SIZE: usize = 64;

/// Open mode of a [`DbFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; the object must already exist.
    Read,
    /// Write-only.
    Write,
    /// Read and write.
    ReadWrite,
    /// Write-only, positioned at end-of-object on open.
    Append,
}

impl OpenMode {
    fn flags(self) -> i32 {
        match self {
            OpenMode::Read => INV_READ,
            OpenMode::Write | OpenMode::Append => INV_WRITE,
            OpenMode::ReadWrite => INV_READ | INV_WRITE,
        }
    }

    /// Whether reads are allowed in this mode.
    pub fn readable(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    /// Whether writes are allowed in this mode.
    pub fn writable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

/// File-like stream over exactly one large object.
///
/// The bound loid is fixed for the instance's lifetime; a new loid
/// requires a new instance. The cursor lives server-side: every seek is
/// forwarded immediately and [`tell`](Self::tell) reflects the
/// descriptor's own position, never a client-side shadow.
///
/// Dropping the stream closes the descriptor on every exit path; the
/// bound transaction is never touched.
pub struct DbFile<'a, B: LargeObjects> {
    lo: &'a mut B,
    loid: Loid,
    fd: Option<Fd>,
    mode: OpenMode,
}

impl<'a, B: LargeObjects> DbFile<'a, B> {
    /// Creates a fresh large object and opens it.
    ///
    /// The new id is bound permanently and retrievable via
    /// [`loid`](Self::loid), for the caller to persist as the canonical
    /// filename stem. The mode must allow writing.
    pub fn create(lo: &'a mut B, mode: OpenMode) -> StorageResult<Self> {
        if !mode.writable() {
            return Err(StorageError::Mode("writing"));
        }
        if !lo.is_active() {
            return Err(StorageError::NoActiveTransaction);
        }
        let loid = lo.create()?;
        Self::open_bound(lo, loid, mode)
    }

    /// Opens an existing large object.
    pub fn open(lo: &'a mut B, loid: Loid, mode: OpenMode) -> StorageResult<Self> {
        if !lo.is_active() {
            return Err(StorageError::NoActiveTransaction);
        }
        Self::open_bound(lo, loid, mode)
    }

    fn open_bound(lo: &'a mut B, loid: Loid, mode: OpenMode) -> StorageResult<Self> {
        let fd = lo.open(loid, mode.flags())?;
        if mode == OpenMode::Append {
            lo.seek(fd, 0, SEEK_END)?;
        }
        Ok(Self {
            lo,
            loid,
            fd: Some(fd),
            mode,
        })
    }

    /// The bound large-object id.
    pub fn loid(&self) -> Loid {
        self.loid
    }

    /// The mode the stream was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.fd.is_none()
    }

    fn ready(&self) -> StorageResult<Fd> {
        let fd = self.fd.ok_or(StorageError::ClosedStream)?;
        if !self.lo.is_active() {
            return Err(StorageError::NoActiveTransaction);
        }
        Ok(fd)
    }

    /// Reads at most `n` bytes from the current position.
    ///
    /// Issues as many chunked handle reads as required to satisfy `n` or
    /// reach end-of-object; returns an empty buffer at end-of-object.
    pub fn read(&mut self, n: usize) -> StorageResult<Vec<u8>> {
        let fd = self.ready()?;
        if !self.mode.readable() {
            return Err(StorageError::Mode("reading"));
        }
        let mut out = Vec::with_capacity(n.min(CHUNK_SIZE));
        while out.len() < n {
            let want = (n - out.len()).min(CHUNK_SIZE);
            let chunk = self.lo.read(fd, want)?;
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Reads until end-of-object, one chunk at a time.
    pub fn read_to_end(&mut self) -> StorageResult<Vec<u8>> {
        let fd = self.ready()?;
        if !self.mode.readable() {
            return Err(StorageError::Mode("reading"));
        }
        let mut out = Vec::new();
        loop {
            let chunk = self.lo.read(fd, CHUNK_SIZE)?;
            if chunk.is_empty() {
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Writes `data` at the current position in fixed-size chunks;
    /// returns the total byte count written.
    pub fn write(&mut self, data: &[u8]) -> StorageResult<usize> {
        let fd = self.ready()?;
        if !self.mode.writable() {
            return Err(StorageError::Mode("writing"));
        }
        let mut written = 0;
        for chunk in data.chunks(CHUNK_SIZE) {
            written += self.lo.write(fd, chunk)?;
        }
        Ok(written)
    }

    /// Moves the cursor; returns the new absolute position.
    ///
    /// Seeking past end-of-object is allowed; a subsequent write extends
    /// the object and the gap reads back as zero bytes.
    pub fn seek(&mut self, pos: SeekFrom) -> StorageResult<u64> {
        let fd = self.ready()?;
        let (offset, whence) = match pos {
            SeekFrom::Start(off) => (off as i64, SEEK_SET),
            SeekFrom::Current(off) => (off, SEEK_CUR),
            SeekFrom::End(off) => (off, SEEK_END),
        };
        let new = self.lo.seek(fd, offset, whence)?;
        Ok(new as u64)
    }

    /// Current absolute position.
    pub fn tell(&mut self) -> StorageResult<u64> {
        let fd = self.ready()?;
        Ok(self.lo.tell(fd)? as u64)
    }

    /// Truncates (or zero-extends) to `len`, or to the current position
    /// when `len` is `None`. Returns the resulting length.
    pub fn truncate(&mut self, len: Option<u64>) -> StorageResult<u64> {
        let fd = self.ready()?;
        if !self.mode.writable() {
            return Err(StorageError::Mode("writing"));
        }
        let len = match len {
            Some(len) => len,
            None => self.lo.tell(fd)? as u64,
        };
        self.lo.truncate(fd, len as i64)?;
        Ok(len)
    }

    /// Object length in bytes. The cursor is restored afterwards.
    pub fn size(&mut self) -> StorageResult<u64> {
        let fd = self.ready()?;
        let pos = self.lo.tell(fd)?;
        let size = self.lo.seek(fd, 0, SEEK_END)?;
        self.lo.seek(fd, pos, SEEK_SET)?;
        Ok(size as u64)
    }

    /// Reads one line, up to and including the terminating `\n`, or at
    /// most `limit` bytes when given.
    ///
    /// Probes forward in small reads, then repositions the cursor to the
    /// end of the returned line so over-read bytes are not consumed.
    pub fn read_line(&mut self, limit: Option<usize>) -> StorageResult<Vec<u8>> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let pos = self.tell()?;
        let mut line = Vec::new();
        loop {
            let chunk = self.read(LINE_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            if let Some(i) = chunk.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&chunk[..=i]);
                break;
            }
            line.extend_from_slice(&chunk);
            if limit.is_some_and(|limit| line.len() >= limit) {
                break;
            }
        }
        if let Some(limit) = limit {
            line.truncate(limit);
        }
        self.seek(SeekFrom::Start(pos + line.len() as u64))?;
        Ok(line)
    }

    /// Lazy, single-pass iterator over `\n`-delimited chunks.
    ///
    /// Reads progressively from the handle instead of materializing the
    /// object; not restartable without a fresh seek to the start. The
    /// final chunk is yielded without a terminator if the object does not
    /// end in `\n`. Dropping the iterator repositions the stream to the
    /// last consumed byte.
    pub fn lines(&mut self) -> Lines<'_, 'a, B> {
        Lines {
            file: self,
            start: None,
            consumed: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Releases the descriptor. Idempotent; the bound transaction is
    /// never touched.
    pub fn close(&mut self) -> StorageResult<()> {
        if let Some(fd) = self.fd.take() {
            self.lo.close(fd)?;
        }
        Ok(())
    }
}

impl<B: LargeObjects> Drop for DbFile<'_, B> {
    fn drop(&mut self) {
        // Errors on the exit path have nowhere to go; callers that care
        // close explicitly.
        let _ = self.close();
    }
}

/// Iterator returned by [`DbFile::lines`].
pub struct Lines<'f, 'a, B: LargeObjects> {
    file: &'f mut DbFile<'a, B>,
    start: Option<u64>,
    consumed: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<B: LargeObjects> Iterator for Lines<'_, '_, B> {
    type Item = StorageResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start.is_none() {
            match self.file.tell() {
                Ok(pos) => self.start = Some(pos),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        loop {
            if let Some(i) = self.buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buf.drain(..=i).collect();
                self.consumed += line.len() as u64;
                return Some(Ok(line));
            }
            if self.done {
                if self.buf.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut self.buf);
                self.consumed += line.len() as u64;
                return Some(Ok(line));
            }
            match self.file.read(CHUNK_SIZE) {
                Ok(chunk) if chunk.is_empty() => self.done = true,
                Ok(chunk) => self.buf.extend_from_slice(&chunk),
                Err(err) => {
                    self.done = true;
                    self.buf.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<B: LargeObjects> Drop for Lines<'_, '_, B> {
    fn drop(&mut self) {
        // Leave the cursor at the last consumed byte rather than at the
        // read-ahead position.
        if let Some(start) = self.start {
            let _ = self.file.seek(SeekFrom::Start(start + self.consumed));
        }
    }
}
