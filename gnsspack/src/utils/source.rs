//! Byte sources feeding lane pipelines.
//!
//! A [`ByteSource`] hands out exact byte counts and reports how a request
//! ended: fully served, at a clean end of input, or cut short. The
//! distinction lets pipelines tell a finished recording from a truncated one.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::utils::errors::SourceError;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of a read or skip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// All requested bytes were served.
    Full,
    /// No bytes were left.
    Empty,
    /// The input ended after this many bytes.
    Partial(u64),
}

pub trait ByteSource: Send {
    fn is_open(&self) -> bool;

    /// Fills `buf` completely unless the input ends first.
    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> Result<Fill, SourceError>;

    /// Discards `n` bytes.
    fn skip(&mut self, n: u64) -> Result<Fill, SourceError>;

    /// Bytes consumed since the source was opened.
    fn position(&self) -> u64;

    fn close(&mut self);
}

/// A [`ByteSource`] over any reader.
pub struct ReaderSource<R> {
    reader: Option<R>,
    position: u64,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            position: 0,
        }
    }

    fn reader(&mut self) -> Result<&mut R, SourceError> {
        self.reader.as_mut().ok_or(SourceError::Closed)
    }
}

fn fill_of(requested: u64, served: u64) -> Fill {
    if served == requested {
        Fill::Full
    } else if served == 0 {
        Fill::Empty
    } else {
        Fill::Partial(served)
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> Result<Fill, SourceError> {
        let reader = self.reader()?;

        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.position += filled as u64;
        Ok(fill_of(buf.len() as u64, filled as u64))
    }

    fn skip(&mut self, n: u64) -> Result<Fill, SourceError> {
        let reader = self.reader()?;
        let skipped = io::copy(&mut reader.by_ref().take(n), &mut io::sink())?;

        self.position += skipped;
        Ok(fill_of(n, skipped))
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

/// Opens the byte source behind a file path.
pub trait SourceOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn ByteSource>, SourceError>;
}

/// Opens files from the local file system with buffered reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOpener;

impl SourceOpener for FileOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ByteSource>, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Box::new(ReaderSource::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            file,
        ))))
    }
}

/// Serves recordings held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    files: HashMap<PathBuf, Arc<[u8]>>,
}

impl MemoryOpener {
    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, data: impl Into<Arc<[u8]>>) {
        self.files.insert(path.into(), data.into());
    }

    pub fn with_file<P: Into<PathBuf>>(mut self, path: P, data: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl SourceOpener for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ByteSource>, SourceError> {
        let data = self.files.get(path).ok_or_else(|| SourceError::Open {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })?;

        Ok(Box::new(ReaderSource::new(io::Cursor::new(data.clone()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_full_partial_and_empty() -> Result<(), SourceError> {
        let mut source = ReaderSource::new(io::Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut buf = [0u8; 2];

        assert_eq!(source.read_exact_or_eof(&mut buf)?, Fill::Full);
        assert_eq!(buf, [1, 2]);
        assert_eq!(source.skip(1)?, Fill::Full);
        assert_eq!(source.read_exact_or_eof(&mut buf)?, Fill::Full);
        assert_eq!(buf, [4, 5]);
        assert_eq!(source.read_exact_or_eof(&mut buf)?, Fill::Empty);
        assert_eq!(source.position(), 5);

        let mut source = ReaderSource::new(io::Cursor::new(vec![1u8, 2, 3]));
        assert_eq!(source.skip(5)?, Fill::Partial(3));
        Ok(())
    }

    #[test]
    fn closed_source_rejects_reads() {
        let mut source = ReaderSource::new(io::Cursor::new(vec![1u8]));
        source.close();
        assert!(!source.is_open());
        assert!(matches!(
            source.read_exact_or_eof(&mut [0u8; 1]),
            Err(SourceError::Closed)
        ));
    }

    #[test]
    fn memory_opener_misses_unknown_paths() {
        let opener = MemoryOpener::default().with_file("a.bin", vec![0u8; 4]);
        assert!(opener.open(Path::new("a.bin")).is_ok());
        assert!(matches!(
            opener.open(Path::new("b.bin")),
            Err(SourceError::Open { .. })
        ));
    }
}
