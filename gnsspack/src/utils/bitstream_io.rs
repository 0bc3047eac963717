//! Bit-level reading of chunk buffers.
//!
//! Wraps a `bitstream_io` reader over one chunk's bytes. The endianness
//! parameter selects the extraction direction: [`BigEndian`] consumes each
//! byte from its most significant bit, [`LittleEndian`] from its least
//! significant bit.

use std::io;

use bitstream_io::{BitRead, BitReader, Endianness};

pub use bitstream_io::{BigEndian, LittleEndian};

#[derive(Debug)]
pub struct ChunkBitReader<'a, E: Endianness> {
    bs: BitReader<io::Cursor<&'a [u8]>, E>,
    len: u64,
}

impl<'a, E: Endianness> ChunkBitReader<'a, E> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self {
            bs: BitReader::new(io::Cursor::new(buf)),
            len: (buf.len() as u64) << 3,
        }
    }

    /// Reads `n` bits, `1 <= n <= 64`, as an unsigned value.
    #[inline(always)]
    pub fn get_n(&mut self, n: u32) -> io::Result<u64> {
        match self.bs.read_unsigned_var::<u64>(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u64) -> io::Result<()> {
        if n > self.available()? {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "skip_n({}): out of bounds bits at {}",
                    n,
                    self.position()?
                ),
            ));
        }

        let mut remaining = n;
        while remaining > 0 {
            let step = remaining.min(u32::MAX as u64) as u32;
            self.bs.skip(step)?;
            remaining -= step as u64;
        }

        Ok(())
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}
