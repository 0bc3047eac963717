//! Fixed-width word handling for chunk buffers.
//!
//! A chunk's words are stored in the recording with a declared byte order.
//! Before bits are extracted the buffer is rewritten in place so that a
//! plain MSB-first (big-endian) or LSB-first (little-endian) bit reader
//! walks the words in the order the chunk's shift direction requires.

use crate::structs::format::Endian;
use crate::utils::errors::DescriptorError;

pub trait Word: Copy {
    const BYTES: usize;

    fn load(src: &[u8], endian: Endian) -> Self;

    fn store(self, dst: &mut [u8], endian: Endian);
}

macro_rules! impl_word {
    ($($t:ty),+) => { $(
        impl Word for $t {
            const BYTES: usize = size_of::<$t>();

            #[inline]
            fn load(src: &[u8], endian: Endian) -> Self {
                let mut bytes = [0u8; size_of::<$t>()];
                bytes.copy_from_slice(src);
                match endian {
                    Endian::Big => <$t>::from_be_bytes(bytes),
                    Endian::Little => <$t>::from_le_bytes(bytes),
                }
            }

            #[inline]
            fn store(self, dst: &mut [u8], endian: Endian) {
                match endian {
                    Endian::Big => dst.copy_from_slice(&self.to_be_bytes()),
                    Endian::Little => dst.copy_from_slice(&self.to_le_bytes()),
                }
            }
        }
    )+ }
}

impl_word!(u8, u16, u32, u64);

/// Rewrites every word of `buf` from `from` byte order to `to` byte order.
fn reorder_words<W: Word>(buf: &mut [u8], from: Endian, to: Endian) {
    if from == to || W::BYTES == 1 {
        return;
    }
    for chunk in buf.chunks_exact_mut(W::BYTES) {
        W::load(chunk, from).store(chunk, to);
    }
}

/// Word width of a chunk, resolved once when the plan is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    W8,
    W16,
    W32,
    W64,
}

impl WordSize {
    pub fn bytes(self) -> usize {
        match self {
            WordSize::W8 => u8::BYTES,
            WordSize::W16 => u16::BYTES,
            WordSize::W32 => u32::BYTES,
            WordSize::W64 => u64::BYTES,
        }
    }

    pub fn reorder(self, buf: &mut [u8], from: Endian, to: Endian) {
        match self {
            WordSize::W8 => reorder_words::<u8>(buf, from, to),
            WordSize::W16 => reorder_words::<u16>(buf, from, to),
            WordSize::W32 => reorder_words::<u32>(buf, from, to),
            WordSize::W64 => reorder_words::<u64>(buf, from, to),
        }
    }
}

impl TryFrom<u64> for WordSize {
    type Error = DescriptorError;

    fn try_from(size_word: u64) -> Result<Self, Self::Error> {
        match size_word {
            1 => Ok(WordSize::W8),
            2 => Ok(WordSize::W16),
            4 => Ok(WordSize::W32),
            8 => Ok(WordSize::W64),
            other => Err(DescriptorError::UnsupportedWordSize(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_size_from_bytes() {
        assert_eq!(WordSize::try_from(4u64).unwrap(), WordSize::W32);
        assert_eq!(WordSize::W64.bytes(), 8);
        assert_eq!(
            WordSize::try_from(3u64),
            Err(DescriptorError::UnsupportedWordSize(3))
        );
    }

    #[test]
    fn reorder_swaps_within_words() {
        let mut buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        WordSize::W32.reorder(&mut buf, Endian::Little, Endian::Big);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01, 0x08, 0x07, 0x06, 0x05]);

        let mut buf = [0x01, 0x02, 0x03, 0x04];
        WordSize::W16.reorder(&mut buf, Endian::Big, Endian::Little);
        assert_eq!(buf, [0x02, 0x01, 0x04, 0x03]);

        let mut buf = [0x01, 0x02];
        WordSize::W8.reorder(&mut buf, Endian::Big, Endian::Little);
        assert_eq!(buf, [0x01, 0x02]);
    }
}
