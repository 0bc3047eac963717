use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use crate::byteorder::{WriteBytesLe, join_bytes_le};

// W64 GUIDs as defined in Sony Wave64 specification
pub const W64_RIFF_GUID: [u8; 16] = [
    0x72, 0x69, 0x66, 0x66, 0x2E, 0x91, 0xCF, 0x11, 0xA5, 0xD6, 0x28, 0xDB, 0x04, 0xC1, 0x00, 0x00,
];
pub const W64_WAVE_GUID: [u8; 16] = [
    0x77, 0x61, 0x76, 0x65, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];
pub const W64_FMT_GUID: [u8; 16] = [
    0x66, 0x6D, 0x74, 0x20, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];
pub const W64_DATA_GUID: [u8; 16] = [
    0x64, 0x61, 0x74, 0x61, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;

/// Chunk header: GUID plus 64-bit size.
const CHUNK_HEADER_SIZE: u64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct W64Format {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub float: bool,
}

impl W64Format {
    fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    fn fmt_chunk(&self) -> Vec<u8> {
        let tag = if self.float {
            FORMAT_IEEE_FLOAT
        } else {
            FORMAT_PCM
        };
        let byte_rate = self.sample_rate * self.block_align() as u32;

        join_bytes_le!(
            W64_FMT_GUID,
            CHUNK_HEADER_SIZE + 16,
            tag,
            self.channels,
            self.sample_rate,
            byte_rate,
            self.block_align(),
            self.bits_per_sample,
        )
    }
}

/// Sony Wave64 writer for sample streams.
///
/// The header is written on creation with zero sizes, which `finish` patches.
pub struct W64Writer<W: Write + Seek> {
    writer: BufWriter<W>,
    format: W64Format,
    file_size_position: u64,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> W64Writer<W> {
    pub fn new(writer: W, format: W64Format) -> io::Result<Self> {
        let mut writer = BufWriter::new(writer);

        writer.write_all(&W64_RIFF_GUID)?;
        let file_size_position = writer.stream_position()?;
        writer.write_all(&join_bytes_le!(0u64, W64_WAVE_GUID))?;
        writer.write_all(&format.fmt_chunk())?;

        writer.write_all(&W64_DATA_GUID)?;
        let data_size_position = writer.stream_position()?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            writer,
            format,
            file_size_position,
            data_size_position,
            data_written: 0,
        })
    }

    pub fn format(&self) -> W64Format {
        self.format
    }

    /// Appends interleaved sample values.
    pub fn write_samples<T: WriteBytesLe>(&mut self, samples: &[T]) -> io::Result<()> {
        let sample_bytes = (self.format.bits_per_sample / 8) as usize;
        let mut bytes = Vec::with_capacity(samples.len() * sample_bytes);
        samples.iter().for_each(|sample| sample.write_le(&mut bytes));

        self.writer.write_all(&bytes)?;
        self.data_written += bytes.len() as u64;
        Ok(())
    }

    /// Patches the RIFF and data chunk sizes and flushes.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;

        let current_pos = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer
            .write_all(&(self.data_written + CHUNK_HEADER_SIZE).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.file_size_position))?;
        self.writer.write_all(&current_pos.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(current_pos))?;
        self.writer.flush()
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn format(channels: u16, float: bool) -> W64Format {
        W64Format {
            sample_rate: 4_092_000,
            channels,
            bits_per_sample: if float { 32 } else { 16 },
            float,
        }
    }

    #[test]
    fn header_layout() -> io::Result<()> {
        let writer = W64Writer::new(Cursor::new(Vec::new()), format(2, false))?;
        let buffer = writer.into_inner()?.into_inner();

        assert_eq!(&buffer[0..16], &W64_RIFF_GUID);
        assert_eq!(&buffer[24..40], &W64_WAVE_GUID);
        assert_eq!(&buffer[40..56], &W64_FMT_GUID);
        // format tag and channel count
        assert_eq!(&buffer[64..68], &[1u8, 0, 2, 0]);
        assert_eq!(&buffer[80..96], &W64_DATA_GUID);
        assert_eq!(buffer.len(), 104);
        Ok(())
    }

    #[test]
    fn sizes_are_patched_on_finish() -> io::Result<()> {
        let mut writer = W64Writer::new(Cursor::new(Vec::new()), format(1, true))?;
        writer.write_samples(&[0.5f32, -0.5])?;
        assert_eq!(writer.data_written(), 8);
        writer.finish()?;

        let buffer = writer.into_inner()?.into_inner();
        assert_eq!(&buffer[64..66], &[3u8, 0]);
        assert_eq!(buffer[96..104], 32u64.to_le_bytes());
        assert_eq!(buffer[16..24], 112u64.to_le_bytes());
        Ok(())
    }
}
