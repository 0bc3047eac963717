use std::io;
use std::sync::Arc;

use bitstream_io::Endianness;

use crate::process::plan::{ChunkPlan, UnitKind};
use crate::sink::{SinkHandle, SinkRegistry, lock};
use crate::structs::format::{Endian, Shift};
use crate::structs::stream_info::StreamInfo;
use crate::utils::bitstream_io::{BigEndian, ChunkBitReader, LittleEndian};
use crate::utils::errors::{ConvertError, SourceError};
use crate::utils::sample::Sample;
use crate::utils::source::{ByteSource, Fill};

struct StreamBinding {
    info: Arc<StreamInfo>,
    sink: SinkHandle,
}

/// Executes a [`ChunkPlan`] against a byte source.
///
/// Each execution reads one chunk, extracts every unit in physical order and
/// then hands the decoded samples to their sinks in call order.
pub struct ChunkExecutor {
    plan: ChunkPlan,
    bindings: Vec<StreamBinding>,
    dispatch: Vec<usize>,
    buf: Vec<u8>,
    values: Vec<Option<Sample>>,
}

impl ChunkExecutor {
    /// Registers the plan's streams and resolves their sinks.
    pub fn new(plan: ChunkPlan, registry: &SinkRegistry) -> Result<Self, ConvertError> {
        let bindings = plan
            .streams()
            .iter()
            .map(|info| {
                let info = registry.stream_info_or_insert(StreamInfo::clone(info));
                let sink = registry.sink(&info.id)?;
                Ok(StreamBinding { info, sink })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;

        Ok(Self {
            dispatch: plan.dispatch_order(),
            buf: vec![0u8; plan.size_bytes()],
            values: vec![None; plan.units().len()],
            bindings,
            plan,
        })
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Reads and decodes one chunk.
    ///
    /// Returns the number of samples delivered, or `None` when the source
    /// was already exhausted.
    pub fn execute(
        &mut self,
        lane: &str,
        source: &mut dyn ByteSource,
    ) -> Result<Option<u64>, ConvertError> {
        let fill = source
            .read_exact_or_eof(&mut self.buf)
            .map_err(|e| ConvertError::from_source(lane, e))?;
        match fill {
            Fill::Full => {}
            Fill::Empty => return Ok(None),
            Fill::Partial(got) => {
                return Err(ConvertError::from_source(
                    lane,
                    SourceError::Truncated {
                        position: source.position() - got,
                        expected: self.buf.len() as u64,
                        got,
                    },
                ));
            }
        }

        let extracted = match self.plan.shift() {
            Shift::Left => {
                self.plan
                    .word_size()
                    .reorder(&mut self.buf, self.plan.endian(), Endian::Big);
                self.extract::<BigEndian>()
            }
            Shift::Right => {
                self.plan
                    .word_size()
                    .reorder(&mut self.buf, self.plan.endian(), Endian::Little);
                self.extract::<LittleEndian>()
            }
        };
        extracted.map_err(|e| ConvertError::from_source(lane, SourceError::Io(e)))?;

        self.dispatch().map(Some)
    }

    fn extract<E: Endianness>(&mut self) -> io::Result<()> {
        let mut reader = ChunkBitReader::<E>::from_slice(&self.buf);

        for (value, unit) in self.values.iter_mut().zip(self.plan.units()) {
            *value = match unit.kind {
                UnitKind::Padding => {
                    reader.skip_n(unit.bits)?;
                    None
                }
                UnitKind::Sample { decoder, .. } => Some(decoder.read(&mut reader)?),
            };
        }

        Ok(())
    }

    fn dispatch(&self) -> Result<u64, ConvertError> {
        let units = self.plan.units();
        let mut delivered = 0;

        for &index in &self.dispatch {
            let (Some(sample), Some(stream)) = (self.values[index], units[index].stream()) else {
                continue;
            };

            let binding = &self.bindings[stream];
            lock(binding.sink.as_ref())
                .consume(sample, &binding.info)
                .map_err(|cause| ConvertError::Sink {
                    stream: binding.info.id.clone(),
                    cause,
                })?;
            delivered += 1;
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::plan::tests::{chunk, metadata, stream};
    use crate::sink::MemoryCollector;
    use crate::structs::descriptor::{Chunk, Stream};
    use crate::utils::source::ReaderSource;

    fn executor(chunk: &Chunk, collector: &MemoryCollector) -> ChunkExecutor {
        let md = metadata();
        let plan = ChunkPlan::build(chunk, &md, &md.systems[0]).unwrap();
        let registry = SinkRegistry::new(collector.clone());
        ChunkExecutor::new(plan, &registry).unwrap()
    }

    fn source(bytes: &[u8]) -> ReaderSource<io::Cursor<Vec<u8>>> {
        ReaderSource::new(io::Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn left_shift_reads_from_the_msb() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let mut exec = executor(
            &chunk(1, 1, vec![stream("a", 1, 4, 4), stream("b", 1, 4, 4)]),
            &collector,
        );

        assert_eq!(exec.execute("lane", &mut source(&[0x1E]))?, Some(2));
        assert_eq!(collector.values("a"), vec![1.0]);
        assert_eq!(collector.values("b"), vec![-2.0]);
        Ok(())
    }

    #[test]
    fn right_shift_reads_from_the_lsb() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let mut c = chunk(1, 1, vec![stream("a", 1, 4, 4), stream("b", 1, 4, 4)]);
        c.shift = Shift::Right;
        let mut exec = executor(&c, &collector);

        exec.execute("lane", &mut source(&[0x1E]))?;
        assert_eq!(collector.values("a"), vec![-2.0]);
        assert_eq!(collector.values("b"), vec![1.0]);
        Ok(())
    }

    #[test]
    fn little_endian_words_are_reordered() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let mut c = chunk(2, 2, vec![stream("a", 1, 16, 16)]);
        c.endian = Endian::Little;
        let mut exec = executor(&c, &collector);

        exec.execute("lane", &mut source(&[0x34, 0x12, 0xFF, 0xFF]))?;
        assert_eq!(collector.values("a"), vec![4660.0, -1.0]);
        Ok(())
    }

    #[test]
    fn samples_reach_sinks_in_call_order() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let mut c = chunk(1, 1, vec![stream("a", 1, 2, 2)]);
        c.lumps[0].shift = Shift::Right;
        let mut exec = executor(&c, &collector);

        // physical order 0, 1, -2, -1
        exec.execute("lane", &mut source(&[0b00_01_10_11]))?;
        assert_eq!(collector.values("a"), vec![-1.0, -2.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn padding_bits_are_skipped() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let s = Stream {
            alignment: crate::structs::format::Alignment::Right,
            ..stream("a", 1, 8, 4)
        };
        let mut exec = executor(&chunk(1, 2, vec![s]), &collector);

        exec.execute("lane", &mut source(&[0xF3, 0x0C]))?;
        assert_eq!(collector.values("a"), vec![3.0, -4.0]);
        Ok(())
    }

    #[test]
    fn short_reads() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let mut exec = executor(&chunk(2, 1, vec![stream("a", 1, 16, 16)]), &collector);

        assert_eq!(exec.execute("lane", &mut source(&[]))?, None);

        let err = exec.execute("lane", &mut source(&[0x01])).err().unwrap();
        assert!(matches!(
            err,
            ConvertError::Source {
                source: SourceError::Truncated {
                    position: 0,
                    expected: 2,
                    got: 1
                },
                ..
            }
        ));
        assert!(collector.samples("a").is_empty());
        Ok(())
    }
}
