use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;

use crate::structs::descriptor::{Chunk, Lump, Metadata, Stream, System};
use crate::structs::format::{Alignment, ChunkPadding, Endian, Shift};
use crate::structs::stream_info::StreamInfo;
use crate::utils::errors::DescriptorError;
use crate::utils::sample::SampleDecoder;
use crate::utils::word::WordSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Occupies bits without producing a sample.
    Padding,
    Sample {
        /// Index into [`ChunkPlan::streams`].
        stream: usize,
        decoder: SampleDecoder,
        /// Position of the sample in the chunk's emission sequence.
        call_order: u64,
    },
}

/// One bit-extraction step of a chunk plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleUnit {
    pub bits: u64,
    pub kind: UnitKind,
}

impl SampleUnit {
    fn padding(bits: u64) -> Self {
        Self {
            bits,
            kind: UnitKind::Padding,
        }
    }

    pub fn is_padding(&self) -> bool {
        matches!(self.kind, UnitKind::Padding)
    }

    pub fn call_order(&self) -> Option<u64> {
        match self.kind {
            UnitKind::Padding => None,
            UnitKind::Sample { call_order, .. } => Some(call_order),
        }
    }

    pub fn stream(&self) -> Option<usize> {
        match self.kind {
            UnitKind::Padding => None,
            UnitKind::Sample { stream, .. } => Some(stream),
        }
    }
}

/// The flat, ordered extraction sequence covering one chunk.
///
/// Units are stored in physical order: executing them front to back walks
/// the chunk's bits from the first to the last. The sum of their widths is
/// always the chunk's bit capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    word_size: WordSize,
    endian: Endian,
    shift: Shift,
    count_words: u64,
    size_bytes: usize,
    units: Vec<SampleUnit>,
    streams: Vec<Arc<StreamInfo>>,
}

impl ChunkPlan {
    /// Builds the plan for `chunk`, taking frequencies from `system` and the
    /// bands in `metadata`.
    pub fn build(
        chunk: &Chunk,
        metadata: &Metadata,
        system: &System,
    ) -> Result<Self, DescriptorError> {
        let word_size = WordSize::try_from(chunk.size_word)?;
        if chunk.count_words == 0 {
            return Err(DescriptorError::EmptyChunk);
        }

        let too_large = || DescriptorError::ChunkTooLarge {
            size_word: chunk.size_word,
            count_words: chunk.count_words,
        };
        let capacity = chunk.capacity_bits().ok_or_else(too_large)?;
        let size_bytes = chunk
            .size_bytes()
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(too_large)?;

        let mut builder = PlanBuilder {
            metadata,
            system,
            capacity,
            padded: chunk.padding != ChunkPadding::None,
            units: Vec::new(),
            streams: Vec::new(),
            consumed: 0,
        };

        for (index, lump) in chunk.lumps.iter().enumerate() {
            builder.add_lump(index, lump)?;
        }

        if builder.consumed > capacity {
            return Err(DescriptorError::ChunkOverflow {
                used: builder.consumed,
                capacity,
            });
        }

        let remaining = capacity - builder.consumed;
        if remaining > 0 {
            match chunk.padding {
                ChunkPadding::Head => builder.units.insert(0, SampleUnit::padding(remaining)),
                ChunkPadding::Tail => builder.units.push(SampleUnit::padding(remaining)),
                ChunkPadding::None => {
                    return Err(DescriptorError::UnfilledChunk {
                        used: builder.consumed,
                        capacity,
                    });
                }
            }
        }

        let plan = Self {
            word_size,
            endian: chunk.endian,
            shift: chunk.shift,
            count_words: chunk.count_words,
            size_bytes,
            units: builder.units,
            streams: builder.streams,
        };

        debug!(
            "Chunk plan: {} x {}-byte words, {} samples, {} padding bits, {} streams",
            plan.count_words,
            plan.word_size.bytes(),
            plan.sample_count(),
            plan.padding_bits(),
            plan.streams.len()
        );

        Ok(plan)
    }

    pub fn units(&self) -> &[SampleUnit] {
        &self.units
    }

    /// Metadata of the streams referenced by the units, in first-use order.
    pub fn streams(&self) -> &[Arc<StreamInfo>] {
        &self.streams
    }

    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn shift(&self) -> Shift {
        self.shift
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn capacity_bits(&self) -> u64 {
        self.size_bytes as u64 * 8
    }

    pub fn sample_count(&self) -> usize {
        self.units.iter().filter(|unit| !unit.is_padding()).count()
    }

    pub fn padding_bits(&self) -> u64 {
        self.units
            .iter()
            .filter(|unit| unit.is_padding())
            .map(|unit| unit.bits)
            .sum()
    }

    /// Indices of the sample units sorted by call order; units sharing a
    /// call order keep their physical order.
    pub fn dispatch_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, unit)| !unit.is_padding())
            .map(|(index, _)| index)
            .collect();
        order.sort_by_key(|&index| self.units[index].call_order());
        order
    }
}

/// A stream's contribution to one lump repetition.
struct StreamLayout {
    stream: usize,
    decoder: SampleDecoder,
    rate_factor: u64,
    packed_bits: u64,
    padding_bits: u64,
    alignment: Alignment,
    shift: Shift,
}

struct PlanBuilder<'a> {
    metadata: &'a Metadata,
    system: &'a System,
    capacity: u64,
    padded: bool,
    units: Vec<SampleUnit>,
    streams: Vec<Arc<StreamInfo>>,
    consumed: u64,
}

impl PlanBuilder<'_> {
    fn add_lump(&mut self, index: usize, lump: &Lump) -> Result<(), DescriptorError> {
        if lump.streams.is_empty() {
            return Err(DescriptorError::EmptyLump { lump: index });
        }

        let layouts = lump
            .streams
            .iter()
            .map(|stream| self.layout(stream))
            .collect::<Result<Vec<_>, _>>()?;

        let lump_bits: u64 = layouts.iter().map(|layout| layout.packed_bits).sum();
        if lump_bits == 0 {
            return Err(DescriptorError::ZeroBitLump { lump: index });
        }
        if self.capacity % lump_bits != 0 && !self.padded {
            return Err(DescriptorError::LumpRepeatNotIntegral {
                lump: index,
                lump_bits,
                capacity: self.capacity,
            });
        }

        let lump_repeat = self.capacity / lump_bits;
        let units_per_repeat: u64 = layouts.iter().map(|layout| layout.rate_factor).sum();

        for lr in 0..lump_repeat {
            let mut units_so_far = 0;

            for layout in &layouts {
                let mut call_order = match lump.shift {
                    Shift::Right => (lump_repeat - lr) * units_per_repeat,
                    Shift::Left => lr * units_per_repeat,
                } + units_so_far;
                if layout.shift == Shift::Right {
                    call_order += layout.rate_factor;
                }

                let mut stream_units = VecDeque::with_capacity(layout.rate_factor as usize + 1);
                for _ in 0..layout.rate_factor {
                    stream_units.push_back(SampleUnit {
                        bits: layout.decoder.bit_width() as u64,
                        kind: UnitKind::Sample {
                            stream: layout.stream,
                            decoder: layout.decoder,
                            call_order,
                        },
                    });

                    match layout.shift {
                        Shift::Right => call_order -= 1,
                        Shift::Left => call_order += 1,
                    }
                }

                if layout.padding_bits > 0 {
                    let padding = SampleUnit::padding(layout.padding_bits);
                    match layout.alignment {
                        Alignment::Right => stream_units.push_front(padding),
                        _ => stream_units.push_back(padding),
                    }
                }

                self.units.extend(stream_units);
                self.consumed += layout.packed_bits;
                units_so_far += layout.rate_factor;
            }
        }

        Ok(())
    }

    fn layout(&mut self, stream: &Stream) -> Result<StreamLayout, DescriptorError> {
        if stream.rate_factor == 0 {
            return Err(DescriptorError::ZeroRateFactor {
                stream: stream.id.clone(),
            });
        }

        let decoder = SampleDecoder::for_stream(stream)?;
        let rate_factor = stream.rate_factor as u64;
        let packed_bits = stream.packed_bits as u64;
        let used = rate_factor * decoder.bit_width() as u64;

        let padding_bits =
            packed_bits
                .checked_sub(used)
                .ok_or_else(|| DescriptorError::StreamUnderpacked {
                    stream: stream.id.clone(),
                    packed: packed_bits,
                    used,
                })?;
        if padding_bits > 0 && stream.alignment == Alignment::Undefined {
            return Err(DescriptorError::UndefinedAlignment {
                stream: stream.id.clone(),
                bits: padding_bits,
            });
        }

        Ok(StreamLayout {
            stream: self.stream_index(stream)?,
            decoder,
            rate_factor,
            packed_bits,
            padding_bits,
            alignment: stream.alignment,
            shift: stream.shift,
        })
    }

    /// Index of the stream's metadata, created on first encounter.
    fn stream_index(&mut self, stream: &Stream) -> Result<usize, DescriptorError> {
        if let Some(index) = self.streams.iter().position(|info| info.id == stream.id) {
            return Ok(index);
        }

        let band_id = stream
            .bands
            .first()
            .ok_or_else(|| DescriptorError::MissingBand(stream.id.clone()))?;
        let band = self
            .metadata
            .band(band_id)
            .ok_or_else(|| DescriptorError::UnknownBand(band_id.clone()))?;

        self.streams
            .push(Arc::new(StreamInfo::new(stream, self.system, band)));
        Ok(self.streams.len() - 1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::structs::descriptor::Band;
    use crate::structs::format::{SampleEncoding, SampleFormat};

    pub(crate) fn metadata() -> Metadata {
        Metadata {
            systems: vec![System {
                id: "sys".into(),
                base_frequency: 4e6,
            }],
            bands: vec![Band {
                id: "L1".into(),
                center_frequency: 1_575.42e6,
                translated_frequency: 4.092e6,
                delay_bias: 0.0,
            }],
            ..Default::default()
        }
    }

    pub(crate) fn stream(
        id: &str,
        rate_factor: u32,
        packed_bits: u32,
        quantization: u32,
    ) -> Stream {
        Stream {
            id: id.into(),
            rate_factor,
            packed_bits,
            quantization,
            format: SampleFormat::IF,
            encoding: SampleEncoding::Tc,
            bands: vec!["L1".into()],
            ..Default::default()
        }
    }

    pub(crate) fn chunk(size_word: u64, count_words: u64, streams: Vec<Stream>) -> Chunk {
        Chunk {
            size_word,
            count_words,
            lumps: vec![Lump {
                shift: Shift::Left,
                streams,
            }],
            ..Default::default()
        }
    }

    fn build(chunk: &Chunk) -> Result<ChunkPlan, DescriptorError> {
        let md = metadata();
        ChunkPlan::build(chunk, &md, &md.systems[0])
    }

    fn call_orders(plan: &ChunkPlan) -> Vec<Option<u64>> {
        plan.units().iter().map(SampleUnit::call_order).collect()
    }

    fn total_bits(plan: &ChunkPlan) -> u64 {
        plan.units().iter().map(|unit| unit.bits).sum()
    }

    #[test]
    fn two_left_streams_in_declaration_order() -> Result<(), DescriptorError> {
        let plan = build(&chunk(4, 1, vec![stream("a", 1, 16, 16), stream("b", 1, 16, 16)]))?;

        assert_eq!(call_orders(&plan), vec![Some(0), Some(1)]);
        assert_eq!(
            plan.units().iter().map(|u| u.stream()).collect::<Vec<_>>(),
            vec![Some(0), Some(1)]
        );
        assert_eq!(plan.padding_bits(), 0);
        assert_eq!(total_bits(&plan), 32);
        Ok(())
    }

    #[test]
    fn right_shifted_stream_counts_down_from_window_top() -> Result<(), DescriptorError> {
        let b = Stream {
            shift: Shift::Right,
            ..stream("b", 1, 16, 16)
        };
        let plan = build(&chunk(4, 1, vec![stream("a", 1, 16, 16), b]))?;

        // lump_repeat = 1, units_per_repeat = 2: stream b starts at
        // 0 * 2 + 1 (units so far) + 1 (rate factor) = 2
        assert_eq!(call_orders(&plan), vec![Some(0), Some(2)]);
        assert_eq!(plan.dispatch_order(), vec![0, 1]);
        Ok(())
    }

    #[test]
    fn right_aligned_padding_precedes_samples() -> Result<(), DescriptorError> {
        let s = Stream {
            alignment: Alignment::Right,
            ..stream("a", 2, 20, 8)
        };
        let plan = build(&chunk(1, 5, vec![s]))?;

        let shape: Vec<(bool, u64)> = plan
            .units()
            .iter()
            .map(|u| (u.is_padding(), u.bits))
            .collect();
        assert_eq!(
            shape,
            vec![(true, 4), (false, 8), (false, 8), (true, 4), (false, 8), (false, 8)]
        );
        assert_eq!(
            call_orders(&plan),
            vec![None, Some(0), Some(1), None, Some(2), Some(3)]
        );
        assert_eq!(total_bits(&plan), 40);
        Ok(())
    }

    #[test]
    fn left_aligned_padding_follows_samples() -> Result<(), DescriptorError> {
        let s = Stream {
            alignment: Alignment::Left,
            ..stream("a", 2, 20, 8)
        };
        let plan = build(&chunk(1, 5, vec![s]))?;
        assert!(plan.units()[2].is_padding());
        assert_eq!(plan.units()[2].bits, 4);
        Ok(())
    }

    #[test]
    fn tail_padding_fills_the_chunk() -> Result<(), DescriptorError> {
        let mut c = chunk(2, 1, vec![stream("a", 1, 6, 6), stream("b", 1, 4, 4)]);
        c.padding = ChunkPadding::Tail;
        let plan = build(&c)?;

        assert_eq!(plan.units().len(), 3);
        assert_eq!(plan.units()[2], SampleUnit::padding(6));
        assert_eq!(total_bits(&plan), 16);

        c.padding = ChunkPadding::Head;
        let plan = build(&c)?;
        assert_eq!(plan.units()[0], SampleUnit::padding(6));
        Ok(())
    }

    #[test]
    fn non_integral_lump_without_padding_fails() {
        let c = chunk(2, 1, vec![stream("a", 1, 6, 6), stream("b", 1, 4, 4)]);
        assert_eq!(
            build(&c),
            Err(DescriptorError::LumpRepeatNotIntegral {
                lump: 0,
                lump_bits: 10,
                capacity: 16
            })
        );
    }

    #[test]
    fn right_shifted_lump_reverses_repetitions() -> Result<(), DescriptorError> {
        let mut c = chunk(1, 1, vec![stream("a", 1, 2, 2)]);
        c.lumps[0].shift = Shift::Right;
        let plan = build(&c)?;

        assert_eq!(call_orders(&plan), vec![Some(4), Some(3), Some(2), Some(1)]);
        assert_eq!(plan.dispatch_order(), vec![3, 2, 1, 0]);
        Ok(())
    }

    #[test]
    fn interleaved_streams_alternate() -> Result<(), DescriptorError> {
        // 8 repetitions of [a, b] in a 32-bit word
        let plan = build(&chunk(4, 1, vec![stream("a", 1, 2, 2), stream("b", 1, 2, 2)]))?;

        let expected: Vec<Option<u64>> = (0..16).map(Some).collect();
        assert_eq!(call_orders(&plan), expected);
        let streams: Vec<Option<usize>> = plan.units().iter().map(SampleUnit::stream).collect();
        assert!(streams.chunks(2).all(|pair| pair == [Some(0), Some(1)]));
        assert_eq!(plan.streams().len(), 2);
        Ok(())
    }

    #[test]
    fn equal_call_orders_keep_physical_order() -> Result<(), DescriptorError> {
        let b = Stream {
            shift: Shift::Right,
            ..stream("b", 2, 4, 2)
        };
        let plan = build(&chunk(2, 2, vec![stream("a", 2, 4, 2), b]))?;

        // repetition 0 yields a: 0, 1 and b: 4, 3; repetition 1 starts a at 4
        assert_eq!(
            call_orders(&plan)[..6],
            [Some(0u64), Some(1), Some(4), Some(3), Some(4), Some(5)]
        );
        assert_eq!(plan.dispatch_order()[..8], [0usize, 1, 3, 2, 4, 5, 7, 6]);
        assert_eq!(plan.sample_count(), 16);
        Ok(())
    }

    #[test]
    fn complex_units_span_both_components() -> Result<(), DescriptorError> {
        let s = Stream {
            format: SampleFormat::IQ,
            ..stream("iq", 2, 16, 4)
        };
        let plan = build(&chunk(2, 1, vec![s]))?;

        assert!(plan.units().iter().all(|unit| unit.bits == 8));
        assert!(plan.streams()[0].is_complex);
        assert_eq!(plan.streams()[0].sample_frequency, 8e6);
        Ok(())
    }

    #[test]
    fn descriptor_errors() {
        assert_eq!(
            build(&chunk(3, 1, vec![stream("a", 1, 8, 8)])),
            Err(DescriptorError::UnsupportedWordSize(3))
        );
        assert_eq!(
            build(&chunk(1, 0, vec![stream("a", 1, 8, 8)])),
            Err(DescriptorError::EmptyChunk)
        );
        assert_eq!(
            build(&chunk(8, u64::MAX / 32, vec![stream("a", 1, 8, 8)])),
            Err(DescriptorError::ChunkTooLarge {
                size_word: 8,
                count_words: u64::MAX / 32
            })
        );
        assert_eq!(
            build(&chunk(8, u64::MAX, vec![stream("a", 1, 8, 8)])),
            Err(DescriptorError::ChunkTooLarge {
                size_word: 8,
                count_words: u64::MAX
            })
        );
        assert_eq!(
            build(&chunk(1, 1, vec![stream("a", 2, 8, 8)])),
            Err(DescriptorError::StreamUnderpacked {
                stream: "a".into(),
                packed: 8,
                used: 16
            })
        );
        assert_eq!(
            build(&chunk(1, 1, vec![stream("a", 1, 8, 4)])),
            Err(DescriptorError::UndefinedAlignment {
                stream: "a".into(),
                bits: 4
            })
        );
        assert_eq!(
            build(&chunk(1, 1, vec![stream("a", 0, 8, 8)])),
            Err(DescriptorError::ZeroRateFactor { stream: "a".into() })
        );

        let mut unknown = stream("a", 1, 8, 8);
        unknown.bands = vec!["L5".into()];
        assert_eq!(
            build(&chunk(1, 1, vec![unknown])),
            Err(DescriptorError::UnknownBand("L5".into()))
        );

        let mut two_lumps = chunk(1, 1, vec![stream("a", 1, 8, 8)]);
        two_lumps.lumps.push(two_lumps.lumps[0].clone());
        assert_eq!(
            build(&two_lumps),
            Err(DescriptorError::ChunkOverflow {
                used: 16,
                capacity: 8
            })
        );
    }
}
