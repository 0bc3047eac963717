//! In-memory format descriptor tree.
//!
//! A [`Metadata`] describes one recording: the reference [`System`]s and RF
//! [`Band`]s, the [`File`]s holding the data and the [`Lane`]s that lay the
//! samples out as blocks, chunks, lumps and streams. Cross references are by
//! identifier and are resolved while plans are built; the tree itself is
//! never mutated by this crate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::structs::format::{
    Alignment, ChunkPadding, Endian, SampleEncoding, SampleFormat, Shift,
};

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Metadata {
    pub systems: Vec<System>,
    pub bands: Vec<Band>,
    pub files: Vec<File>,
    pub lanes: Vec<Lane>,
}

impl Metadata {
    pub fn system(&self, id: &str) -> Option<&System> {
        self.systems.iter().find(|system| system.id == id)
    }

    pub fn band(&self, id: &str) -> Option<&Band> {
        self.bands.iter().find(|band| band.id == id)
    }

    /// All files that reference the lane, in declaration order.
    pub fn files_for_lane<'a>(&'a self, lane_id: &'a str) -> impl Iterator<Item = &'a File> + 'a {
        self.files.iter().filter(move |file| file.lane == lane_id)
    }
}

/// Reference oscillator of a receiver.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct System {
    pub id: String,
    /// Base sample frequency in Hz.
    pub base_frequency: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Band {
    pub id: String,
    /// Hz
    pub center_frequency: f64,
    /// Hz
    pub translated_frequency: f64,
    /// Seconds
    pub delay_bias: f64,
}

/// A recording file holding the data of one lane.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct File {
    /// Location relative to the converter's path prefix.
    pub url: String,
    /// Identifier of the lane stored in this file.
    pub lane: String,
    /// Bytes to skip at the start of the file before the first block.
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Lane {
    pub id: String,
    /// Identifiers of the systems clocking this lane; the first one is used.
    pub systems: Vec<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Block {
    /// Number of cycles; 0 repeats the block until the input is exhausted.
    pub cycles: u64,
    /// Bytes skipped before each cycle's chunks.
    pub size_header: u64,
    /// Bytes skipped after each cycle's chunks.
    pub size_footer: u64,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Chunk {
    /// Bytes per word: 1, 2, 4 or 8.
    pub size_word: u64,
    pub count_words: u64,
    pub endian: Endian,
    pub padding: ChunkPadding,
    pub shift: Shift,
    pub lumps: Vec<Lump>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            size_word: 1,
            count_words: 1,
            endian: Endian::default(),
            padding: ChunkPadding::default(),
            shift: Shift::default(),
            lumps: Vec::new(),
        }
    }
}

impl Chunk {
    /// `None` when the size does not fit in 64 bits.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_word.checked_mul(self.count_words)
    }

    pub fn capacity_bits(&self) -> Option<u64> {
        self.size_bytes()?.checked_mul(8)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Lump {
    pub shift: Shift,
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Stream {
    pub id: String,
    /// Samples produced per lump repetition.
    pub rate_factor: u32,
    /// Bits occupied per lump repetition, padding included.
    pub packed_bits: u32,
    pub alignment: Alignment,
    pub shift: Shift,
    pub format: SampleFormat,
    pub encoding: SampleEncoding,
    /// Bits per component.
    pub quantization: u32,
    /// Identifiers of the bands carried by this stream; the first one is used.
    pub bands: Vec<String>,
}

impl Default for Stream {
    fn default() -> Self {
        Self {
            id: String::new(),
            rate_factor: 1,
            packed_bits: 8,
            alignment: Alignment::default(),
            shift: Shift::default(),
            format: SampleFormat::default(),
            encoding: SampleEncoding::default(),
            quantization: 8,
            bands: Vec::new(),
        }
    }
}

