use std::io;
use std::path::PathBuf;

/// Structural problems in a format descriptor.
///
/// Raised while building plans; a descriptor that fails here will fail the
/// same way on every attempt.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Unsupported chunk word size: {0} bytes (expected 1, 2, 4 or 8)")]
    UnsupportedWordSize(u64),

    #[error("Chunk must contain at least one word")]
    EmptyChunk,

    #[error("Chunk of {count_words} x {size_word}-byte words is too large")]
    ChunkTooLarge { size_word: u64, count_words: u64 },

    #[error("Lump {lump} contains no streams")]
    EmptyLump { lump: usize },

    #[error("Lump {lump} occupies zero bits")]
    ZeroBitLump { lump: usize },

    #[error("Stream {stream} must have a rate factor of at least 1")]
    ZeroRateFactor { stream: String },

    #[error("Stream {stream}: unsupported quantization of {bits} bits for {encoding}")]
    UnsupportedQuantization {
        stream: String,
        bits: u32,
        encoding: String,
    },

    #[error("Stream {stream} packs {packed} bits but its samples need {used}")]
    StreamUnderpacked {
        stream: String,
        packed: u64,
        used: u64,
    },

    #[error("Stream {stream} has {bits} padding bits but no alignment to place them")]
    UndefinedAlignment { stream: String, bits: u64 },

    #[error(
        "Lump {lump} ({lump_bits} bits) does not evenly divide the {capacity}-bit chunk and the chunk declares no padding"
    )]
    LumpRepeatNotIntegral {
        lump: usize,
        lump_bits: u64,
        capacity: u64,
    },

    #[error("Lumps occupy {used} bits, exceeding the chunk capacity of {capacity} bits")]
    ChunkOverflow { used: u64, capacity: u64 },

    #[error("Chunk leaves {used} of {capacity} bits unused and declares no padding")]
    UnfilledChunk { used: u64, capacity: u64 },

    #[error("Block consumes no bytes per cycle")]
    EmptyBlock,

    #[error("No file references lane {0}")]
    MissingFile(String),

    #[error("Lane {0} references no system")]
    MissingSystem(String),

    #[error("Unknown system {0}")]
    UnknownSystem(String),

    #[error("Stream {0} references no band")]
    MissingBand(String),

    #[error("Unknown band {0}")]
    UnknownBand(String),
}

/// Failures of a byte source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("Could not open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Byte source is closed")]
    Closed,

    #[error("Truncated read at byte {position}: expected {expected} bytes, got {got}")]
    Truncated {
        position: u64,
        expected: u64,
        got: u64,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Converter is already open")]
    AlreadyOpen,

    #[error("Converter is not open")]
    NotOpen,

    #[error("Lane {lane}: {source}")]
    Descriptor {
        lane: String,
        source: DescriptorError,
    },

    #[error("Lane {lane}: {source}")]
    Source { lane: String, source: SourceError },

    #[error("Sink for stream {stream} failed: {cause:#}")]
    Sink {
        stream: String,
        cause: anyhow::Error,
    },

    #[error("Lane {0} worker panicked")]
    WorkerPanicked(String),
}

impl ConvertError {
    pub(crate) fn from_descriptor(lane: &str, source: DescriptorError) -> Self {
        Self::Descriptor {
            lane: lane.to_string(),
            source,
        }
    }

    pub(crate) fn from_source(lane: &str, source: SourceError) -> Self {
        Self::Source {
            lane: lane.to_string(),
            source,
        }
    }

    /// `true` for errors caused by the descriptor rather than the data.
    pub fn is_descriptor_error(&self) -> bool {
        matches!(self, Self::Descriptor { .. })
    }
}
