//! # gnsspack
//!
//! De-multiplexer for bit-packed GNSS receiver recordings.
//!
//! ## Technical Overview
//!
//! A recording is described by a format descriptor ([`structs::descriptor::Metadata`]).
//!
//! ### Data Organization
//!
//! **Files** hold the raw bytes of one **lane** each. A lane is a sequence
//! of **blocks**; every block cycle skips a header, reads its **chunks** and
//! skips a footer. A chunk is a run of fixed-width words whose bits are
//! filled by repeating **lumps**, and every lump interleaves one or more
//! **streams** of quantized samples.
//!
//! ### Sample Encodings
//!
//! - Real (`IF`) and complex (`IQ`, `QI` and negated variants) layouts
//! - Sign, offset binary, sign-magnitude, two's complement and offset gray
//!   integers, each with an adjusted variant
//! - IEEE 754 single and double precision
//!
//! ## Quick Start
//!
//! 1. Describe the recording with a [`structs::descriptor::Metadata`]
//! 2. Choose where samples go with a [`sink::SinkRegistry`]
//! 3. Open and run a [`process::convert::Converter`]
//!
//! ```rust,no_run
//! use gnsspack::process::convert::Converter;
//! use gnsspack::sink::{SinkRegistry, StatisticsCollector};
//! use gnsspack::structs::descriptor::Metadata;
//!
//! let metadata = Metadata::default(); // usually loaded from a descriptor file
//! let stats = StatisticsCollector::default();
//!
//! let mut converter = Converter::new(SinkRegistry::new(stats.clone()));
//! converter.open(&metadata, "/data/recordings")?;
//!
//! for summary in converter.run()? {
//!     println!("{}: {} samples", summary.lane, summary.samples);
//! }
//!
//! for (stream, report) in stats.report() {
//!     println!("{stream}: mean {}", report.in_phase.mean);
//! }
//! converter.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Building and executing plans.
///
/// 1. **Planning** ([`process::plan`]): Flattens a chunk into ordered
///    sample and padding units.
///
/// 2. **Execution** ([`process::chunk`], [`process::block`],
///    [`process::lane`]): Reads chunks, block cycles and lanes from a byte
///    source.
///
/// 3. **Conversion** ([`process::convert`]): Opens and drives every lane of
///    a recording.
pub mod process;

/// Destinations for decoded samples.
///
/// - **Registry** ([`sink::SinkRegistry`]): One sink per stream identity
/// - **Statistics** ([`sink::statistics`]): Running moments and histograms
/// - **Memory** ([`sink::memory`]): Sample capture
pub mod sink;

/// Data structures describing recordings.
///
/// - **Descriptor** ([`structs::descriptor`]): Systems, bands, files, lanes
/// - **Formats** ([`structs::format`]): Byte order, shift, padding, encodings
/// - **Stream Info** ([`structs::stream_info`]): Per-stream provenance
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Words** ([`utils::word`]): Byte-order normalisation
/// - **Samples** ([`utils::sample`]): Component decoding
/// - **Sources** ([`utils::source`]): Byte sources and openers
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
