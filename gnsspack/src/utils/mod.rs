//! Utility functions and supporting infrastructure.
//!
//! Provides chunk bit reading, word byte-order handling, sample decoding,
//! byte sources and error types.

pub mod bitstream_io;
pub mod errors;
pub mod sample;
pub mod source;
pub mod word;
