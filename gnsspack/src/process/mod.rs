//! Turning descriptors into executable pipelines.
//!
//! Planning is separate from execution: [`plan::ChunkPlan`],
//! [`block::BlockPlan`] and [`lane::LanePlan`] are built from the descriptor
//! alone, while the executors bind them to sinks and a byte source.

/// Flat extraction sequences for chunks.
///
/// Provides [`ChunkPlan`](plan::ChunkPlan), the ordered list of sample and
/// padding units covering one chunk together with the call order in which
/// decoded samples are emitted.
pub mod plan;

/// Reading and decoding chunks.
pub mod chunk;

/// Block cycles: header, chunks and footer.
pub mod block;

/// Per-lane block sequencing over one byte source.
pub mod lane;

/// The [`Converter`](convert::Converter) driving all lanes of a recording.
pub mod convert;
