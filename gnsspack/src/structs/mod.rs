//! Data structures describing recordings.
//!
//! Contains the read-only format descriptor tree, the enumerated attributes
//! used on its nodes, and the per-stream metadata derived from it.

pub mod descriptor;
pub mod format;
pub mod stream_info;
