use anyhow::Result;

use crate::sink::{Collector, Sink};
use crate::structs::stream_info::StreamInfo;
use crate::utils::sample::Sample;

/// Keeps every sample of a stream in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub samples: Vec<Sample>,
    pub finished: bool,
}

impl Sink for MemorySink {
    fn consume(&mut self, sample: Sample, _info: &StreamInfo) -> Result<()> {
        self.samples.push(sample);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

pub type MemoryCollector = Collector<MemorySink>;

impl MemoryCollector {
    /// Copy of the samples collected for a stream so far.
    pub fn samples(&self, stream: &str) -> Vec<Sample> {
        self.with(stream, |sink| sink.samples.clone())
            .unwrap_or_default()
    }

    /// In-phase components (or real values) collected for a stream.
    pub fn values(&self, stream: &str) -> Vec<f64> {
        self.samples(stream).iter().map(Sample::i).collect()
    }
}
