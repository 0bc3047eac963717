//! Running statistics over decoded samples.

use std::collections::BTreeMap;

use anyhow::Result;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::sink::{Collector, Sink};
use crate::structs::format::SampleEncoding;
use crate::structs::stream_info::StreamInfo;
use crate::utils::sample::Sample;

/// Widest quantization for which a value histogram is kept.
const HISTOGRAM_MAX_BITS: u32 = 16;

/// Mean and variance are updated with Welford's method.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ComponentStatistics {
    pub count: u64,
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    m2: f64,
    pub min: f64,
    pub max: f64,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "BTreeMap::is_empty")
    )]
    pub histogram: BTreeMap<i64, u64>,
}

impl ComponentStatistics {
    fn push(&mut self, value: f64, histogram: bool) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.variance = self.m2 / self.count as f64;

        if histogram {
            *self.histogram.entry(value as i64).or_insert(0) += 1;
        }
    }
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StatisticsSink {
    pub in_phase: ComponentStatistics,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub quadrature: Option<ComponentStatistics>,
}

impl Sink for StatisticsSink {
    fn consume(&mut self, sample: Sample, info: &StreamInfo) -> Result<()> {
        let histogram =
            info.encoding != SampleEncoding::Fp && info.quantization <= HISTOGRAM_MAX_BITS;

        self.in_phase.push(sample.i(), histogram);
        if let Some(q) = sample.q() {
            self.quadrature
                .get_or_insert_with(ComponentStatistics::default)
                .push(q, histogram);
        }
        Ok(())
    }
}

pub type StatisticsCollector = Collector<StatisticsSink>;

impl StatisticsCollector {
    /// Snapshot of every stream's statistics, ordered by stream identity.
    pub fn report(&self) -> BTreeMap<String, StatisticsSink> {
        self.streams()
            .into_iter()
            .filter_map(|stream| {
                let stats = self.with(&stream, StatisticsSink::clone)?;
                Some((stream, stats))
            })
            .collect()
    }
}
