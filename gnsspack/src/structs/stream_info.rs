#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::structs::descriptor::{Band, Stream, System};
use crate::structs::format::{SampleEncoding, SampleFormat};

/// Provenance of one decoded sample stream.
///
/// Built once per stream while its plan is constructed. Band and system
/// values are copied in, so the record does not follow later changes to the
/// descriptor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreamInfo {
    pub id: String,
    /// Hz
    pub base_frequency: f64,
    /// `rate_factor * base_frequency`, Hz
    pub sample_frequency: f64,
    pub quantization: u32,
    pub is_complex: bool,
    pub format: SampleFormat,
    pub encoding: SampleEncoding,
    /// Hz
    pub center_frequency: f64,
    /// Hz
    pub translated_frequency: f64,
    /// Seconds
    pub delay_bias: f64,
}

impl StreamInfo {
    pub fn new(stream: &Stream, system: &System, band: &Band) -> Self {
        Self {
            id: stream.id.clone(),
            base_frequency: system.base_frequency,
            sample_frequency: stream.rate_factor as f64 * system.base_frequency,
            quantization: stream.quantization,
            is_complex: stream.format.is_complex(),
            format: stream.format,
            encoding: stream.encoding,
            center_frequency: band.center_frequency,
            translated_frequency: band.translated_frequency,
            delay_bias: band.delay_bias,
        }
    }
}

#[test]
fn info_is_a_snapshot() {
    let system = System {
        id: "sys".into(),
        base_frequency: 4.092e6,
    };
    let mut band = Band {
        id: "L1".into(),
        center_frequency: 1_575.42e6,
        translated_frequency: 4.092e6,
        delay_bias: 1e-9,
    };
    let stream = Stream {
        id: "L1-IQ".into(),
        rate_factor: 2,
        format: SampleFormat::IQ,
        ..Default::default()
    };

    let info = StreamInfo::new(&stream, &system, &band);
    band.center_frequency = 0.0;

    assert_eq!(info.sample_frequency, 8.184e6);
    assert_eq!(info.center_frequency, 1_575.42e6);
    assert!(info.is_complex);
}
