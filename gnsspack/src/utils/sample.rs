//! Decoding of quantized sample values.

use std::io;

use bitstream_io::Endianness;

use crate::structs::descriptor::Stream;
use crate::structs::format::{SampleEncoding, SampleFormat};
use crate::utils::bitstream_io::ChunkBitReader;
use crate::utils::errors::DescriptorError;

/// One decoded sample, normalised to in-phase/quadrature order with any
/// stored negation undone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Real(f64),
    Complex { i: f64, q: f64 },
}

impl Sample {
    /// In-phase component (the value itself for real samples).
    pub fn i(&self) -> f64 {
        match *self {
            Sample::Real(v) => v,
            Sample::Complex { i, .. } => i,
        }
    }

    pub fn q(&self) -> Option<f64> {
        match *self {
            Sample::Real(_) => None,
            Sample::Complex { q, .. } => Some(q),
        }
    }
}

/// Turns the raw bits of one sample unit into a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDecoder {
    format: SampleFormat,
    encoding: SampleEncoding,
    quantization: u32,
}

impl SampleDecoder {
    pub fn new(
        format: SampleFormat,
        encoding: SampleEncoding,
        quantization: u32,
    ) -> Result<Self, SampleDecoderError> {
        let supported = match encoding {
            SampleEncoding::Fp => quantization == 32 || quantization == 64,
            _ => (1..=64).contains(&quantization),
        };
        if !supported {
            return Err(SampleDecoderError {
                bits: quantization,
                encoding,
            });
        }

        Ok(Self {
            format,
            encoding,
            quantization,
        })
    }

    pub fn for_stream(stream: &Stream) -> Result<Self, DescriptorError> {
        Self::new(stream.format, stream.encoding, stream.quantization).map_err(|e| {
            DescriptorError::UnsupportedQuantization {
                stream: stream.id.clone(),
                bits: e.bits,
                encoding: e.encoding.to_string(),
            }
        })
    }

    /// Bits consumed per decoded sample.
    pub fn bit_width(&self) -> u32 {
        self.format.components() * self.quantization
    }

    pub fn read<E: Endianness>(&self, reader: &mut ChunkBitReader<E>) -> io::Result<Sample> {
        let (neg_i, neg_q) = self.format.negated();
        let first = self.component(reader.get_n(self.quantization)?);

        if !self.format.is_complex() {
            return Ok(Sample::Real(negate_if(first, neg_i)));
        }

        let second = self.component(reader.get_n(self.quantization)?);
        let (i, q) = if self.format.q_first() {
            (second, first)
        } else {
            (first, second)
        };

        Ok(Sample::Complex {
            i: negate_if(i, neg_i),
            q: negate_if(q, neg_q),
        })
    }

    /// Decodes one component from its `quantization` raw bits.
    pub fn component(&self, raw: u64) -> f64 {
        let bits = self.quantization;
        let msb = (raw >> (bits - 1)) & 1;
        let offset = 1i128 << (bits - 1);

        let value: i128 = match self.encoding {
            SampleEncoding::Fp => {
                return if bits == 32 {
                    f32::from_bits(raw as u32) as f64
                } else {
                    f64::from_bits(raw)
                };
            }
            SampleEncoding::Sign => return if msb == 0 { 1.0 } else { -1.0 },
            SampleEncoding::Ob | SampleEncoding::Oba => raw as i128 - offset,
            SampleEncoding::Og | SampleEncoding::Oga => gray_to_binary(raw) as i128 - offset,
            SampleEncoding::Tc | SampleEncoding::Tca => {
                let shift = 128 - bits;
                ((raw as i128) << shift) >> shift
            }
            SampleEncoding::Sm | SampleEncoding::Sma => {
                let magnitude = (raw & (offset as u64).wrapping_sub(1)) as i128;
                return adjusted_sign_magnitude(msb != 0, magnitude, self.encoding);
            }
            SampleEncoding::Msm | SampleEncoding::Msma => {
                let magnitude = (raw >> 1) as i128;
                return adjusted_sign_magnitude(raw & 1 != 0, magnitude, self.encoding);
            }
        };

        if self.encoding.is_adjusted() {
            (2 * value + 1) as f64
        } else {
            value as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDecoderError {
    pub bits: u32,
    pub encoding: SampleEncoding,
}

fn adjusted_sign_magnitude(negative: bool, magnitude: i128, encoding: SampleEncoding) -> f64 {
    let magnitude = if encoding.is_adjusted() {
        2 * magnitude + 1
    } else {
        magnitude
    };
    if negative {
        -(magnitude as f64)
    } else {
        magnitude as f64
    }
}

fn gray_to_binary(gray: u64) -> u64 {
    let mut binary = gray;
    let mut shift = 1;
    while shift < 64 {
        binary ^= binary >> shift;
        shift <<= 1;
    }
    binary
}

#[inline]
fn negate_if(value: f64, negate: bool) -> f64 {
    if negate { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BigEndian;

    fn decode(encoding: SampleEncoding, bits: u32, raw: u64) -> f64 {
        SampleDecoder::new(SampleFormat::IF, encoding, bits)
            .unwrap()
            .component(raw)
    }

    #[test]
    fn integer_encodings() {
        // two's complement
        assert_eq!(decode(SampleEncoding::Tc, 4, 0b0111), 7.0);
        assert_eq!(decode(SampleEncoding::Tc, 4, 0b1000), -8.0);
        assert_eq!(decode(SampleEncoding::Tc, 2, 0b11), -1.0);
        assert_eq!(decode(SampleEncoding::Tca, 2, 0b11), -1.0);
        assert_eq!(decode(SampleEncoding::Tca, 2, 0b10), -3.0);
        assert_eq!(decode(SampleEncoding::Tc, 64, u64::MAX), -1.0);

        // offset binary
        assert_eq!(decode(SampleEncoding::Ob, 3, 0b000), -4.0);
        assert_eq!(decode(SampleEncoding::Ob, 3, 0b111), 3.0);
        assert_eq!(decode(SampleEncoding::Oba, 2, 0b00), -3.0);
        assert_eq!(decode(SampleEncoding::Oba, 2, 0b11), 3.0);

        // sign-magnitude, sign in the msb
        assert_eq!(decode(SampleEncoding::Sm, 3, 0b101), -1.0);
        assert_eq!(decode(SampleEncoding::Sm, 3, 0b011), 3.0);
        assert_eq!(decode(SampleEncoding::Sma, 2, 0b10), -1.0);
        assert_eq!(decode(SampleEncoding::Sma, 2, 0b01), 3.0);

        // magnitude then sign
        assert_eq!(decode(SampleEncoding::Msm, 3, 0b101), -2.0);
        assert_eq!(decode(SampleEncoding::Msma, 2, 0b11), -3.0);

        // offset gray: 0b110 -> binary 0b100 -> 0
        assert_eq!(decode(SampleEncoding::Og, 3, 0b110), 0.0);
        assert_eq!(decode(SampleEncoding::Og, 3, 0b100), 3.0);
        assert_eq!(decode(SampleEncoding::Oga, 2, 0b10), 3.0);

        assert_eq!(decode(SampleEncoding::Sign, 1, 0), 1.0);
        assert_eq!(decode(SampleEncoding::Sign, 1, 1), -1.0);
    }

    #[test]
    fn floating_point() {
        assert_eq!(decode(SampleEncoding::Fp, 32, 1.5f32.to_bits() as u64), 1.5);
        assert_eq!(decode(SampleEncoding::Fp, 64, (-0.25f64).to_bits()), -0.25);
        assert!(SampleDecoder::new(SampleFormat::IF, SampleEncoding::Fp, 16).is_err());
        assert!(SampleDecoder::new(SampleFormat::IF, SampleEncoding::Tc, 0).is_err());
        assert!(SampleDecoder::new(SampleFormat::IF, SampleEncoding::Tc, 65).is_err());
    }

    #[test]
    fn complex_component_order() -> io::Result<()> {
        // two 4-bit TC components: 0x1 then 0xE (-2)
        let buf = [0x1E];

        let iq = SampleDecoder::new(SampleFormat::IQ, SampleEncoding::Tc, 4).unwrap();
        let mut reader = ChunkBitReader::<BigEndian>::from_slice(&buf);
        assert_eq!(iq.read(&mut reader)?, Sample::Complex { i: 1.0, q: -2.0 });

        let qni = SampleDecoder::new(SampleFormat::QnI, SampleEncoding::Tc, 4).unwrap();
        let mut reader = ChunkBitReader::<BigEndian>::from_slice(&buf);
        assert_eq!(qni.read(&mut reader)?, Sample::Complex { i: -2.0, q: -1.0 });

        let ifn = SampleDecoder::new(SampleFormat::IFn, SampleEncoding::Tc, 8).unwrap();
        assert_eq!(ifn.bit_width(), 8);
        let mut reader = ChunkBitReader::<BigEndian>::from_slice(&buf);
        assert_eq!(ifn.read(&mut reader)?, Sample::Real(-30.0));
        Ok(())
    }
}
