//! Enumerated attributes of the descriptor tree.

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Byte order of the words of a chunk as stored in the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endian {
    #[default]
    Big,
    Little,
}

/// Interleave direction.
///
/// On a chunk it selects how bits are consumed from the words: `Left` takes
/// the most significant bits first, `Right` the least significant bits
/// first. On lumps and streams it selects the direction in which call orders
/// are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Shift {
    #[default]
    Left,
    Right,
}

/// Where the unused bits of a chunk are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChunkPadding {
    #[default]
    None,
    Head,
    Tail,
}

/// Where the unused bits of a stream are placed relative to its samples.
///
/// `Right` aligned samples sit at the end of the stream's bit window, so the
/// padding comes first; `Left` aligned samples are followed by the padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Alignment {
    #[default]
    Undefined,
    Left,
    Right,
}

/// Sample layout of a stream.
///
/// `IF` is a real sample; the remaining formats are complex, naming their
/// components in storage order. A trailing `n` on a component means it is
/// stored negated.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleFormat {
    #[default]
    IF,
    IFn,
    IQ,
    IQn,
    InQ,
    InQn,
    QI,
    QIn,
    QnI,
    QnIn,
}

impl SampleFormat {
    pub fn is_complex(self) -> bool {
        !matches!(self, SampleFormat::IF | SampleFormat::IFn)
    }

    /// Number of quantized components per sample.
    pub fn components(self) -> u32 {
        if self.is_complex() { 2 } else { 1 }
    }

    /// `true` when the quadrature component is stored first.
    pub fn q_first(self) -> bool {
        matches!(
            self,
            SampleFormat::QI | SampleFormat::QIn | SampleFormat::QnI | SampleFormat::QnIn
        )
    }

    /// Negation of the (in-phase, quadrature) components.
    ///
    /// For real formats only the first entry is meaningful.
    pub fn negated(self) -> (bool, bool) {
        match self {
            SampleFormat::IF | SampleFormat::IQ | SampleFormat::QI => (false, false),
            SampleFormat::IFn => (true, false),
            SampleFormat::IQn | SampleFormat::QnI => (false, true),
            SampleFormat::InQ | SampleFormat::QIn => (true, false),
            SampleFormat::InQn | SampleFormat::QnIn => (true, true),
        }
    }
}

impl Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Numeric encoding of one quantized component.
///
/// The `…A` variants are the "adjusted" forms: the decoded integer `v` is
/// reported as `2v + 1`, giving a zero-free range symmetric about zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum SampleEncoding {
    /// Single sign bit: 0 is +1, 1 is -1.
    Sign,
    /// Offset binary.
    Ob,
    /// Sign (most significant bit) and magnitude.
    Sm,
    /// Magnitude followed by a sign in the least significant bit.
    Msm,
    /// Two's complement.
    #[default]
    Tc,
    /// Offset gray code.
    Og,
    Oba,
    Sma,
    Msma,
    Tca,
    Oga,
    /// IEEE 754 floating point.
    Fp,
}

impl SampleEncoding {
    pub fn is_adjusted(self) -> bool {
        matches!(
            self,
            SampleEncoding::Oba
                | SampleEncoding::Sma
                | SampleEncoding::Msma
                | SampleEncoding::Tca
                | SampleEncoding::Oga
        )
    }
}

impl Display for SampleEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleEncoding::Sign => "SIGN",
            SampleEncoding::Ob => "OB",
            SampleEncoding::Sm => "SM",
            SampleEncoding::Msm => "MSM",
            SampleEncoding::Tc => "TC",
            SampleEncoding::Og => "OG",
            SampleEncoding::Oba => "OBA",
            SampleEncoding::Sma => "SMA",
            SampleEncoding::Msma => "MSMA",
            SampleEncoding::Tca => "TCA",
            SampleEncoding::Oga => "OGA",
            SampleEncoding::Fp => "FP",
        };
        write!(f, "{name}")
    }
}
