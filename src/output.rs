use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use gnsspack::sink::{Sink, SinkFactory, SinkHandle};
use gnsspack::structs::stream_info::StreamInfo;
use gnsspack::utils::sample::Sample;
use serde::Serialize;

use crate::byteorder::WriteBytesLe;
use crate::cli::command::{OutputFormat, SampleType};
use crate::wav::{W64Format, W64Writer};

pub fn create_path_with_suffix(base_path: &Path, suffix: &str) -> PathBuf {
    let mut path = base_path.to_path_buf();
    let base_name = base_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.set_file_name(format!("{base_name}.{suffix}"));
    path
}

/// Stream identities may contain characters that are not valid in file names.
fn file_stem(stream: &str) -> String {
    stream
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Creates one [`StreamWriter`] per stream below a common base path.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub base_path: PathBuf,
    pub format: OutputFormat,
    pub sample_type: SampleType,
}

impl OutputConfig {
    pub fn sample_path(&self, stream: &str) -> PathBuf {
        let ext = match self.format {
            OutputFormat::Raw => "raw",
            OutputFormat::W64 => "w64",
        };
        create_path_with_suffix(&self.base_path, &format!("{}.{ext}", file_stem(stream)))
    }

    pub fn sidecar_path(&self, stream: &str) -> PathBuf {
        create_path_with_suffix(&self.base_path, &format!("{}.yaml", file_stem(stream)))
    }
}

impl SinkFactory for OutputConfig {
    fn create(&self, stream: &str) -> Result<SinkHandle> {
        Ok(Arc::new(Mutex::new(StreamWriter::new(self.clone(), stream))))
    }
}

enum Writer {
    Raw(BufWriter<File>),
    W64(W64Writer<File>),
}

impl Writer {
    fn write<T: WriteBytesLe>(&mut self, values: &[T]) -> io::Result<()> {
        match self {
            Writer::Raw(writer) => {
                let mut bytes = Vec::new();
                values.iter().for_each(|value| value.write_le(&mut bytes));
                writer.write_all(&bytes)
            }
            Writer::W64(writer) => writer.write_samples(values),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        match self {
            Writer::Raw(writer) => writer.flush(),
            Writer::W64(writer) => writer.finish(),
        }
    }
}

/// Integer targets round to nearest and saturate.
fn convert<T>(values: &[f64], f: impl Fn(f64) -> T) -> Vec<T> {
    values.iter().map(|&v| f(v)).collect()
}

#[derive(Serialize)]
struct Sidecar<'a> {
    file: String,
    container: &'static str,
    sample_type: &'static str,
    samples: u64,
    stream: &'a StreamInfo,
}

/// Writes one stream's samples to disk.
///
/// The file is created on the first sample, when the stream's metadata is
/// known; a YAML sidecar describing it is written on finish.
pub struct StreamWriter {
    config: OutputConfig,
    stream: String,
    writer: Option<Writer>,
    info: Option<StreamInfo>,
    samples: u64,
}

impl StreamWriter {
    pub fn new(config: OutputConfig, stream: &str) -> Self {
        Self {
            config,
            stream: stream.to_string(),
            writer: None,
            info: None,
            samples: 0,
        }
    }

    fn open(&self, info: &StreamInfo) -> Result<Writer> {
        let path = self.config.sample_path(&self.stream);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        log::info!("Stream {}: writing {}", self.stream, path.display());

        Ok(match self.config.format {
            OutputFormat::Raw => Writer::Raw(BufWriter::new(file)),
            OutputFormat::W64 => {
                let format = W64Format {
                    sample_rate: info.sample_frequency.round() as u32,
                    channels: if info.is_complex { 2 } else { 1 },
                    bits_per_sample: self.config.sample_type.bits() as u16,
                    float: self.config.sample_type.is_float(),
                };
                Writer::W64(W64Writer::new(file, format)?)
            }
        })
    }

    fn write_sidecar(&self, info: &StreamInfo) -> Result<()> {
        let sample_path = self.config.sample_path(&self.stream);
        let sidecar = Sidecar {
            file: sample_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            container: match self.config.format {
                OutputFormat::Raw => "raw",
                OutputFormat::W64 => "w64",
            },
            sample_type: match self.config.sample_type {
                SampleType::I8 => "i8",
                SampleType::I16 => "i16",
                SampleType::I32 => "i32",
                SampleType::F32 => "f32",
            },
            samples: self.samples,
            stream: info,
        };

        let path = self.config.sidecar_path(&self.stream);
        fs::write(&path, serde_yaml_ng::to_string(&sidecar)?)
            .with_context(|| format!("Could not write {}", path.display()))
    }
}

impl Sink for StreamWriter {
    fn consume(&mut self, sample: Sample, info: &StreamInfo) -> Result<()> {
        if self.writer.is_none() {
            self.writer = Some(self.open(info)?);
            self.info = Some(info.clone());
        }

        let components = match sample {
            Sample::Real(v) => [v, 0.0],
            Sample::Complex { i, q } => [i, q],
        };
        let values = &components[..if info.is_complex { 2 } else { 1 }];

        if let Some(writer) = self.writer.as_mut() {
            let written = match self.config.sample_type {
                SampleType::I8 => writer.write(&convert(values, |v| v.round() as i8)),
                SampleType::I16 => writer.write(&convert(values, |v| v.round() as i16)),
                SampleType::I32 => writer.write(&convert(values, |v| v.round() as i32)),
                SampleType::F32 => writer.write(&convert(values, |v| v as f32)),
            };
            written?;
        }

        self.samples += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(writer) = &mut self.writer else {
            log::warn!("Stream {}: no samples decoded, nothing written", self.stream);
            return Ok(());
        };
        writer.finish()?;

        if let Some(info) = &self.info {
            self.write_sidecar(info)?;
        }
        log::info!("Stream {}: {} samples", self.stream, self.samples);
        Ok(())
    }
}
