use std::time::Instant;

use anyhow::Result;
use gnsspack::process::convert::Converter;
use gnsspack::sink::SinkRegistry;
use indicatif::MultiProgress;

use super::command::ConvertArgs;
use super::progress::run_lanes;
use crate::descriptor::{load_descriptor, path_prefix};
use crate::output::OutputConfig;

pub fn cmd_convert(args: &ConvertArgs, multi: Option<&MultiProgress>) -> Result<()> {
    let recording = &args.recording;
    log::info!("Converting recording: {}", recording.descriptor.display());

    let metadata = load_descriptor(&recording.descriptor)?;
    let prefix = path_prefix(&recording.descriptor, recording.path_prefix.as_deref());
    let base_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| recording.descriptor.with_extension(""));

    let output = OutputConfig {
        base_path,
        format: args.format,
        sample_type: args.sample_type,
    };
    let mut converter = Converter::new(SinkRegistry::new(output));
    converter.open(&metadata, &prefix)?;

    let start = Instant::now();
    let summaries = run_lanes(&mut converter, &metadata, &prefix, recording.parallel, multi)?;
    let elapsed = start.elapsed().as_secs_f64();

    for summary in &summaries {
        let rate = if elapsed > 0.0 {
            summary.bytes as f64 / 1_000_000.0 / elapsed
        } else {
            0.0
        };
        log::info!(
            "Lane {}: {} cycles, {} bytes, {} samples ({rate:.1} MB/s)",
            summary.lane,
            summary.cycles,
            summary.bytes,
            summary.samples
        );
    }

    converter.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cli::command::{OutputFormat, RecordingArgs, SampleType};
    use crate::descriptor::EXAMPLE_DESCRIPTOR;

    #[test]
    fn converts_a_recording_into_stream_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let descriptor = dir.path().join("session.yaml");
        fs::write(&descriptor, EXAMPLE_DESCRIPTOR)?;
        // SMA, 2 bits: 0b00 -> 1, 0b01 -> 3, 0b10 -> -1, 0b11 -> -3
        fs::write(dir.path().join("l1.bin"), [0b00_01_10_11u8, 0b11_10_01_00])?;

        let args = ConvertArgs {
            recording: RecordingArgs {
                descriptor: descriptor.clone(),
                path_prefix: None,
                parallel: false,
            },
            output_path: Some(dir.path().join("out").join("session")),
            format: OutputFormat::Raw,
            sample_type: SampleType::I16,
        };
        cmd_convert(&args, None)?;

        let bytes = fs::read(dir.path().join("out").join("session.L1-IQ.raw"))?;
        let values: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(values, vec![1, 3, -1, -3, -3, -1, 3, 1]);
        assert!(dir.path().join("out").join("session.L1-IQ.yaml").exists());
        Ok(())
    }
}
