use std::fs;
use std::path::Path;

use anyhow::Result;
use gnsspack::process::convert::Converter;
use gnsspack::process::lane::{LanePipeline, LaneSummary};
use gnsspack::structs::descriptor::Metadata;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Size of the file behind a lane, when it can be determined.
fn lane_file_len(metadata: &Metadata, prefix: &Path, lane: &str) -> Option<u64> {
    let file = metadata.files_for_lane(lane).last()?;
    fs::metadata(prefix.join(&file.url)).ok().map(|m| m.len())
}

pub fn create_progress_bar(
    multi: &MultiProgress,
    lane: &str,
    total_bytes: Option<u64>,
) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_bytes {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{prefix:>12} {bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%) | {msg} | ETA: {eta_precise}",
        )?);
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{prefix:>12} {spinner:.green} {bytes} | {msg} | elapsed: {elapsed_precise}",
        )?);
        pb
    };

    pb.set_prefix(lane.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn show(pb: &ProgressBar, lane: &LanePipeline) {
    let message = format!("{} samples", lane.summary().samples);
    pb.set_position(lane.position());
    if lane.is_finished() {
        pb.finish_with_message(message);
    } else {
        pb.set_message(message);
    }
}

/// Runs every lane of an open converter and finishes its sinks, showing a
/// progress bar per lane when `multi` is given.
pub fn run_lanes(
    converter: &mut Converter,
    metadata: &Metadata,
    prefix: &Path,
    parallel: bool,
    multi: Option<&MultiProgress>,
) -> Result<Vec<LaneSummary>> {
    let bars = match multi {
        Some(multi) => converter
            .lanes()
            .iter()
            .map(|lane| {
                create_progress_bar(multi, lane.id(), lane_file_len(metadata, prefix, lane.id()))
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let summaries = converter.run_with(parallel, |index, lane| {
        if let Some(pb) = bars.get(index) {
            show(pb, lane);
        }
    })?;
    Ok(summaries)
}
