use std::collections::BTreeMap;

use anyhow::Result;
use gnsspack::process::convert::Converter;
use gnsspack::sink::{SinkRegistry, StatisticsCollector, StatisticsSink};
use indicatif::MultiProgress;

use super::command::StatsArgs;
use super::progress::run_lanes;
use crate::descriptor::{load_descriptor, path_prefix};

pub fn cmd_stats(args: &StatsArgs, multi: Option<&MultiProgress>) -> Result<()> {
    let report = collect_statistics(args, multi)?;
    print!("{}", serde_yaml_ng::to_string(&report)?);
    Ok(())
}

fn collect_statistics(
    args: &StatsArgs,
    multi: Option<&MultiProgress>,
) -> Result<BTreeMap<String, StatisticsSink>> {
    let recording = &args.recording;
    let metadata = load_descriptor(&recording.descriptor)?;
    let prefix = path_prefix(&recording.descriptor, recording.path_prefix.as_deref());

    let collector = StatisticsCollector::default();
    let mut converter = Converter::new(SinkRegistry::new(collector.clone()));
    converter.open(&metadata, &prefix)?;
    run_lanes(&mut converter, &metadata, &prefix, recording.parallel, multi)?;
    converter.close();

    let mut report = collector.report();
    if args.no_histogram {
        for stats in report.values_mut() {
            stats.in_phase.histogram.clear();
            if let Some(q) = &mut stats.quadrature {
                q.histogram.clear();
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cli::command::RecordingArgs;
    use crate::descriptor::EXAMPLE_DESCRIPTOR;

    #[test]
    fn parallel_statistics() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let descriptor = dir.path().join("session.yaml");
        fs::write(&descriptor, EXAMPLE_DESCRIPTOR)?;
        fs::write(dir.path().join("l1.bin"), [0b00_01_00_01u8; 4])?;

        let args = StatsArgs {
            recording: RecordingArgs {
                descriptor,
                path_prefix: None,
                parallel: true,
            },
            no_histogram: false,
        };
        let report = collect_statistics(&args, None)?;

        let stats = &report["L1-IQ"];
        assert_eq!(stats.in_phase.count, 8);
        assert_eq!(stats.in_phase.mean, 1.0);
        let q = stats.quadrature.as_ref().unwrap();
        assert_eq!(q.mean, 3.0);
        assert_eq!(q.histogram.get(&3), Some(&8));
        Ok(())
    }
}
