use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use gnsspack::process::block::{BlockPlan, CycleLimit};
use gnsspack::process::lane::LanePlan;
use gnsspack::process::plan::{ChunkPlan, UnitKind};
use gnsspack::structs::stream_info::StreamInfo;

use super::command::InfoArgs;
use crate::descriptor::load_descriptor;

pub fn cmd_info(args: &InfoArgs) -> Result<()> {
    log::info!("Analyzing descriptor: {}", args.descriptor.display());

    let metadata = load_descriptor(&args.descriptor)?;
    let plans = metadata
        .lanes
        .iter()
        .map(|lane| {
            LanePlan::build(&metadata, lane).with_context(|| format!("Lane {}", lane.id))
        })
        .collect::<Result<Vec<_>>>()?;

    println!();
    println!("Recording Descriptor");
    println!("====================");
    println!();

    for plan in &plans {
        display_lane(plan, args.units);
    }

    println!("Stream Information");
    for info in collect_streams(&plans).values() {
        display_stream(info);
    }
    println!();

    Ok(())
}

/// Stream metadata across all lanes, first definition wins.
fn collect_streams(plans: &[LanePlan]) -> BTreeMap<String, Arc<StreamInfo>> {
    let mut streams = BTreeMap::new();
    for chunk in plans
        .iter()
        .flat_map(|lane| &lane.blocks)
        .flat_map(|block| &block.chunks)
    {
        for info in chunk.streams() {
            streams
                .entry(info.id.clone())
                .or_insert_with(|| info.clone());
        }
    }
    streams
}

fn mhz(hz: f64) -> String {
    format!("{:.6} MHz", hz / 1e6)
}

fn display_lane(plan: &LanePlan, units: bool) {
    println!("Lane {}", plan.id);
    println!("  File                      {}", plan.file.url);
    println!("  Offset                    {} bytes", plan.file.offset);
    println!(
        "  System                    {} ({})",
        plan.system.id,
        mhz(plan.system.base_frequency)
    );

    for (index, block) in plan.blocks.iter().enumerate() {
        display_block(index, block, units);
    }
    println!();
}

fn display_block(index: usize, block: &BlockPlan, units: bool) {
    println!("  Block {index}");
    match block.cycles {
        CycleLimit::UntilEnd => println!("    Cycles                  until end of input"),
        CycleLimit::Count(n) => println!("    Cycles                  {n}"),
    }
    println!(
        "    Header / footer         {} / {} bytes",
        block.size_header, block.size_footer
    );
    println!("    Bytes per cycle         {}", block.cycle_bytes());

    for (index, chunk) in block.chunks.iter().enumerate() {
        display_chunk(index, chunk, units);
    }
}

fn display_chunk(index: usize, chunk: &ChunkPlan, units: bool) {
    println!("    Chunk {index}");
    println!(
        "      Words                 {} x {} bytes, {:?} endian, shift {:?}",
        chunk.size_bytes() / chunk.word_size().bytes(),
        chunk.word_size().bytes(),
        chunk.endian(),
        chunk.shift()
    );
    println!(
        "      Units                 {} samples, {} padding bits of {}",
        chunk.sample_count(),
        chunk.padding_bits(),
        chunk.capacity_bits()
    );

    if !units {
        return;
    }

    let streams = chunk.streams();
    for (position, unit) in chunk.units().iter().enumerate() {
        match unit.kind {
            UnitKind::Padding => {
                println!("      {position:>5}  {:>3} bits  padding", unit.bits)
            }
            UnitKind::Sample {
                stream, call_order, ..
            } => println!(
                "      {position:>5}  {:>3} bits  {:<16} call {call_order}",
                unit.bits, streams[stream].id
            ),
        }
    }
}

fn display_stream(info: &StreamInfo) {
    println!("  Stream {}", info.id);
    println!("    Sample rate             {}", mhz(info.sample_frequency));
    println!(
        "    Quantization            {} bits, {} {}",
        info.quantization, info.format, info.encoding
    );
    println!("    Complex                 {}", info.is_complex);
    println!("    Center frequency        {}", mhz(info.center_frequency));
    println!("    Translated frequency    {}", mhz(info.translated_frequency));
    println!("    Delay bias              {} s", info.delay_bias);
}
