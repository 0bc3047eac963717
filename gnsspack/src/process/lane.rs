use log::{debug, info, warn};

use crate::process::block::{BlockPipeline, BlockPlan, CycleOutcome};
use crate::sink::SinkRegistry;
use crate::structs::descriptor::{File, Lane, Metadata, System};
use crate::utils::errors::{ConvertError, DescriptorError, SourceError};
use crate::utils::source::{ByteSource, Fill};

/// The resolved layout of one lane, independent of any input.
#[derive(Debug, Clone, PartialEq)]
pub struct LanePlan {
    pub id: String,
    pub file: File,
    pub system: System,
    pub blocks: Vec<BlockPlan>,
}

impl LanePlan {
    pub fn build(metadata: &Metadata, lane: &Lane) -> Result<Self, DescriptorError> {
        let files: Vec<&File> = metadata.files_for_lane(&lane.id).collect();
        let file = files
            .last()
            .copied()
            .ok_or_else(|| DescriptorError::MissingFile(lane.id.clone()))?
            .clone();
        if files.len() > 1 {
            warn!(
                "Lane {}: {} files reference this lane, the last one ({}) is used",
                lane.id,
                files.len(),
                file.url
            );
        }

        let system_id = lane
            .systems
            .first()
            .ok_or_else(|| DescriptorError::MissingSystem(lane.id.clone()))?;
        let system = metadata
            .system(system_id)
            .ok_or_else(|| DescriptorError::UnknownSystem(system_id.clone()))?
            .clone();

        let blocks = lane
            .blocks
            .iter()
            .map(|block| BlockPlan::build(block, metadata, &system))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Lane {}: {} block(s) from {} at offset {}",
            lane.id,
            blocks.len(),
            file.url,
            file.offset
        );

        Ok(Self {
            id: lane.id.clone(),
            file,
            system,
            blocks,
        })
    }
}

/// Totals of a lane's run so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneSummary {
    pub lane: String,
    pub cycles: u64,
    pub bytes: u64,
    pub samples: u64,
}

/// Result of advancing a lane by one block cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Cycle { bytes: u64, samples: u64 },
    EndOfInput,
}

/// Runs a lane's blocks over its byte source.
///
/// Blocks run in declaration order, each for its cycle count, and the
/// sequence starts over until the input ends. A block with an unlimited
/// cycle count keeps the lane on that block.
pub struct LanePipeline {
    id: String,
    blocks: Vec<BlockPipeline>,
    source: Box<dyn ByteSource>,
    block_index: usize,
    block_cycles: u64,
    summary: LaneSummary,
    finished: bool,
}

impl LanePipeline {
    /// Builds the executors and moves `source` past the file offset.
    pub fn new(
        plan: LanePlan,
        registry: &SinkRegistry,
        mut source: Box<dyn ByteSource>,
    ) -> Result<Self, ConvertError> {
        let offset = plan.file.offset;
        match source
            .skip(offset)
            .map_err(|e| ConvertError::from_source(&plan.id, e))?
        {
            Fill::Full => {}
            Fill::Empty => {
                return Err(ConvertError::from_source(
                    &plan.id,
                    SourceError::Truncated {
                        position: 0,
                        expected: offset,
                        got: 0,
                    },
                ));
            }
            Fill::Partial(got) => {
                return Err(ConvertError::from_source(
                    &plan.id,
                    SourceError::Truncated {
                        position: 0,
                        expected: offset,
                        got,
                    },
                ));
            }
        }

        let blocks = plan
            .blocks
            .into_iter()
            .map(|block| BlockPipeline::new(block, registry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            summary: LaneSummary {
                lane: plan.id.clone(),
                ..Default::default()
            },
            id: plan.id,
            blocks,
            source,
            block_index: 0,
            block_cycles: 0,
            finished: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn summary(&self) -> &LaneSummary {
        &self.summary
    }

    /// Bytes consumed from the source, file offset included.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Runs one block cycle.
    pub fn step(&mut self) -> Result<Step, ConvertError> {
        if self.finished {
            return Ok(Step::EndOfInput);
        }
        if self.blocks.is_empty() {
            warn!("Lane {}: no blocks to run", self.id);
            self.finished = true;
            return Ok(Step::EndOfInput);
        }

        if self.blocks[self.block_index]
            .cycles()
            .is_exhausted(self.block_cycles)
        {
            self.block_index = (self.block_index + 1) % self.blocks.len();
            self.block_cycles = 0;
        }

        let block = &mut self.blocks[self.block_index];
        match block.run_cycle(&self.id, self.source.as_mut())? {
            CycleOutcome::Completed { bytes, samples } => {
                self.block_cycles += 1;
                self.summary.cycles += 1;
                self.summary.bytes += bytes;
                self.summary.samples += samples;
                Ok(Step::Cycle { bytes, samples })
            }
            CycleOutcome::EndOfInput => {
                self.finished = true;
                info!(
                    "Lane {}: end of input after {} cycles, {} samples",
                    self.id, self.summary.cycles, self.summary.samples
                );
                Ok(Step::EndOfInput)
            }
        }
    }

    /// Steps until the input is exhausted.
    pub fn run(&mut self) -> Result<LaneSummary, ConvertError> {
        while let Step::Cycle { .. } = self.step()? {}
        Ok(self.summary.clone())
    }

    pub fn close(&mut self) {
        self.source.close();
        self.finished = true;
    }
}
