use log::trace;

use crate::process::chunk::ChunkExecutor;
use crate::process::plan::ChunkPlan;
use crate::sink::SinkRegistry;
use crate::structs::descriptor::{Block, Metadata, System};
use crate::utils::errors::{ConvertError, DescriptorError, SourceError};
use crate::utils::source::{ByteSource, Fill};

/// How many times a block runs before the lane moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleLimit {
    UntilEnd,
    Count(u64),
}

impl CycleLimit {
    pub fn is_exhausted(self, done: u64) -> bool {
        match self {
            CycleLimit::UntilEnd => false,
            CycleLimit::Count(n) => done >= n,
        }
    }
}

impl From<u64> for CycleLimit {
    fn from(cycles: u64) -> Self {
        match cycles {
            0 => CycleLimit::UntilEnd,
            n => CycleLimit::Count(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlan {
    pub cycles: CycleLimit,
    pub size_header: u64,
    pub size_footer: u64,
    pub chunks: Vec<ChunkPlan>,
}

impl BlockPlan {
    pub fn build(
        block: &Block,
        metadata: &Metadata,
        system: &System,
    ) -> Result<Self, DescriptorError> {
        let chunks = block
            .chunks
            .iter()
            .map(|chunk| ChunkPlan::build(chunk, metadata, system))
            .collect::<Result<Vec<_>, _>>()?;

        let plan = Self {
            cycles: block.cycles.into(),
            size_header: block.size_header,
            size_footer: block.size_footer,
            chunks,
        };
        if plan.cycle_bytes() == 0 {
            return Err(DescriptorError::EmptyBlock);
        }

        Ok(plan)
    }

    /// Bytes consumed by one cycle, header and footer included.
    pub fn cycle_bytes(&self) -> u64 {
        self.chunks
            .iter()
            .map(|chunk| chunk.size_bytes() as u64)
            .fold(self.size_header.saturating_add(self.size_footer), u64::saturating_add)
    }
}

/// Result of running one block cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed { bytes: u64, samples: u64 },
    /// The input ended exactly where the cycle would have started.
    EndOfInput,
}

pub struct BlockPipeline {
    cycles: CycleLimit,
    size_header: u64,
    size_footer: u64,
    chunks: Vec<ChunkExecutor>,
}

impl BlockPipeline {
    pub fn new(plan: BlockPlan, registry: &SinkRegistry) -> Result<Self, ConvertError> {
        let chunks = plan
            .chunks
            .into_iter()
            .map(|chunk| ChunkExecutor::new(chunk, registry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cycles: plan.cycles,
            size_header: plan.size_header,
            size_footer: plan.size_footer,
            chunks,
        })
    }

    pub fn cycles(&self) -> CycleLimit {
        self.cycles
    }

    /// Skips the header, executes every chunk in order and skips the footer.
    pub fn run_cycle(
        &mut self,
        lane: &str,
        source: &mut dyn ByteSource,
    ) -> Result<CycleOutcome, ConvertError> {
        let start = source.position();

        if !skip_region(lane, source, self.size_header, start)? {
            return Ok(CycleOutcome::EndOfInput);
        }

        let mut samples = 0;
        for chunk in &mut self.chunks {
            match chunk.execute(lane, source)? {
                Some(n) => samples += n,
                None if source.position() == start => return Ok(CycleOutcome::EndOfInput),
                None => {
                    return Err(truncated(
                        lane,
                        source.position(),
                        chunk.plan().size_bytes() as u64,
                        0,
                    ));
                }
            }
        }

        if !skip_region(lane, source, self.size_footer, start)? {
            return Ok(CycleOutcome::EndOfInput);
        }

        let bytes = source.position() - start;
        trace!("Lane {lane}: cycle of {bytes} bytes, {samples} samples");
        Ok(CycleOutcome::Completed { bytes, samples })
    }
}

/// Skips `n` bytes; `false` means the input ended cleanly at `cycle_start`.
fn skip_region(
    lane: &str,
    source: &mut dyn ByteSource,
    n: u64,
    cycle_start: u64,
) -> Result<bool, ConvertError> {
    let fill = source
        .skip(n)
        .map_err(|e| ConvertError::from_source(lane, e))?;

    match fill {
        Fill::Full => Ok(true),
        Fill::Empty if source.position() == cycle_start => Ok(false),
        Fill::Empty => Err(truncated(lane, source.position(), n, 0)),
        Fill::Partial(got) => Err(truncated(lane, source.position() - got, n, got)),
    }
}

fn truncated(lane: &str, position: u64, expected: u64, got: u64) -> ConvertError {
    ConvertError::from_source(
        lane,
        SourceError::Truncated {
            position,
            expected,
            got,
        },
    )
}
