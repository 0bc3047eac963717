use std::path::Path;
use std::thread;

use log::{debug, info};

use crate::process::lane::{LanePipeline, LanePlan, LaneSummary, Step};
use crate::sink::SinkRegistry;
use crate::structs::descriptor::Metadata;
use crate::utils::errors::{ConvertError, SourceError};
use crate::utils::source::{FileOpener, SourceOpener};

/// Owns the lane pipelines of one recording and drives them.
///
/// A converter is opened once per descriptor; a second `open` is rejected
/// and leaves the running state untouched. After `close` it may be opened
/// again.
pub struct Converter {
    registry: SinkRegistry,
    opener: Box<dyn SourceOpener>,
    lanes: Vec<LanePipeline>,
    is_open: bool,
}

impl Converter {
    /// A converter reading recordings from the local file system.
    pub fn new(registry: SinkRegistry) -> Self {
        Self::with_opener(registry, FileOpener)
    }

    pub fn with_opener(registry: SinkRegistry, opener: impl SourceOpener + 'static) -> Self {
        Self {
            registry,
            opener: Box::new(opener),
            lanes: Vec::new(),
            is_open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    pub fn lanes(&self) -> &[LanePipeline] {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut [LanePipeline] {
        &mut self.lanes
    }

    /// Builds a pipeline for every lane of `metadata`, reading each lane's
    /// file below `path_prefix`.
    ///
    /// Nothing is kept unless every lane builds.
    pub fn open(
        &mut self,
        metadata: &Metadata,
        path_prefix: impl AsRef<Path>,
    ) -> Result<(), ConvertError> {
        if self.is_open {
            return Err(ConvertError::AlreadyOpen);
        }

        let lanes = self
            .build_lanes(metadata, path_prefix.as_ref())
            .inspect_err(|_| self.registry.clear())?;

        info!(
            "Opened {} lane(s), {} stream(s)",
            lanes.len(),
            self.registry.stream_infos().len()
        );
        self.lanes = lanes;
        self.is_open = true;
        Ok(())
    }

    fn build_lanes(
        &self,
        metadata: &Metadata,
        path_prefix: &Path,
    ) -> Result<Vec<LanePipeline>, ConvertError> {
        let mut lanes = Vec::with_capacity(metadata.lanes.len());
        for lane in &metadata.lanes {
            let plan = LanePlan::build(metadata, lane)
                .map_err(|e| ConvertError::from_descriptor(&lane.id, e))?;

            let path = path_prefix.join(&plan.file.url);
            let source = self
                .opener
                .open(&path)
                .map_err(|e| ConvertError::from_source(&lane.id, e))?;
            if !source.is_open() {
                return Err(ConvertError::from_source(&lane.id, SourceError::Closed));
            }
            debug!("Lane {}: opened {}", lane.id, path.display());

            lanes.push(LanePipeline::new(plan, &self.registry, source)?);
        }
        Ok(lanes)
    }

    /// Runs every lane to the end of its input, one after the other, then
    /// finishes all sinks.
    pub fn run(&mut self) -> Result<Vec<LaneSummary>, ConvertError> {
        self.run_with(false, |_, _| {})
    }

    /// Runs every lane on its own thread, then finishes all sinks.
    pub fn run_parallel(&mut self) -> Result<Vec<LaneSummary>, ConvertError> {
        self.run_with(true, |_, _| {})
    }

    /// Runs every lane to the end of its input and finishes all sinks,
    /// calling `observe` with the lane's index after each of its steps.
    ///
    /// Run sequentially, the first failing lane stops the run. Run in
    /// parallel, a failing lane does not stop the others and the first
    /// failure in lane order is returned once all lanes have ended.
    pub fn run_with<F>(
        &mut self,
        parallel: bool,
        observe: F,
    ) -> Result<Vec<LaneSummary>, ConvertError>
    where
        F: Fn(usize, &LanePipeline) + Sync,
    {
        if !self.is_open {
            return Err(ConvertError::NotOpen);
        }

        let observe = &observe;
        let summaries = if parallel {
            let results: Vec<Result<LaneSummary, ConvertError>> = thread::scope(|scope| {
                let workers: Vec<_> = self
                    .lanes
                    .iter_mut()
                    .enumerate()
                    .map(|(index, lane)| {
                        let id = lane.id().to_string();
                        (id, scope.spawn(move || drive(index, lane, observe)))
                    })
                    .collect();

                workers
                    .into_iter()
                    .map(|(id, worker)| {
                        worker
                            .join()
                            .map_err(|_| ConvertError::WorkerPanicked(id))?
                    })
                    .collect()
            });
            results.into_iter().collect::<Result<Vec<_>, _>>()?
        } else {
            self.lanes
                .iter_mut()
                .enumerate()
                .map(|(index, lane)| drive(index, lane, observe))
                .collect::<Result<Vec<_>, _>>()?
        };

        self.registry.finish_all()?;
        Ok(summaries)
    }

    /// Releases every lane and its byte source, and forgets the sinks and
    /// stream records of the closed recording.
    pub fn close(&mut self) {
        for lane in &mut self.lanes {
            lane.close();
        }
        self.lanes.clear();
        self.registry.clear();
        self.is_open = false;
    }
}

fn drive<F>(index: usize, lane: &mut LanePipeline, observe: &F) -> Result<LaneSummary, ConvertError>
where
    F: Fn(usize, &LanePipeline),
{
    loop {
        let step = lane.step()?;
        observe(index, lane);
        if step == Step::EndOfInput {
            return Ok(lane.summary().clone());
        }
    }
}

impl Drop for Converter {
    fn drop(&mut self) {
        self.close();
    }
}
