//! Consumers of decoded samples.
//!
//! Sinks are keyed by stream identity in a [`SinkRegistry`] owned by the
//! converter. The registry creates a sink the first time a stream is seen
//! and hands out the same shared handle on every later lookup, so plans for
//! different lanes may be built and executed from different threads.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::structs::stream_info::StreamInfo;
use crate::utils::errors::ConvertError;
use crate::utils::sample::Sample;

pub mod memory;
pub mod statistics;

pub use memory::{MemoryCollector, MemorySink};
pub use statistics::{ComponentStatistics, StatisticsCollector, StatisticsSink};

pub trait Sink: Send {
    fn consume(&mut self, sample: Sample, info: &StreamInfo) -> Result<()>;

    /// Flushes buffered output once conversion has ended.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

pub type SinkHandle = Arc<Mutex<dyn Sink>>;

/// Creates the sink for a stream on first use.
pub trait SinkFactory: Send + Sync {
    fn create(&self, stream: &str) -> Result<SinkHandle>;
}

impl<F> SinkFactory for F
where
    F: Fn(&str) -> Result<SinkHandle> + Send + Sync,
{
    fn create(&self, stream: &str) -> Result<SinkHandle> {
        self(stream)
    }
}

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stream identity to sink and stream metadata.
pub struct SinkRegistry {
    factory: Box<dyn SinkFactory>,
    sinks: Mutex<BTreeMap<String, SinkHandle>>,
    infos: Mutex<BTreeMap<String, Arc<StreamInfo>>>,
}

impl SinkRegistry {
    pub fn new(factory: impl SinkFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            sinks: Mutex::new(BTreeMap::new()),
            infos: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the stream's sink, creating it if absent.
    pub fn sink(&self, stream: &str) -> Result<SinkHandle, ConvertError> {
        let mut sinks = lock(&self.sinks);
        if let Some(sink) = sinks.get(stream) {
            return Ok(sink.clone());
        }

        let sink = self
            .factory
            .create(stream)
            .map_err(|cause| ConvertError::Sink {
                stream: stream.to_string(),
                cause,
            })?;
        sinks.insert(stream.to_string(), sink.clone());
        Ok(sink)
    }

    /// Registers the stream's metadata unless it is already known and
    /// returns the registered record.
    pub fn stream_info_or_insert(&self, info: StreamInfo) -> Arc<StreamInfo> {
        lock(&self.infos)
            .entry(info.id.clone())
            .or_insert_with(|| Arc::new(info))
            .clone()
    }

    pub fn stream_info(&self, stream: &str) -> Option<Arc<StreamInfo>> {
        lock(&self.infos).get(stream).cloned()
    }

    /// Metadata of every registered stream, ordered by identity.
    pub fn stream_infos(&self) -> Vec<Arc<StreamInfo>> {
        lock(&self.infos).values().cloned().collect()
    }

    /// Forgets every sink and stream record; the next lookup creates them
    /// afresh.
    pub fn clear(&self) {
        lock(&self.sinks).clear();
        lock(&self.infos).clear();
    }

    /// Calls [`Sink::finish`] on every sink, stopping at the first failure.
    pub fn finish_all(&self) -> Result<(), ConvertError> {
        for (stream, sink) in lock(&self.sinks).iter() {
            lock(sink.as_ref())
                .finish()
                .map_err(|cause| ConvertError::Sink {
                    stream: stream.clone(),
                    cause,
                })?;
        }
        Ok(())
    }
}

/// Discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn consume(&mut self, _sample: Sample, _info: &StreamInfo) -> Result<()> {
        Ok(())
    }
}

/// Factory producing a [`NullSink`] for every stream.
pub fn null_factory(_stream: &str) -> Result<SinkHandle> {
    Ok(Arc::new(Mutex::new(NullSink)))
}

/// A factory that keeps typed handles to the sinks it creates so callers
/// can inspect them once conversion is done.
pub struct Collector<S> {
    sinks: Arc<Mutex<BTreeMap<String, Arc<Mutex<S>>>>>,
}

impl<S> Clone for Collector<S> {
    fn clone(&self) -> Self {
        Self {
            sinks: self.sinks.clone(),
        }
    }
}

impl<S> Default for Collector<S> {
    fn default() -> Self {
        Self {
            sinks: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<S> Collector<S> {
    pub fn get(&self, stream: &str) -> Option<Arc<Mutex<S>>> {
        lock(&self.sinks).get(stream).cloned()
    }

    pub fn streams(&self) -> Vec<String> {
        lock(&self.sinks).keys().cloned().collect()
    }

    /// Runs `f` on the stream's sink, if it was created.
    pub fn with<T>(&self, stream: &str, f: impl FnOnce(&S) -> T) -> Option<T> {
        self.get(stream).map(|sink| f(&lock(sink.as_ref())))
    }
}

impl<S: Sink + Default + 'static> SinkFactory for Collector<S> {
    fn create(&self, stream: &str) -> Result<SinkHandle> {
        let sink = Arc::new(Mutex::new(S::default()));
        lock(&self.sinks).insert(stream.to_string(), sink.clone());
        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::descriptor::{Band, Stream, System};
    use std::thread;

    #[test]
    fn sinks_are_created_once() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let registry = SinkRegistry::new(collector.clone());

        let a = registry.sink("L1")?;
        let b = registry.sink("L1")?;
        assert!(Arc::ptr_eq(&a, &b));
        registry.sink("L2")?;
        assert_eq!(collector.streams(), vec!["L1".to_string(), "L2".to_string()]);
        Ok(())
    }

    #[test]
    fn concurrent_first_touch_yields_one_sink() {
        let collector = MemoryCollector::default();
        let registry = SinkRegistry::new(collector.clone());

        let handles: Vec<SinkHandle> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.sink("L5").unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(collector.streams().len(), 1);
    }

    #[test]
    fn cleared_registry_starts_over() -> Result<(), ConvertError> {
        let collector = MemoryCollector::default();
        let registry = SinkRegistry::new(collector.clone());

        let first = registry.sink("L1")?;
        let stream = Stream {
            id: "L1".into(),
            ..Default::default()
        };
        registry.stream_info_or_insert(StreamInfo::new(
            &stream,
            &System::default(),
            &Band::default(),
        ));
        registry.clear();

        assert!(registry.stream_info("L1").is_none());
        assert!(registry.stream_infos().is_empty());
        assert!(!Arc::ptr_eq(&first, &registry.sink("L1")?));
        Ok(())
    }

    #[test]
    fn factory_failure_names_the_stream() {
        let registry = SinkRegistry::new(|_: &str| -> Result<SinkHandle> {
            anyhow::bail!("disk full")
        });

        let err = registry.sink("E1").err().unwrap();
        assert_eq!(err.to_string(), "Sink for stream E1 failed: disk full");
    }
}
