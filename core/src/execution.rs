//! Bounded fork-join execution for rule extraction and batch mapping.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{MapperError, DEFAULT_PARALLEL_THRESHOLD};

/// How a [`Mapper`](crate::Mapper) spreads work over threads.
///
/// ```
/// use mapperz::ExecutionConfig;
///
/// let config = ExecutionConfig::default().with_max_threads(2);
/// assert_eq!(config.max_threads, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ExecutionConfig {
    /// Size of a dedicated worker pool. `None` shares rayon's global pool.
    pub max_threads: Option<usize>,

    /// Work lists shorter than this run on the calling thread.
    /// `0` or `1` parallelizes everything; `usize::MAX` disables parallelism.
    pub parallel_threshold: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_threads: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ExecutionConfig {
    /// Run everything on the calling thread.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            max_threads: None,
            parallel_threshold: usize::MAX,
        }
    }

    /// Cap the worker pool at `threads` (at least one).
    #[must_use]
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = Some(threads.max(1));
        self
    }

    /// Set the minimum work-list length that is parallelized.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Runs closures over slices, in parallel when the slice is long enough.
#[derive(Debug)]
pub(crate) struct Executor {
    pool: Option<ThreadPool>,
    threshold: usize,
}

impl Executor {
    pub(crate) fn new(config: &ExecutionConfig) -> Result<Self, MapperError> {
        let pool = config
            .max_threads
            .map(|threads| {
                ThreadPoolBuilder::new()
                    .num_threads(threads.max(1))
                    .thread_name(|i| format!("mapperz-worker-{i}"))
                    .build()
                    .map_err(|source| MapperError::ThreadPool { source })
            })
            .transpose()?;
        Ok(Self {
            pool,
            threshold: config.parallel_threshold,
        })
    }

    /// Map `f` over `items`, keeping input order in the output.
    pub(crate) fn collect<I, R, F>(&self, items: &[I], f: F) -> Vec<R>
    where
        I: Sync,
        R: Send,
        F: Fn(&I) -> R + Send + Sync,
    {
        if items.len() < self.threshold.max(2) {
            return items.iter().map(f).collect();
        }
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            None => items.par_iter().map(f).collect(),
        }
    }
}
