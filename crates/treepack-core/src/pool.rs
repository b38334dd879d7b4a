//! Bounded worker pool for per-entry fan-out.

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::ArchiveError;
use crate::Result;

/// A dedicated rayon pool sized from `ArchiveConfig::threads`.
///
/// Built per operation so concurrent operations do not share workers and
/// the global rayon pool stays untouched.
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Builds a pool with `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `threads` is zero, `Io` if the OS refuses
    /// to spawn the workers.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(ArchiveError::InvalidConfig {
                reason: "thread count must be at least 1".to_string(),
            });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("treepack-worker-{i}"))
            .build()
            .map_err(|e| ArchiveError::Io(std::io::Error::other(e)))?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `f` once per item on the pool and collects the results in
    /// input order.
    ///
    /// Fails fast: the first error is returned and rayon stops handing
    /// out the remaining items.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(f).collect())
    }

    /// Runs `op` inside the pool so nested rayon calls use its workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}
