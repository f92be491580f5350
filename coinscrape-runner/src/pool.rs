//! Bounded, order-preserving worker pools.
//!
//! Each pool owns a private rayon thread pool (not the global one) with a
//! fixed thread count. Items are handed out one at a time from the shared
//! queue and results land in the slot matching their input index, so the
//! output order never depends on completion order.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pipeline::PipelineError;

pub struct WorkerPool {
    name: &'static str,
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers; 0 means one per core.
    pub fn new(name: &'static str, threads: usize) -> Result<Self, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{name}-{i}"))
            .build()
            .map_err(|e| PipelineError::Pool {
                name,
                reason: e.to_string(),
            })?;
        Ok(Self { name, pool })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item on this pool. `out[i] == f(&items[i])`.
    ///
    /// `on_done` receives the running completion count after each item.
    pub fn map<T, R, F, P>(&self, items: &[T], f: F, on_done: P) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
        P: Fn(usize) + Sync,
    {
        let completed = AtomicUsize::new(0);
        self.pool.install(|| {
            items
                .par_iter()
                .with_max_len(1)
                .map(|item| {
                    let out = f(item);
                    on_done(completed.fetch_add(1, Ordering::Relaxed) + 1);
                    out
                })
                .collect()
        })
    }
}
