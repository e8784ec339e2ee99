use crate::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::ops::Range;

/// Fixed pool of worker threads that runs index loops in contiguous chunks.
///
/// The pool is created once and reused by every call. Worker `k` of `N` processes
/// the indices `[count * k / N, count * (k + 1) / N)`, and a call returns only
/// after all chunks are done. Bodies must only write to data owned by their index.
#[derive(Debug)]
pub struct ThreadedForLoop {
    pool: ThreadPool,
    threads: usize,
}

impl ThreadedForLoop {
    /// Creates a pool with `threads` workers; `0` uses the available parallelism.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = if threads == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            threads
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("packtherm-worker-{i}"))
            .build()?;
        tracing::debug!(threads, "worker pool started");
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Calls `op(i)` for every `i` in `0..count`.
    pub fn run_loop<F>(&self, count: usize, op: F)
    where
        F: Fn(usize) + Sync,
    {
        let op = &op;
        self.pool.scope(|s| {
            for k in 0..self.threads {
                let range = chunk_range(count, self.threads, k);
                if range.is_empty() {
                    continue;
                }
                s.spawn(move |_| range.for_each(op));
            }
        });
    }

    /// Calls `op(i, &mut data[i])` for every element of `data`.
    pub fn run_loop_mut<T, F>(&self, data: &mut [T], op: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        let count = data.len();
        let op = &op;
        self.pool.scope(|s| {
            let mut rest = data;
            for k in 0..self.threads {
                let range = chunk_range(count, self.threads, k);
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                if chunk.is_empty() {
                    continue;
                }
                let start = range.start;
                s.spawn(move |_| {
                    for (offset, item) in chunk.iter_mut().enumerate() {
                        op(start + offset, item);
                    }
                });
            }
        });
    }

    /// Fallible [`run_loop_mut`](Self::run_loop_mut). Each worker stops at its first
    /// error; the error of the lowest failing index is returned.
    pub fn try_run_loop_mut<T, F>(&self, data: &mut [T], op: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize, &mut T) -> Result<()> + Sync,
    {
        let count = data.len();
        let op = &op;
        let mut outcomes: Vec<Result<()>> = (0..self.threads).map(|_| Ok(())).collect();
        self.pool.scope(|s| {
            let mut rest = data;
            for (k, outcome) in outcomes.iter_mut().enumerate() {
                let range = chunk_range(count, self.threads, k);
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                if chunk.is_empty() {
                    continue;
                }
                let start = range.start;
                s.spawn(move |_| {
                    *outcome = chunk
                        .iter_mut()
                        .enumerate()
                        .try_for_each(|(offset, item)| op(start + offset, item));
                });
            }
        });
        outcomes.into_iter().collect()
    }
}

/// Index range of worker `k` out of `threads` for a loop over `count` items.
pub fn chunk_range(count: usize, threads: usize, k: usize) -> Range<usize> {
    count * k / threads..count * (k + 1) / threads
}
