// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Thread-pool backend with contiguous chunking
//!
//! Each pass splits `[0, N)` into at most `max_workers` contiguous chunks of
//! `ceil(N / max_workers)` indices and runs one chunk per task. Contiguous
//! ranges keep every worker streaming through its own region of the output
//! array. With the `parallel` feature the tasks run on a dedicated Rayon pool
//! sized to `max_workers`; without it, on scoped OS threads.

use super::ExecutionBackend;
use crate::error::{Error, Result};

/// Fan-out/fan-in backend over a fixed number of workers
#[derive(Debug)]
pub struct ThreadedBackend {
    max_workers: usize,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl ThreadedBackend {
    /// Worker bound used when the driver does not specify one
    pub const DEFAULT_MAX_WORKERS: usize = 8;

    /// Create a backend with at most `max_workers` concurrent chunks
    pub fn new(max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(Error::config("threaded backend needs at least one worker"));
        }

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|index| format!("nbody-worker-{index}"))
            .build()
            .map_err(|e| Error::config(format!("failed to start worker pool: {e}")))?;

        Ok(ThreadedBackend {
            max_workers,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Upper bound on chunks per pass
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Indices per chunk for a pass over `n` particles
    pub fn chunk_len(&self, n: usize) -> usize {
        n.div_ceil(self.max_workers).max(1)
    }
}

fn run_chunk<T, F>(start: usize, chunk: &mut [T], work: &F)
where
    F: Fn(usize, &mut T),
{
    for (offset, item) in chunk.iter_mut().enumerate() {
        work(start + offset, item);
    }
}

impl ExecutionBackend for ThreadedBackend {
    fn name(&self) -> &str {
        "threaded"
    }

    fn is_parallel(&self) -> bool {
        self.max_workers > 1
    }

    fn for_each_particle<T, F>(&self, items: &mut [T], work: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        if items.is_empty() {
            return;
        }
        let chunk_len = self.chunk_len(items.len());
        let work = &work;

        #[cfg(feature = "parallel")]
        self.pool.scope(|scope| {
            for (chunk_index, chunk) in items.chunks_mut(chunk_len).enumerate() {
                scope.spawn(move |_| run_chunk(chunk_index * chunk_len, chunk, work));
            }
        });

        #[cfg(not(feature = "parallel"))]
        std::thread::scope(|scope| {
            for (chunk_index, chunk) in items.chunks_mut(chunk_len).enumerate() {
                scope.spawn(move || run_chunk(chunk_index * chunk_len, chunk, work));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        let err = ThreadedBackend::new(0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_chunk_len_bounds_chunk_count() {
        let backend = ThreadedBackend::new(8).unwrap();
        assert_eq!(backend.chunk_len(100), 13);
        assert_eq!(backend.chunk_len(8), 1);
        assert_eq!(backend.chunk_len(3), 1);
        assert!(100usize.div_ceil(backend.chunk_len(100)) <= 8);
    }

    #[test]
    fn test_indices_match_slots() {
        let backend = ThreadedBackend::new(4).unwrap();
        let mut out = vec![usize::MAX; 37];
        backend.for_each_particle(&mut out, |i, slot| *slot = i);
        assert_eq!(out, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_worker_is_not_parallel() {
        assert!(!ThreadedBackend::new(1).unwrap().is_parallel());
        assert!(ThreadedBackend::new(2).unwrap().is_parallel());
    }

    #[test]
    fn test_more_workers_than_items() {
        let backend = ThreadedBackend::new(16).unwrap();
        let mut out = vec![0.0f64; 5];
        backend.for_each_particle(&mut out, |i, slot| *slot = i as f64 * 0.5);
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }
}
