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
//! Parallel execution backends
//!
//! The force and integration passes are written once, as a per-particle work
//! function, and handed to an [`ExecutionBackend`]. The backend decides how
//! the indices `[0, N)` are spread over workers:
//!
//! - [`SequentialBackend`]: a plain loop on the calling thread. This is the
//!   reference every other backend must agree with.
//! - [`ThreadedBackend`]: contiguous chunks, one per worker of a dedicated
//!   thread pool, joined before the call returns.
//! - [`GridBackend`]: a flat grid of fixed-size work groups, one lane per
//!   particle, operating on state held in separate [`DeviceBuffers`].
//!
//! # Work items
//!
//! `for_each_particle` hands the work function the particle index together
//! with exclusive access to that particle's slot in one output array. Inputs
//! are captured by shared reference. Since no two indices share an output
//! slot there is nothing to lock, and every backend computes exactly the same
//! per-index arithmetic as the sequential loop.
//!
//! Every call is a barrier: all work items have finished when it returns, so
//! a force pass can never overlap the integration pass that consumes it.

mod grid;
mod threaded;

pub use grid::{DeviceBuffers, GridBackend, TransferStats};
pub use threaded::ThreadedBackend;

use crate::error::{Error, Result};

/// Where a backend expects particle state to live while it steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySpace {
    /// Work runs directly on the host particle arrays
    Host,
    /// Work runs on a separate copy that must be uploaded before a batch of
    /// steps and downloaded before the host reads it
    Device,
}

/// Strategy for applying a per-particle work function over `[0, N)`
pub trait ExecutionBackend: Send + Sync {
    /// Short human-readable backend name
    fn name(&self) -> &str;

    /// Whether work items may run on more than one thread at once
    fn is_parallel(&self) -> bool;

    /// Memory space this backend steps in
    fn memory_space(&self) -> MemorySpace {
        MemorySpace::Host
    }

    /// Call `work(i, &mut items[i])` for every index, returning once all
    /// calls have completed
    fn for_each_particle<T, F>(&self, items: &mut [T], work: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync;
}

/// Reference backend: one loop on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl ExecutionBackend for SequentialBackend {
    fn name(&self) -> &str {
        "sequential"
    }

    fn is_parallel(&self) -> bool {
        false
    }

    fn for_each_particle<T, F>(&self, items: &mut [T], work: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        for (index, item) in items.iter_mut().enumerate() {
            work(index, item);
        }
    }
}

/// Driver-facing backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendConfig {
    /// Single-threaded reference execution
    Sequential,
    /// Thread pool with at most `max_workers` contiguous chunks per pass
    Threaded {
        /// Upper bound on worker threads (and chunks per pass)
        max_workers: usize,
    },
    /// Flat grid of `group_size`-lane work groups on device buffers
    Grid {
        /// Lanes per work group
        group_size: usize,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Threaded {
            max_workers: ThreadedBackend::DEFAULT_MAX_WORKERS,
        }
    }
}

impl BackendConfig {
    /// Construct the configured backend
    ///
    /// Fails with a configuration error for a zero worker count or group
    /// size, or if the worker pool cannot be started.
    pub fn build(&self) -> Result<Backend> {
        let backend = match *self {
            BackendConfig::Sequential => Backend::Sequential(SequentialBackend),
            BackendConfig::Threaded { max_workers } => Backend::Threaded(ThreadedBackend::new(max_workers)?),
            BackendConfig::Grid { group_size } => Backend::Grid(GridBackend::new(group_size)?),
        };
        log::debug!("using {} backend", backend.name());
        Ok(backend)
    }

    /// Parse a backend name as given on a command line
    ///
    /// `width` is the worker count for `threaded` and the group size for
    /// `grid`; it is ignored for `sequential`.
    pub fn from_name(name: &str, width: usize) -> Result<Self> {
        match name {
            "sequential" | "seq" => Ok(BackendConfig::Sequential),
            "threaded" | "threads" => Ok(BackendConfig::Threaded { max_workers: width }),
            "grid" | "device" => Ok(BackendConfig::Grid { group_size: width }),
            other => Err(Error::config(format!(
                "unknown backend '{other}' (expected sequential, threaded or grid)"
            ))),
        }
    }
}

/// Any of the built-in backends, chosen at run time
#[derive(Debug)]
pub enum Backend {
    /// See [`SequentialBackend`]
    Sequential(SequentialBackend),
    /// See [`ThreadedBackend`]
    Threaded(ThreadedBackend),
    /// See [`GridBackend`]
    Grid(GridBackend),
}

impl ExecutionBackend for Backend {
    fn name(&self) -> &str {
        match self {
            Backend::Sequential(b) => b.name(),
            Backend::Threaded(b) => b.name(),
            Backend::Grid(b) => b.name(),
        }
    }

    fn is_parallel(&self) -> bool {
        match self {
            Backend::Sequential(b) => b.is_parallel(),
            Backend::Threaded(b) => b.is_parallel(),
            Backend::Grid(b) => b.is_parallel(),
        }
    }

    fn memory_space(&self) -> MemorySpace {
        match self {
            Backend::Sequential(b) => b.memory_space(),
            Backend::Threaded(b) => b.memory_space(),
            Backend::Grid(b) => b.memory_space(),
        }
    }

    fn for_each_particle<T, F>(&self, items: &mut [T], work: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        match self {
            Backend::Sequential(b) => b.for_each_particle(items, work),
            Backend::Threaded(b) => b.for_each_particle(items, work),
            Backend::Grid(b) => b.for_each_particle(items, work),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares<B: ExecutionBackend>(backend: &B, n: usize) -> Vec<usize> {
        let mut out = vec![0usize; n];
        backend.for_each_particle(&mut out, |i, slot| *slot = i * i);
        out
    }

    #[test]
    fn test_sequential_visits_every_index() {
        let out = squares(&SequentialBackend, 10);
        assert_eq!(out, (0..10).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_all_backends_agree() {
        let expected = squares(&SequentialBackend, 1000);
        for config in [
            BackendConfig::Threaded { max_workers: 3 },
            BackendConfig::Grid { group_size: 64 },
        ] {
            let backend = config.build().unwrap();
            assert_eq!(squares(&backend, 1000), expected, "{}", backend.name());
        }
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        for config in [
            BackendConfig::Sequential,
            BackendConfig::Threaded { max_workers: 4 },
            BackendConfig::Grid { group_size: 8 },
        ] {
            let backend = config.build().unwrap();
            assert!(squares(&backend, 0).is_empty());
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(BackendConfig::from_name("seq", 0).unwrap(), BackendConfig::Sequential);
        assert_eq!(
            BackendConfig::from_name("threaded", 4).unwrap(),
            BackendConfig::Threaded { max_workers: 4 }
        );
        assert_eq!(
            BackendConfig::from_name("grid", 128).unwrap(),
            BackendConfig::Grid { group_size: 128 }
        );
        assert!(BackendConfig::from_name("cuda", 1).unwrap_err().is_configuration());
    }

    #[test]
    fn test_memory_spaces() {
        assert_eq!(SequentialBackend.memory_space(), MemorySpace::Host);
        let grid = BackendConfig::Grid { group_size: 32 }.build().unwrap();
        assert_eq!(grid.memory_space(), MemorySpace::Device);
        assert!(grid.is_parallel());
        assert!(!SequentialBackend.is_parallel());
    }
}
