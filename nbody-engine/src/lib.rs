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
//! # N-Body Engine
//!
//! Direct-summation gravitational N-body simulation with interchangeable
//! parallel backends.
//!
//! ## Features
//!
//! - **Structure-of-arrays storage**: mass, position, velocity and force live
//!   in parallel arrays indexed by particle
//! - **Softened O(N²) gravity**: every pair, every step, with the softening
//!   term keeping close encounters finite
//! - **Semi-implicit Euler**: velocity kick from fresh forces, then position
//!   drift with the new velocity
//! - **Backends**: sequential reference, a threaded pool, and a flat grid of
//!   work groups on separate device buffers, all producing the same numbers
//! - **Snapshots**: plain-text records written on a fixed step cadence
//!
//! ## Example
//!
//! ```rust
//! use nbody_engine::backend::BackendConfig;
//! use nbody_engine::config::{InitSource, SimulationConfig};
//! use nbody_engine::simulation::{initialize, run_steps};
//! use nbody_engine::snapshot::SnapshotEmitter;
//!
//! let mut system = initialize(&InitSource::from_count_or_path(32, None, 7).unwrap()).unwrap();
//! let config = SimulationConfig::new(60.0, 10, 5, 1e12);
//! let backend = BackendConfig::Threaded { max_workers: 4 }.build().unwrap();
//!
//! let mut emitter = SnapshotEmitter::new(Vec::new());
//! let summary = run_steps(&mut system, &config, &backend, &mut emitter).unwrap();
//! assert_eq!(summary.snapshots_written, 2);
//! ```

#![warn(missing_docs)]

/// Parallel execution backends
pub mod backend;

/// Run parameters and initial-state sources
pub mod config;

/// Conserved-quantity diagnostics
pub mod diagnostics;

/// Error type shared by every fallible operation
pub mod error;

/// Plain-text particle record format
pub mod format;

/// Pairwise gravitational forces
pub mod gravity;

/// Numerical integration methods
pub mod integration;

/// Particle storage and initial conditions
pub mod particles;

/// Step loop and simulation lifecycle
pub mod simulation;

/// Periodic snapshot output
pub mod snapshot;

pub use backend::{Backend, BackendConfig, ExecutionBackend};
pub use config::{InitSource, SimulationConfig};
pub use error::{Error, Result};
pub use gravity::{ForceKernel, ForceStrategy};
pub use particles::ParticleSystem;
pub use simulation::{initialize, run_steps, Simulation};
