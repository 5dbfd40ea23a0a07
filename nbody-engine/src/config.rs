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
//! Run configuration
//!
//! [`SimulationConfig`] holds the parameters that stay fixed for a run;
//! [`InitSource`] says where the initial particles come from. Both are plain
//! structs: construct them directly or with the builder-style `with_*`
//! methods, and call `validate` (or let [`crate::simulation`] do it) before
//! stepping.
//!
//! The softening term has no default. The right value depends on the length
//! scale of the problem, so every config names one explicitly.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::gravity::{ForceKernel, ForceStrategy, GRAVITATIONAL_CONSTANT};
use crate::integration::SemiImplicitEuler;
use crate::particles::{RandomInit, PRESET_NAMES};

/// Immutable parameters for one run
///
/// # Example
///
/// ```
/// use nbody_engine::config::SimulationConfig;
///
/// // One-day steps for a year, snapshot weekly, 1000 km² softening.
/// let config = SimulationConfig::new(86_400.0, 365, 7, 1e12);
/// assert!(config.validate().is_ok());
/// assert!(config.is_snapshot_step(14));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Timestep, in the time unit implied by `g_constant`
    pub dt: f64,
    /// Number of steps to run
    pub steps: usize,
    /// Snapshot every `interval` steps (steps 0, interval, 2·interval, ...)
    pub interval: usize,
    /// Gravitational constant; SI by default
    pub g_constant: f64,
    /// Softening added to squared separations; must be positive
    pub softening: f64,
    /// Force accumulation strategy
    pub strategy: ForceStrategy,
}

impl SimulationConfig {
    /// Configuration with the SI gravitational constant and independent-row
    /// force accumulation
    pub fn new(dt: f64, steps: usize, interval: usize, softening: f64) -> Self {
        SimulationConfig {
            dt,
            steps,
            interval,
            g_constant: GRAVITATIONAL_CONSTANT,
            softening,
            strategy: ForceStrategy::IndependentRows,
        }
    }

    /// Use a different gravitational constant (e.g. 1.0 for N-body units)
    pub fn with_g_constant(mut self, g_constant: f64) -> Self {
        self.g_constant = g_constant;
        self
    }

    /// Use a different force accumulation strategy
    pub fn with_strategy(mut self, strategy: ForceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(Error::config(format!("timestep must be positive and finite, got {}", self.dt)));
        }
        if self.interval == 0 {
            return Err(Error::config("snapshot interval must be at least 1"));
        }
        self.force_kernel().map(|_| ())
    }

    /// Whether a snapshot is due after step `step`
    pub fn is_snapshot_step(&self, step: usize) -> bool {
        self.interval != 0 && step % self.interval == 0
    }

    /// Force kernel for this configuration
    pub fn force_kernel(&self) -> Result<ForceKernel> {
        Ok(ForceKernel::new(self.g_constant, self.softening)?.with_strategy(self.strategy))
    }

    /// Integrator for this configuration
    pub fn integrator(&self) -> Result<SemiImplicitEuler> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(Error::config(format!("timestep must be positive and finite, got {}", self.dt)));
        }
        Ok(SemiImplicitEuler::new(self.dt))
    }
}

/// Where the initial particle state comes from
#[derive(Debug, Clone, PartialEq)]
pub enum InitSource {
    /// `count` particles drawn from `params`
    Random {
        /// Number of particles
        count: usize,
        /// Distribution ranges and seed
        params: RandomInit,
    },
    /// A named configuration, see [`PRESET_NAMES`]
    Preset(String),
    /// A record file in the text format of [`crate::format`]
    File(PathBuf),
}

impl InitSource {
    /// Resolve the driver convention of a particle count plus optional path
    ///
    /// A positive count generates that many particles with default ranges and
    /// `seed`. A count of zero means "load instead of generate" and requires
    /// a path.
    pub fn from_count_or_path(count: usize, path: Option<PathBuf>, seed: u64) -> Result<Self> {
        match (count, path) {
            (0, Some(path)) => Ok(InitSource::File(path)),
            (0, None) => Err(Error::config(
                "particle count is zero and no input file was given",
            )),
            (count, _) => Ok(InitSource::Random {
                count,
                params: RandomInit::with_seed(seed),
            }),
        }
    }

    /// Interpret a single positional input argument
    ///
    /// A positive integer generates that many random particles, a preset name
    /// selects the preset, and anything else is taken as a file path. `"0"`
    /// is rejected because it names neither a count nor a file.
    pub fn parse(arg: &str, seed: u64) -> Result<Self> {
        if let Ok(count) = arg.parse::<usize>() {
            return Self::from_count_or_path(count, None, seed);
        }
        if PRESET_NAMES.contains(&arg) {
            return Ok(InitSource::Preset(arg.to_string()));
        }
        Ok(InitSource::File(PathBuf::from(arg)))
    }
}
