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
//! Simulation driver
//!
//! Ties the pieces together: build a [`ParticleSystem`] from an
//! [`InitSource`], then repeat force pass → integration pass through an
//! [`ExecutionBackend`], handing state to a [`SnapshotEmitter`] every
//! `interval` steps.
//!
//! There are two ways in. The free functions [`initialize`] and
//! [`run_steps`] are the stateless core. [`Simulation`] wraps them in the
//! lifecycle `Uninitialized → Initialized → Running → Completed` and owns
//! the particles, the backend and the cancellation handle.
//!
//! Cancellation and timeouts are cooperative: both are checked before each
//! step starts, never in the middle of one, so the state a cancelled run
//! leaves behind is always the state at a step boundary.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{DeviceBuffers, ExecutionBackend, MemorySpace, TransferStats};
use crate::config::{InitSource, SimulationConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::gravity::{ForceKernel, ForceStrategy};
use crate::integration::Integrator;
use crate::particles::ParticleSystem;
use crate::snapshot::SnapshotEmitter;

/// Build the initial particle state
///
/// Random and preset sources are generated in memory; file sources are read
/// with [`ParticleSystem::load_from_path`]. Either way the result has passed
/// [`ParticleSystem::validate`].
pub fn initialize(source: &InitSource) -> Result<ParticleSystem> {
    let system = match source {
        InitSource::Random { count, params } => ParticleSystem::random_init(*count, params)?,
        InitSource::Preset(name) => ParticleSystem::preset_init(name)?,
        InitSource::File(path) => ParticleSystem::load_from_path(path)?,
    };
    system.validate()?;
    log::info!("initialized {} particles", system.len());
    Ok(system)
}

/// Shared flag for stopping a run at the next step boundary
///
/// Clones share the same flag, so one can be handed to another thread (or a
/// signal handler) while the run holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not yet raised
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before its next step
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Lower the flag so the handle can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Step-boundary controls for a run
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    /// Checked before every step
    pub cancel: CancelFlag,
    /// Wall-clock budget, measured from the start of the run
    pub timeout: Option<Duration>,
}

impl RunControl {
    /// Controls that observe `cancel` and have no timeout
    pub fn with_cancel(cancel: CancelFlag) -> Self {
        RunControl { cancel, timeout: None }
    }

    /// Add a wall-clock budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn interruption(&self, started: Instant) -> Option<RunOutcome> {
        if self.cancel.is_cancelled() {
            return Some(RunOutcome::Cancelled);
        }
        match self.timeout {
            Some(limit) if started.elapsed() >= limit => Some(RunOutcome::TimedOut),
            _ => None,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every configured step ran
    Completed,
    /// The cancel flag was raised
    Cancelled,
    /// The wall-clock budget ran out
    TimedOut,
}

/// What a run did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Steps fully executed (force and integration)
    pub steps_completed: usize,
    /// Snapshots written to the sink
    pub snapshots_written: usize,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Host/device transfers, for backends with their own memory space
    pub transfers: Option<TransferStats>,
    /// Wall-clock duration of the step loop
    pub elapsed: Duration,
}

/// Run `config.steps` steps with no cancellation or timeout
///
/// See [`run_steps_controlled`].
pub fn run_steps<B, W>(
    system: &mut ParticleSystem,
    config: &SimulationConfig,
    backend: &B,
    emitter: &mut SnapshotEmitter<W>,
) -> Result<RunSummary>
where
    B: ExecutionBackend,
    W: Write,
{
    run_steps_controlled(system, config, backend, emitter, &RunControl::default())
}

/// Advance `system` by up to `config.steps` steps
///
/// Each step recomputes every force from the current positions, then kicks
/// velocities and drifts positions. After the integration of step `k`, a
/// snapshot is emitted if `k % interval == 0`.
///
/// Backends in [`MemorySpace::Device`] step a separate copy of the state:
/// it is uploaded once, and `system` is refreshed only before each snapshot
/// and when the loop ends.
///
/// # Errors
///
/// - [`Error::Configuration`] if `config` is invalid, `system` is empty or
///   invalid, or the symmetric-pair kernel is paired with a parallel backend.
///   Nothing has been stepped.
/// - [`Error::SinkWrite`] if a snapshot cannot be written. `system` holds the
///   state of the failing step.
pub fn run_steps_controlled<B, W>(
    system: &mut ParticleSystem,
    config: &SimulationConfig,
    backend: &B,
    emitter: &mut SnapshotEmitter<W>,
    control: &RunControl,
) -> Result<RunSummary>
where
    B: ExecutionBackend,
    W: Write,
{
    config.validate()?;
    system.validate()?;
    let kernel = config.force_kernel()?;
    if kernel.strategy() == ForceStrategy::SymmetricPairs && backend.is_parallel() {
        return Err(Error::config(format!(
            "symmetric pair forces cannot run on the parallel {} backend",
            backend.name()
        )));
    }
    let integrator = config.integrator()?;
    if let Err(warning) = integrator.validate_timestep() {
        log::warn!("{warning}");
    }

    log::info!(
        "running {} steps of {} particles on the {} backend (dt = {}, snapshot every {})",
        config.steps,
        system.len(),
        backend.name(),
        config.dt,
        config.interval
    );

    let started = Instant::now();
    let initial_snapshots = emitter.written();
    let mut device = match backend.memory_space() {
        MemorySpace::Device => Some(DeviceBuffers::upload(system)),
        MemorySpace::Host => None,
    };
    // Device state has advanced past the host copy.
    let mut host_stale = false;
    let mut outcome = RunOutcome::Completed;
    let mut steps_completed = 0;

    for step in 0..config.steps {
        if let Some(interrupted) = control.interruption(started) {
            log::info!("run stopped before step {step}: {interrupted:?}");
            outcome = interrupted;
            break;
        }

        {
            let state = match device.as_mut() {
                Some(device) => device.particles_mut(),
                None => &mut *system,
            };
            advance(state, &kernel, &integrator, backend);
        }
        steps_completed += 1;
        host_stale = device.is_some();

        if config.is_snapshot_step(step) {
            if let Some(device) = device.as_mut() {
                device.download(system);
                host_stale = false;
            }
            emitter.emit(step, system)?;
            log_diagnostics(step, system, &kernel);
        }
    }

    if let Some(device) = device.as_mut() {
        if host_stale {
            device.download(system);
        }
    }
    emitter.flush(steps_completed)?;

    let summary = RunSummary {
        steps_completed,
        snapshots_written: emitter.written() - initial_snapshots,
        outcome,
        transfers: device.map(|device| device.transfers()),
        elapsed: started.elapsed(),
    };
    log::info!(
        "{} steps in {:.3?}, {} snapshots written",
        summary.steps_completed,
        summary.elapsed,
        summary.snapshots_written
    );
    Ok(summary)
}

fn advance<B, I>(system: &mut ParticleSystem, kernel: &ForceKernel, integrator: &I, backend: &B)
where
    B: ExecutionBackend,
    I: Integrator,
{
    kernel.compute_forces(system, backend);
    integrator.integrate(system, backend);
}

fn log_diagnostics(step: usize, system: &ParticleSystem, kernel: &ForceKernel) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let diagnostics = Diagnostics::measure(system, kernel);
    log::debug!(
        "step {step}: |p| = {:e}, E = {:e} (K = {:e}, U = {:e})",
        diagnostics.momentum_magnitude(),
        diagnostics.total_energy(),
        diagnostics.kinetic_energy,
        diagnostics.potential_energy
    );
}

/// Lifecycle of a [`Simulation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// No particles yet
    Uninitialized,
    /// Particles loaded, ready to run
    Initialized,
    /// Inside [`Simulation::run`]
    Running,
    /// The run ended, normally or at a step boundary
    Completed,
    /// The run failed; the particles hold the state at the failure
    Aborted,
}

/// A single run with its particles, backend and controls
///
/// # Example
///
/// ```
/// use nbody_engine::backend::SequentialBackend;
/// use nbody_engine::config::{InitSource, SimulationConfig};
/// use nbody_engine::simulation::{Simulation, SimulationState};
/// use nbody_engine::snapshot::SnapshotEmitter;
///
/// let config = SimulationConfig::new(3600.0, 24, 6, 1e9);
/// let mut sim = Simulation::new(config, SequentialBackend).unwrap();
/// sim.initialize(&InitSource::Preset("binary".into())).unwrap();
///
/// let mut emitter = SnapshotEmitter::new(Vec::new());
/// let summary = sim.run(&mut emitter).unwrap();
/// assert_eq!(summary.steps_completed, 24);
/// assert_eq!(summary.snapshots_written, 4);
/// assert_eq!(sim.state(), SimulationState::Completed);
/// ```
#[derive(Debug)]
pub struct Simulation<B: ExecutionBackend> {
    config: SimulationConfig,
    backend: B,
    system: Option<ParticleSystem>,
    state: SimulationState,
    control: RunControl,
}

impl<B: ExecutionBackend> Simulation<B> {
    /// Validate `config` and set up an uninitialized simulation
    pub fn new(config: SimulationConfig, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Simulation {
            config,
            backend,
            system: None,
            state: SimulationState::Uninitialized,
            control: RunControl::default(),
        })
    }

    /// Build the particles from `source`
    pub fn initialize(&mut self, source: &InitSource) -> Result<()> {
        self.expect_state(SimulationState::Uninitialized, "initialize")?;
        let system = initialize(source)?;
        self.system = Some(system);
        self.state = SimulationState::Initialized;
        Ok(())
    }

    /// Use an already-built particle system
    pub fn with_particles(&mut self, system: ParticleSystem) -> Result<()> {
        self.expect_state(SimulationState::Uninitialized, "initialize")?;
        system.validate()?;
        self.system = Some(system);
        self.state = SimulationState::Initialized;
        Ok(())
    }

    /// Run every configured step, writing snapshots to `emitter`
    ///
    /// A simulation runs once. Cancellation or a timeout still counts as
    /// completing; the summary's [`RunOutcome`] says which. Any error moves
    /// the simulation to [`SimulationState::Aborted`].
    pub fn run<W: Write>(&mut self, emitter: &mut SnapshotEmitter<W>) -> Result<RunSummary> {
        self.expect_state(SimulationState::Initialized, "run")?;
        let Some(system) = self.system.as_mut() else {
            return Err(Error::config("simulation has no particles"));
        };
        self.state = SimulationState::Running;
        let result = run_steps_controlled(system, &self.config, &self.backend, emitter, &self.control);
        self.state = match result {
            Ok(_) => SimulationState::Completed,
            Err(_) => SimulationState::Aborted,
        };
        result
    }

    /// Current lifecycle state
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Particle state, once initialized
    pub fn system(&self) -> Option<&ParticleSystem> {
        self.system.as_ref()
    }

    /// Take the particles out, e.g. to save the final state
    pub fn into_system(self) -> Option<ParticleSystem> {
        self.system
    }

    /// Run parameters
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Backend the run steps on
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle that stops the run at the next step boundary
    pub fn cancel_flag(&self) -> CancelFlag {
        self.control.cancel.clone()
    }

    /// Stop the run once `timeout` of wall-clock time has passed
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.control.timeout = Some(timeout);
    }

    fn expect_state(&self, expected: SimulationState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::config(format!(
                "cannot {action} a simulation in state {:?}",
                self.state
            )));
        }
        Ok(())
    }
}
