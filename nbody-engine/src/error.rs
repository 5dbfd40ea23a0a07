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
//! Error types for the simulation core
//!
//! Every fatal condition in the engine is reported through [`Error`]. There is
//! no variant for numerical degeneracy: coincident or very close particles are
//! absorbed by the softening term in the force kernel.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by initialization, loading and the step loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run parameters or particle data. Raised before any step runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The particle input did not parse as declared.
    #[error("malformed input{}: {message}", particle_context(.particle))]
    MalformedInput {
        /// Index of the particle record being parsed, when known
        particle: Option<usize>,
        /// What was wrong with the input
        message: String,
    },

    /// The snapshot sink could not be opened or rejected a write. The run stops.
    #[error("failed to write snapshot{}: {source}", step_context(.step))]
    SinkWrite {
        /// Step whose snapshot could not be written; `None` if the sink failed
        /// before the first step
        step: Option<usize>,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while opening or reading an input source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn particle_context(particle: &Option<usize>) -> String {
    match particle {
        Some(index) => format!(" (particle {index})"),
        None => String::new(),
    }
}

fn step_context(step: &Option<usize>) -> String {
    match step {
        Some(step) => format!(" at step {step}"),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for a [`Error::Configuration`] with a formatted message.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Shorthand for a [`Error::MalformedInput`].
    pub(crate) fn malformed(particle: Option<usize>, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            particle,
            message: message.into(),
        }
    }

    /// Whether this error was raised while validating parameters or data.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Whether this error came from parsing an input record.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Error::MalformedInput { .. })
    }

    /// Whether this error came from the snapshot sink.
    pub fn is_sink_write(&self) -> bool {
        matches!(self, Error::SinkWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_names_particle() {
        let e = Error::malformed(Some(3), "field 2 is not a number");
        let msg = e.to_string();
        assert!(msg.contains("particle 3"));
        assert!(msg.contains("field 2"));
        assert!(e.is_malformed_input());
    }

    #[test]
    fn malformed_input_without_particle() {
        let e = Error::malformed(None, "empty input");
        assert_eq!(e.to_string(), "malformed input: empty input");
    }

    #[test]
    fn sink_write_reports_step() {
        let e = Error::SinkWrite {
            step: Some(40),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"),
        };
        assert!(e.to_string().contains("step 40"));
        assert!(e.is_sink_write());
    }

    #[test]
    fn io_errors_convert() -> Result<()> {
        let converted: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(converted, Error::Io(_)));
        assert!(Error::config("dt must be positive").is_configuration());
        Ok(())
    }
}
