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
//! Periodic snapshot output
//!
//! [`SnapshotEmitter`] wraps the sink a run writes its time series to. Each
//! snapshot is one record line in the format of [`crate::format`]. A failed
//! write is returned immediately as [`Error::SinkWrite`] carrying the step
//! number; nothing is buffered for retry, and the step loop stops.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::write_record;
use crate::particles::ParticleSystem;

/// Writes full particle state to a sink, one line per snapshot
///
/// # Examples
///
/// ```
/// use nbody_engine::particles::ParticleSystem;
/// use nbody_engine::snapshot::SnapshotEmitter;
///
/// let system = ParticleSystem::preset_init("binary").unwrap();
/// let mut emitter = SnapshotEmitter::new(Vec::new());
/// emitter.emit(0, &system).unwrap();
/// assert_eq!(emitter.written(), 1);
/// assert!(emitter.into_inner().starts_with(b"2\t"));
/// ```
#[derive(Debug)]
pub struct SnapshotEmitter<W: Write> {
    sink: W,
    written: usize,
}

impl<W: Write> SnapshotEmitter<W> {
    /// Emit snapshots into `sink`
    pub fn new(sink: W) -> Self {
        SnapshotEmitter { sink, written: 0 }
    }

    /// Serialize `system` as the snapshot for `step`
    pub fn emit(&mut self, step: usize, system: &ParticleSystem) -> Result<()> {
        write_record(&mut self.sink, system).map_err(|source| sink_error(step, source))?;
        self.written += 1;
        log::trace!("wrote snapshot {} at step {step}", self.written);
        Ok(())
    }

    /// Flush buffered output; `step` is the last step of the run
    pub fn flush(&mut self, step: usize) -> Result<()> {
        self.sink.flush().map_err(|source| sink_error(step, source))
    }

    /// Snapshots written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Recover the sink
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl SnapshotEmitter<BufWriter<File>> {
    /// Create (or truncate) a snapshot file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::SinkWrite { step: None, source })?;
        log::info!("writing snapshots to {}", path.display());
        Ok(SnapshotEmitter::new(BufWriter::new(file)))
    }
}

fn sink_error(step: usize, source: io::Error) -> Error {
    log::error!("snapshot sink failed at step {step}: {source}");
    Error::SinkWrite {
        step: Some(step),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Mass, Position, Velocity};

    /// Sink that accepts `budget` bytes and then fails every write
    struct FailingSink {
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn one_particle() -> ParticleSystem {
        let mut system = ParticleSystem::new();
        system.push(Mass::new(1.0), Position::new(1.0, 2.0, 3.0), Velocity::zero());
        system
    }

    #[test]
    fn test_one_line_per_snapshot() {
        let system = one_particle();
        let mut emitter = SnapshotEmitter::new(Vec::new());
        emitter.emit(0, &system).unwrap();
        emitter.emit(5, &system).unwrap();
        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_write_failure_reports_step() {
        let mut emitter = SnapshotEmitter::new(FailingSink { budget: 0 });
        let err = emitter.emit(30, &one_particle()).unwrap_err();
        match err {
            Error::SinkWrite { step, .. } => assert_eq!(step, Some(30)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(emitter.written(), 0);
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let err = SnapshotEmitter::create("/nonexistent-dir/for/snapshots.tsv").unwrap_err();
        assert!(err.is_sink_write());
    }
}
