//! Wall-clock time spent per analysis phase.
//!
//! Phases are wrapped in `timed_scope!`; every run of a phase adds one
//! sample under its label. An analyzer checks many units, so the summary
//! aggregates samples per label. Use a benchmark, not this, to compare
//! implementations.

use serde_derive::Serialize;
use std::{
    fmt,
    io::Write,
    sync::Mutex,
    time::{Duration, Instant},
};

lazy_static::lazy_static! {
    static ref SAMPLES: Mutex<Vec<Sample>> = Mutex::new(Vec::new());
}

#[derive(Debug, Clone)]
struct Sample {
    label: String,
    elapsed: Duration,
}

/// Records one sample for `label` when dropped.
pub struct MeasurementGuard {
    label: String,
    start: Instant,
}

impl MeasurementGuard {
    pub fn start(label: &str) -> Self {
        MeasurementGuard {
            label: label.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for MeasurementGuard {
    fn drop(&mut self) {
        let sample = Sample {
            label: std::mem::replace(&mut self.label, String::new()),
            elapsed: self.start.elapsed(),
        };
        if let Ok(mut samples) = SAMPLES.lock() {
            samples.push(sample);
        }
    }
}

#[macro_export]
macro_rules! timed_scope {
    ($label:expr) => {
        let _measurement = ::compiler_shared::timing::MeasurementGuard::start($label);
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSummary {
    pub label: String,
    pub runs: usize,
    pub total: Duration,
}

/// Aggregated samples, in the order phases first ran.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary(pub Vec<PhaseSummary>);

pub fn summary() -> Summary {
    let samples = match SAMPLES.lock() {
        Ok(samples) => samples.clone(),
        Err(_) => return Summary::default(),
    };
    let mut phases: Vec<PhaseSummary> = vec![];
    for sample in samples {
        match phases.iter_mut().find(|phase| phase.label == sample.label) {
            Some(phase) => {
                phase.runs += 1;
                phase.total += sample.elapsed;
            }
            None => phases.push(PhaseSummary {
                label: sample.label,
                runs: 1,
                total: sample.elapsed,
            }),
        }
    }
    Summary(phases)
}

impl Summary {
    pub fn phase(&self, label: &str) -> Option<&PhaseSummary> {
        self.0.iter().find(|phase| phase.label == label)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), failure::Error> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for phase in &self.0 {
            writeln!(
                f,
                "{: <32} {: >5}x {: >8}ms",
                phase.label,
                phase.runs,
                phase.total.as_millis()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_aggregated_per_label() {
        for _ in 0..3 {
            let _guard = MeasurementGuard::start("timing-test-phase");
        }
        let summary = summary();
        let phase = summary.phase("timing-test-phase").expect("recorded");
        assert!(phase.runs >= 3);

        let mut json = vec![];
        summary.write_json(&mut json).expect("serializable");
        assert!(String::from_utf8_lossy(&json).contains("timing-test-phase"));
        assert!(summary.to_string().contains("timing-test-phase"));
    }
}
