use std::collections::HashMap;

use crate::foundation::error::{TrialkitError, TrialkitResult};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TimerState {
    running_since: Option<f64>,
    accumulated_ms: f64,
}

/// Named stopwatches driven by the engine clock.
///
/// The clock is the sum of clamped frame deltas, so elapsed times agree with what actions saw.
/// A stopped timer keeps its accumulated time until restarted or removed.
#[derive(Clone, Debug, Default)]
pub struct Timers {
    now_ms: f64,
    timers: HashMap<String, TimerState>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub(crate) fn set_now(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }

    /// Start a new timer or resume a stopped one.
    pub fn start(&mut self, name: &str) -> TrialkitResult<()> {
        let now = self.now_ms;
        let timer = self.timers.entry(name.to_owned()).or_default();
        if timer.running_since.is_some() {
            return Err(TrialkitError::configuration(format!(
                "timer '{name}' is already running"
            )));
        }
        timer.running_since = Some(now);
        Ok(())
    }

    /// Stop a running timer, keeping its elapsed time. Stopping a stopped timer is a no-op.
    pub fn stop(&mut self, name: &str) -> TrialkitResult<()> {
        let now = self.now_ms;
        let timer = self.get_mut(name)?;
        if let Some(since) = timer.running_since.take() {
            timer.accumulated_ms += now - since;
        }
        Ok(())
    }

    /// Reset to zero and start running, creating the timer if needed.
    pub fn restart(&mut self, name: &str) {
        self.timers.insert(
            name.to_owned(),
            TimerState {
                running_since: Some(self.now_ms),
                accumulated_ms: 0.0,
            },
        );
    }

    pub fn elapsed_ms(&self, name: &str) -> TrialkitResult<f64> {
        let timer = self
            .timers
            .get(name)
            .ok_or_else(|| not_found(name))?;
        let running = timer.running_since.map_or(0.0, |since| self.now_ms - since);
        Ok(timer.accumulated_ms + running)
    }

    pub fn is_running(&self, name: &str) -> TrialkitResult<bool> {
        self.timers
            .get(name)
            .map(|t| t.running_since.is_some())
            .ok_or_else(|| not_found(name))
    }

    pub fn remove(&mut self, name: &str) -> TrialkitResult<()> {
        self.timers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.timers.contains_key(name)
    }

    fn get_mut(&mut self, name: &str) -> TrialkitResult<&mut TimerState> {
        self.timers.get_mut(name).ok_or_else(|| not_found(name))
    }
}

fn not_found(name: &str) -> TrialkitError {
    TrialkitError::not_found(format!("no timer named '{name}'"))
}
