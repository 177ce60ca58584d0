//! Simulation configuration.
//!
//! These were compile-time constants in early versions; they are plain data
//! now so tests and the CLI can inject them, with defaults preserving the
//! historical values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimConfig {
    /// Integration step, ms.
    pub dt: f64,
    /// Simulated duration, ms.
    pub t_stop: f64,
    /// Spike detection threshold, mV.
    pub spike_threshold: f64,
    /// Per-compartment maximal conductances instead of perisomatic.
    pub all_active: bool,
    /// Injected step-current amplitude.
    pub i_amp: f64,
    /// Step-current onset, ms.
    pub i_delay: f64,
    /// Step-current duration, ms.
    pub i_duration: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            dt: 0.1,
            t_stop: 2000.0,
            spike_threshold: -15.0,
            all_active: false,
            i_amp: 0.12,
            i_delay: 500.0,
            i_duration: 1000.0,
        }
    }
}

impl SimConfig {
    /// Integration ticks per millisecond (the spike-exchange cadence).
    pub fn ticks_per_ms(&self) -> usize {
        (1.0 / self.dt).round() as usize
    }

    /// Total tick count for the run.
    pub fn n_ticks(&self) -> usize {
        (self.t_stop / self.dt).round() as usize
    }

    /// The default injected-current waveform: a step of `i_amp` during
    /// `[i_delay, i_delay + i_duration)`, identical for every neuron.
    pub fn step_current(&self) -> impl Fn(f64, usize) -> f64 + Sync + '_ {
        move |t, _global_id| {
            if self.i_delay <= t && t < self.i_delay + self.i_duration {
                self.i_amp
            } else {
                0.0
            }
        }
    }
}
