//! Threshold-crossing detection.
//!
//! Detection runs every Δt and accumulates into per-neuron flags; the
//! millisecond boundary drains the flags. A neuron spikes when its soma
//! voltage crosses the threshold from below between consecutive ticks.

use populations::NeuronState;

#[derive(Debug, Clone)]
pub struct SpikeDetector {
    threshold: f64,
    v_prev: Vec<f64>,
    spiked: Vec<bool>,
}

impl SpikeDetector {
    /// Previous voltages start just below threshold, so a neuron already
    /// above threshold at t = 0 registers one initial spike.
    pub fn new(n_neurons: usize, threshold: f64) -> Self {
        SpikeDetector {
            threshold,
            v_prev: vec![threshold - 1.0; n_neurons],
            spiked: vec![false; n_neurons],
        }
    }

    /// Record upward crossings for this tick.
    pub fn observe(&mut self, neurons: &NeuronState) {
        for i in 0..neurons.n_neurons() {
            let v = neurons.soma_v(i);
            if self.v_prev[i] <= self.threshold && v > self.threshold {
                self.spiked[i] = true;
            }
            self.v_prev[i] = v;
        }
    }

    /// Collect the flagged neurons as global IDs into `out` (ascending, the
    /// rank's IDs are contiguous) and clear the flags for the next window.
    pub fn drain(&mut self, global_offset: usize, out: &mut Vec<u32>) {
        out.clear();
        for (i, s) in self.spiked.iter_mut().enumerate() {
            if *s {
                out.push((global_offset + i) as u32);
                *s = false;
            }
        }
    }
}
