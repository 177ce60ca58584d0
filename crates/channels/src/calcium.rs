//! Somatic calcium pool.
//!
//! HVA and LVA Ca²⁺ currents feed a sub-membrane shell whose concentration
//! relaxes back to the resting level; the concentration in turn sets the
//! calcium reversal potential (Nernst) and the SK activation.

use crate::{gate, gbar};

/// Extracellular calcium, mM.
pub const CA_OUT: f64 = 2.0;
/// Faraday constant, s·A/mol.
pub const FARADAY: f64 = 9.6485e4;
/// Gas constant, J/(K·mol).
pub const GAS_CONSTANT: f64 = 8.31446261815324;
/// Resting (and minimum) calcium concentration, mM.
pub const CA_MIN: f64 = 1e-4;
/// Sub-membrane shell depth, cm (0.1 µm).
pub const SHELL_DEPTH: f64 = 0.1e-4;

const CELSIUS: f64 = 34.0;

/// Initial calcium concentration, mM.
pub fn ca_init() -> f64 {
    CA_MIN
}

/// Calcium reversal potential in mV at concentration `ca` (Nernst, z = 2).
pub fn reversal(ca: f64) -> f64 {
    1000.0 * (GAS_CONSTANT * (273.0 + CELSIUS) / (2.0 * FARADAY)) * (CA_OUT / ca).ln()
}

/// `d[Ca]/dt` for calcium current density `i_ca` with buffer fraction
/// `gamma` and decay constant `decay` (ms). A zero decay constant marks a
/// population without calcium buffering (passive-only parameter files);
/// the restoring term is skipped so the pool holds its resting value.
pub fn dca_dt(ca: f64, i_ca: f64, gamma: f64, decay: f64) -> f64 {
    let influx = -1e4 * (i_ca * gamma / (2.0 * FARADAY * SHELL_DEPTH * 1e4));
    if decay == 0.0 {
        influx
    } else {
        influx - (ca - CA_MIN) / decay
    }
}

/// Forward-Euler advance of one neuron's somatic calcium.
#[allow(clippy::too_many_arguments)]
pub fn advance(ca: &mut f64, v: f64, gates: &[f64], gbar_soma: &[f64], area: f64, gamma: f64, decay: f64, dt: f64) {
    let g_ca = gbar_soma[gbar::CAHVA]
        * gates[gate::M_CAHVA]
        * gates[gate::M_CAHVA]
        * gates[gate::H_CAHVA]
        + gbar_soma[gbar::CALVA]
            * gates[gate::M_CALVA]
            * gates[gate::M_CALVA]
            * gates[gate::H_CALVA];
    let i_ca = 1e-3 * (v - reversal(*ca)) * g_ca / area;
    *ca += dt * dca_dt(*ca, i_ca, gamma, decay);
}
