//! Somatic ion channel state and kinetics.
//!
//! Each neuron carries 35 gating variables in one dense arena slice: 23
//! continuous gates advanced with a closed-form exponential update under the
//! frozen-voltage assumption, and the 12 occupancies of a Markov sodium
//! channel advanced by an implicit Euler sub-stepper (dense 12×12 solve).
//!
//! Channel set (perisomatic): NaV (Markov), NaTs, NaTa, Nap, Kv2, Kv3, K_P,
//! K_T, Kd, Im, Im_v2, Ih, SK, Ca_HVA, Ca_LVA.

pub mod calcium;
pub mod kinetics;
pub mod markov;
pub mod soma;

use populations::NeuronState;

/// Sodium reversal potential, mV.
pub const E_NA: f64 = 53.0;
/// Potassium reversal potential, mV.
pub const E_K: f64 = -107.0;
/// HCN (Ih) reversal potential, mV.
pub const E_HCN: f64 = -45.0;

/// Gate arena layout: 23 continuous gates, then the 12 NaV states.
pub mod gate {
    pub const M_NATS: usize = 0;
    pub const H_NATS: usize = 1;
    pub const M_NATA: usize = 2;
    pub const H_NATA: usize = 3;
    pub const H_NAP: usize = 4;
    pub const M_KV2: usize = 5;
    pub const H1_KV2: usize = 6;
    pub const H2_KV2: usize = 7;
    pub const M_KV3: usize = 8;
    pub const M_KP: usize = 9;
    pub const H_KP: usize = 10;
    pub const M_KT: usize = 11;
    pub const H_KT: usize = 12;
    pub const M_KD: usize = 13;
    pub const H_KD: usize = 14;
    pub const M_IM: usize = 15;
    pub const M_IMV2: usize = 16;
    pub const M_IH: usize = 17;
    pub const Z_SK: usize = 18;
    pub const M_CAHVA: usize = 19;
    pub const H_CAHVA: usize = 20;
    pub const M_CALVA: usize = 21;
    pub const H_CALVA: usize = 22;

    pub const OO_NAV: usize = 23;
    pub const C1_NAV: usize = 24;
    pub const C2_NAV: usize = 25;
    pub const C3_NAV: usize = 26;
    pub const C4_NAV: usize = 27;
    pub const C5_NAV: usize = 28;
    pub const I1_NAV: usize = 29;
    pub const I2_NAV: usize = 30;
    pub const I3_NAV: usize = 31;
    pub const I4_NAV: usize = 32;
    pub const I5_NAV: usize = 33;
    pub const I6_NAV: usize = 34;

    pub const COUNT: usize = 35;
}

/// Maximal-conductance slot of each channel within a population's gbar table.
pub mod gbar {
    pub const NAV: usize = 0;
    pub const NATS: usize = 1;
    pub const NATA: usize = 2;
    pub const NAP: usize = 3;
    pub const KV2: usize = 4;
    pub const KV3: usize = 5;
    pub const KP: usize = 6;
    pub const KT: usize = 7;
    pub const KD: usize = 8;
    pub const IM: usize = 9;
    pub const IMV2: usize = 10;
    pub const IH: usize = 11;
    pub const SK: usize = 12;
    pub const CAHVA: usize = 13;
    pub const CALVA: usize = 14;

    pub const COUNT: usize = 15;
}

const _: () = assert!(gbar::COUNT == populations::params::N_GBAR);

/// Gating-variable arenas for every rank-local neuron.
#[derive(Debug, Clone)]
pub struct IonState {
    /// `gate::COUNT` values per neuron.
    pub gate: Vec<f64>,
}

impl IonState {
    /// Initialise every neuron's gates to their steady state at the resting
    /// soma voltage and calcium concentration.
    pub fn new(neurons: &NeuronState) -> Self {
        let n = neurons.n_neurons();
        let mut state = IonState {
            gate: vec![0.0; gate::COUNT * n],
        };
        for (i, chunk) in state.gate.chunks_exact_mut(gate::COUNT).enumerate() {
            let sid = neurons.sid[i];
            init_gates(chunk, neurons.v[sid], neurons.ca[sid]);
        }
        state
    }

    /// Gate slice of local neuron `i`.
    pub fn gates(&self, i: usize) -> &[f64] {
        &self.gate[gate::COUNT * i..gate::COUNT * (i + 1)]
    }
}

/// Set all gates of one neuron to their steady state at `(v, ca)`.
pub fn init_gates(gates: &mut [f64], v: f64, ca: f64) {
    use kinetics::*;

    gates[gate::M_NATS] = nats::m_inf(v);
    gates[gate::H_NATS] = nats::h_inf(v);
    gates[gate::M_NATA] = nata::m_inf(v);
    gates[gate::H_NATA] = nata::h_inf(v);
    gates[gate::H_NAP] = nap::h_inf(v);
    gates[gate::M_KV2] = kv2::m_inf(v);
    gates[gate::H1_KV2] = kv2::h_inf(v);
    gates[gate::H2_KV2] = kv2::h_inf(v);
    gates[gate::M_KV3] = kv3::m_inf(v);
    gates[gate::M_KP] = kp::m_inf(v);
    gates[gate::H_KP] = kp::h_inf(v);
    gates[gate::M_KT] = kt::m_inf(v);
    gates[gate::H_KT] = kt::h_inf(v);
    gates[gate::M_KD] = kd::m_inf(v);
    gates[gate::H_KD] = kd::h_inf(v);
    gates[gate::M_IM] = im::m_inf(v);
    gates[gate::M_IMV2] = imv2::m_inf(v);
    gates[gate::M_IH] = ih::m_inf(v);
    gates[gate::Z_SK] = sk::z_inf(v, ca);
    gates[gate::M_CAHVA] = cahva::m_inf(v);
    gates[gate::H_CAHVA] = cahva::h_inf(v);
    gates[gate::M_CALVA] = calva::m_inf(v);
    gates[gate::H_CALVA] = calva::h_inf(v);

    markov::init_states(&mut gates[gate::OO_NAV..], v);
}

/// Advance all gates of one neuron by `dt` at frozen `(v, ca)`.
///
/// Continuous gates use the exact relaxation
/// `x <- x∞ + (x − x∞)·exp(−dt/τ)`; the NaV occupancies take
/// `max(1, dt/0.01)` implicit sub-steps.
pub fn advance_gates(gates: &mut [f64], v: f64, ca: f64, dt: f64) {
    use kinetics::*;

    markov::advance(&mut gates[gate::OO_NAV..], v, dt);

    let relax = |x: f64, inf: f64, tau: f64| inf + (x - inf) * (-dt / tau).exp();

    gates[gate::M_NATS] = relax(gates[gate::M_NATS], nats::m_inf(v), nats::m_tau(v));
    gates[gate::H_NATS] = relax(gates[gate::H_NATS], nats::h_inf(v), nats::h_tau(v));
    gates[gate::M_NATA] = relax(gates[gate::M_NATA], nata::m_inf(v), nata::m_tau(v));
    gates[gate::H_NATA] = relax(gates[gate::H_NATA], nata::h_inf(v), nata::h_tau(v));
    gates[gate::H_NAP] = relax(gates[gate::H_NAP], nap::h_inf(v), nap::h_tau(v));
    gates[gate::M_KV2] = relax(gates[gate::M_KV2], kv2::m_inf(v), kv2::m_tau(v));
    gates[gate::H1_KV2] = relax(gates[gate::H1_KV2], kv2::h_inf(v), kv2::h1_tau(v));
    gates[gate::H2_KV2] = relax(gates[gate::H2_KV2], kv2::h_inf(v), kv2::h2_tau(v));
    gates[gate::M_KV3] = relax(gates[gate::M_KV3], kv3::m_inf(v), kv3::m_tau(v));
    gates[gate::M_KP] = relax(gates[gate::M_KP], kp::m_inf(v), kp::m_tau(v));
    gates[gate::H_KP] = relax(gates[gate::H_KP], kp::h_inf(v), kp::h_tau(v));
    gates[gate::M_KT] = relax(gates[gate::M_KT], kt::m_inf(v), kt::m_tau(v));
    gates[gate::H_KT] = relax(gates[gate::H_KT], kt::h_inf(v), kt::h_tau(v));
    gates[gate::M_KD] = relax(gates[gate::M_KD], kd::m_inf(v), kd::m_tau(v));
    gates[gate::H_KD] = relax(gates[gate::H_KD], kd::h_inf(v), kd::h_tau(v));
    gates[gate::M_IM] = relax(gates[gate::M_IM], im::m_inf(v), im::m_tau(v));
    gates[gate::M_IMV2] = relax(gates[gate::M_IMV2], imv2::m_inf(v), imv2::m_tau(v));
    gates[gate::M_IH] = relax(gates[gate::M_IH], ih::m_inf(v), ih::m_tau(v));
    gates[gate::Z_SK] = relax(gates[gate::Z_SK], sk::z_inf(v, ca), sk::z_tau(v));
    gates[gate::M_CAHVA] = relax(gates[gate::M_CAHVA], cahva::m_inf(v), cahva::m_tau(v));
    gates[gate::H_CAHVA] = relax(gates[gate::H_CAHVA], cahva::h_inf(v), cahva::h_tau(v));
    gates[gate::M_CALVA] = relax(gates[gate::M_CALVA], calva::m_inf(v), calva::m_tau(v));
    gates[gate::H_CALVA] = relax(gates[gate::H_CALVA], calva::h_inf(v), calva::h_tau(v));
}

#[cfg(test)]
mod tests {
    use super::*;

    const N_CONTINUOUS: usize = 23;

    #[test]
    fn steady_state_gates_are_probabilities() {
        let mut gates = [0.0; gate::COUNT];
        for v in [-90.0, -65.0, -40.0, 0.0, 40.0] {
            init_gates(&mut gates, v, calcium::CA_MIN);
            for (k, &x) in gates.iter().enumerate() {
                assert!(
                    (0.0..=1.0).contains(&x),
                    "gate {k} out of range at v={v}: {x}"
                );
            }
        }
    }

    #[test]
    fn gates_stay_bounded_under_integration() {
        let mut gates = [0.0; gate::COUNT];
        init_gates(&mut gates, -65.0, calcium::CA_MIN);
        // A crude voltage excursion: depolarize hard, then repolarize.
        for step in 0..400 {
            let v = if step < 200 { 20.0 } else { -80.0 };
            advance_gates(&mut gates, v, calcium::CA_MIN, 0.1);
            for (k, &x) in gates.iter().enumerate() {
                assert!(
                    (-1e-9..=1.0 + 1e-9).contains(&x),
                    "gate {k} escaped [0,1] at step {step}: {x}"
                );
            }
        }
    }

    #[test]
    fn continuous_gates_follow_the_closed_form() {
        let mut gates = [0.0; gate::COUNT];
        init_gates(&mut gates, -65.0, calcium::CA_MIN);
        let before = gates;
        let (v, dt) = (-50.0, 0.1);
        advance_gates(&mut gates, v, calcium::CA_MIN, dt);

        // Spot-check the exact relaxation for a fast and a slow gate.
        let expect = |x0: f64, inf: f64, tau: f64| inf + (x0 - inf) * (-dt / tau).exp();
        approx::assert_relative_eq!(
            gates[gate::M_NATS],
            expect(
                before[gate::M_NATS],
                kinetics::nats::m_inf(v),
                kinetics::nats::m_tau(v)
            ),
            max_relative = 1e-12
        );
        approx::assert_relative_eq!(
            gates[gate::H_KD],
            expect(
                before[gate::H_KD],
                kinetics::kd::h_inf(v),
                kinetics::kd::h_tau(v)
            ),
            max_relative = 1e-12
        );
    }

    #[test]
    fn gates_at_steady_state_stay_put() {
        let mut gates = [0.0; gate::COUNT];
        init_gates(&mut gates, -65.0, calcium::CA_MIN);
        let before = gates;
        advance_gates(&mut gates, -65.0, calcium::CA_MIN, 0.1);
        for k in 0..N_CONTINUOUS {
            approx::assert_relative_eq!(gates[k], before[k], max_relative = 1e-9);
        }
        // The Markov block sits at its nullspace too.
        for k in N_CONTINUOUS..gate::COUNT {
            approx::assert_relative_eq!(gates[k], before[k], epsilon = 1e-9);
        }
    }
}
