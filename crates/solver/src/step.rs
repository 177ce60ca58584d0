//! One Crank–Nicolson integration tick for every rank-local neuron.
//!
//! Per tick: the synapse accumulators decay once (globally), then every
//! neuron independently refreshes its matrix with Δt/2, advances its gating
//! variables with Δt, solves the tree system, updates its calcium pool with
//! Δt, and completes the step with `v ← 2b − v`.
//!
//! Neurons are updated in parallel: within a population every neuron spans
//! the same number of compartments, so the state arenas split into exact
//! per-neuron chunks with no aliasing; the only shared reads are the
//! immutable tables and the already-decayed accumulators.

use channels::{advance_gates, calcium, gate, soma, IonState};
use populations::{NeuronState, Population};
use rayon::prelude::*;
use synapses::{ConnectionTable, SynapseState};

use crate::assemble::Solver;
use crate::hines::LinSys;

/// Rebuild one neuron's system for a half step `dt`.
///
/// Diagonal and rhs get the capacitive and leak terms per compartment, the
/// soma row gets the active-channel lhs/rhs, and every incoming synapse adds
/// its conductance at its target compartment.
#[allow(clippy::too_many_arguments)]
fn refresh_matrix(
    sys: &mut LinSys,
    pop: &Population,
    pid: usize,
    id: usize,
    conn: &ConnectionTable,
    sum0: &[f64],
    gates: &[f64],
    v: &[f64],
    ca: &[f64],
    i_ext: &[f64],
    dt: f64,
) {
    let range = pop.comp_range(pid);
    let cm = &pop.cm[range.clone()];
    let gl = &pop.gl[range.clone()];
    let vl = &pop.vl[range];

    sys.h.reset();
    for k in 0..sys.h.n_comp() {
        sys.h.ad[k] += cm[k] / dt + gl[k];
        sys.b[k] = (cm[k] / dt) * v[k] + gl[k] * vl[k] + i_ext[k] * 1e-3;
    }

    let (lhs, rhs) = soma::conductance_terms(pop.gbar_soma(pid), gates, v[0], ca[0]);
    sys.h.ad[0] += lhs;
    sys.b[0] += rhs;

    for j in conn.post_range(id) {
        let g = conn.weight[j] * sum0[j] * 1e-3; // µS -> mS
        sys.h.ad[conn.post_comp[j]] += g;
        sys.b[conn.post_comp[j]] += g * conn.erev[j];
    }
}

/// Advance the whole rank by one Δt.
pub fn step_tick(
    pop: &Population,
    neurons: &mut NeuronState,
    ions: &mut IonState,
    conn: &ConnectionTable,
    syn: &mut SynapseState,
    solver: &mut Solver,
    dt: f64,
) {
    syn.decay(conn);
    let sum0 = &syn.sum0;
    let half_dt = 0.5 * dt;

    let mut comp_base = 0usize;
    let mut neuron_base = 0usize;

    for pid in 0..pop.n_popl() {
        let n_comp = pop.n_comp[pid];
        let n_neuron = pop.n_neuron[pid];
        let span = n_comp * n_neuron;

        let v_pop = &mut neurons.v[comp_base..comp_base + span];
        let ca_pop = &mut neurons.ca[comp_base..comp_base + span];
        let iext_pop = &neurons.i_ext[comp_base..comp_base + span];
        let gate_pop =
            &mut ions.gate[gate::COUNT * neuron_base..gate::COUNT * (neuron_base + n_neuron)];
        let sys_pop = &mut solver.linsys[neuron_base..neuron_base + n_neuron];

        let area_soma = pop.area[pop.cid[pid]];
        let (gamma, ca_decay) = pop.ca_params_soma(pid);
        let gbar_soma = pop.gbar_soma(pid);

        (
            sys_pop.par_iter_mut(),
            v_pop.par_chunks_mut(n_comp),
            ca_pop.par_chunks_mut(n_comp),
            iext_pop.par_chunks(n_comp),
            gate_pop.par_chunks_mut(gate::COUNT),
        )
            .into_par_iter()
            .enumerate()
            .for_each(|(i, (sys, v, ca, i_ext, gates))| {
                let id = neuron_base + i;
                refresh_matrix(sys, pop, pid, id, conn, sum0, gates, v, ca, i_ext, half_dt);
                advance_gates(gates, v[0], ca[0], dt);
                sys.h.solve(&mut sys.b);
                calcium::advance(
                    &mut ca[0],
                    v[0],
                    gates,
                    gbar_soma,
                    area_soma,
                    gamma,
                    ca_decay,
                    dt,
                );
                for (vk, bk) in v.iter_mut().zip(&sys.b) {
                    *vk = 2.0 * bk - *vk;
                }
            });

        comp_base += span;
        neuron_base += n_neuron;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::two_comp_population;

    fn empty_conn() -> ConnectionTable {
        ConnectionTable::from_specs(&[], 2, 0, 0.1)
    }

    fn harness() -> (
        Population,
        NeuronState,
        IonState,
        ConnectionTable,
        SynapseState,
        Solver,
    ) {
        let pop = two_comp_population();
        let neurons = NeuronState::new(&pop, calcium::ca_init());
        let ions = IonState::new(&neurons);
        let conn = empty_conn();
        let syn = SynapseState::new(&conn);
        let solver = Solver::new(&pop);
        (pop, neurons, ions, conn, syn, solver)
    }

    #[test]
    fn passive_cell_at_rest_stays_at_rest() {
        let (pop, mut neurons, mut ions, conn, mut syn, mut solver) = harness();
        for _ in 0..200 {
            step_tick(&pop, &mut neurons, &mut ions, &conn, &mut syn, &mut solver, 0.1);
        }
        for &v in &neurons.v {
            approx::assert_relative_eq!(v, -65.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn refreshed_diagonal_is_positive() {
        let (pop, neurons, ions, conn, syn, mut solver) = harness();
        for (id, sys) in solver.linsys.iter_mut().enumerate() {
            let sid = neurons.sid[id];
            let n_comp = pop.n_comp[neurons.pid[id]];
            refresh_matrix(
                sys,
                &pop,
                neurons.pid[id],
                id,
                &conn,
                &syn.sum0,
                ions.gates(id),
                &neurons.v[sid..sid + n_comp],
                &neurons.ca[sid..sid + n_comp],
                &neurons.i_ext[sid..sid + n_comp],
                0.05,
            );
            for (k, &ad) in sys.h.ad.iter().enumerate() {
                assert!(ad > 0.0, "Ad[{k}] = {ad} not positive");
            }
        }
    }

    #[test]
    fn refreshed_system_solves_to_small_residual() {
        let (pop, neurons, ions, conn, syn, mut solver) = harness();
        let sys = &mut solver.linsys[0];
        refresh_matrix(
            sys,
            &pop,
            0,
            0,
            &conn,
            &syn.sum0,
            ions.gates(0),
            &neurons.v[0..2],
            &neurons.ca[0..2],
            &neurons.i_ext[0..2],
            0.05,
        );
        // Arbitrary rhs, dense residual check.
        sys.b = vec![0.37, -1.21];
        let ad = sys.h.ad.clone();
        let api = sys.h.api.clone();
        let b0 = sys.b.clone();
        sys.h.solve(&mut sys.b);
        let x = &sys.b;
        let r0 = (ad[0] * x[0] + api[1] * x[1] - b0[0]).abs();
        let r1 = (api[1] * x[0] + ad[1] * x[1] - b0[1]).abs();
        assert!(r0.max(r1) < 1e-9, "residual {}", r0.max(r1));
    }

    #[test]
    fn injected_current_depolarizes_toward_the_expected_plateau() {
        let (pop, mut neurons, mut ions, conn, mut syn, mut solver) = harness();
        // Constant current into both somata; run well past tau = cm/gl.
        let i_amp = 0.01;
        for i in 0..neurons.n_neurons() {
            neurons.i_ext[neurons.sid[i]] = i_amp;
        }
        for _ in 0..5000 {
            step_tick(&pop, &mut neurons, &mut ions, &conn, &mut syn, &mut solver, 0.1);
        }
        // Whole-cell plateau: vl + I/(total leak conductance).
        let g_total = pop.gl[0] + pop.gl[1];
        let expected = -65.0 + i_amp * 1e-3 / g_total;
        approx::assert_relative_eq!(neurons.soma_v(0), expected, max_relative = 1e-3);
        approx::assert_relative_eq!(neurons.soma_v(1), expected, max_relative = 1e-3);
    }
}
