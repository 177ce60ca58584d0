//! One-time construction of the per-neuron linear systems.
//!
//! For each population the dense compartment-coupling matrix is built once
//! from the morphology (off-diagonals are the axial conductances along
//! parent edges, diagonals the row sums) and then reduced to Hines form
//! for every neuron of the population.

use ndarray::Array2;
use populations::Population;

use crate::hines::LinSys;

/// All per-neuron linear systems of the local rank, in neuron order.
#[derive(Debug, Clone)]
pub struct Solver {
    pub linsys: Vec<LinSys>,
}

impl Solver {
    pub fn new(pop: &Population) -> Self {
        let mut linsys = Vec::with_capacity(pop.total_neurons());

        for pid in 0..pop.n_popl() {
            let n = pop.n_comp[pid];
            let range = pop.comp_range(pid);
            let rad = &pop.rad[range.clone()];
            let len = &pop.len[range.clone()];
            let ra = &pop.ra[range.clone()];
            let parent = &pop.parent[range];

            // Dense coupling matrix of the population template.
            let mut m = Array2::<f64>::zeros((n, n));
            for i in 0..n {
                let d = parent[i];
                if d >= 0 {
                    let d = d as usize;
                    let r = 2.0
                        / (ra[i] * len[i] / (rad[i] * rad[i] * std::f64::consts::PI)
                            + ra[d] * len[d] / (rad[d] * rad[d] * std::f64::consts::PI));
                    m[[i, d]] = r;
                    m[[d, i]] = r;
                }
            }
            for i in 0..n {
                let row_sum: f64 = (0..n).filter(|&j| j != i).map(|j| m[[i, j]]).sum();
                m[[i, i]] = row_sum;
            }

            for _ in 0..pop.n_neuron[pid] {
                let mut sys = LinSys::new(parent);
                for k in 0..n {
                    sys.h.base_ad[k] = m[[k, k]];
                    sys.h.base_api[k] = if parent[k] >= 0 {
                        -m[[parent[k] as usize, k]]
                    } else {
                        0.0
                    };
                }
                sys.h.reset();
                linsys.push(sys);
            }
        }

        Solver { linsys }
    }
}

/// Hand-built two-compartment population (soma + one dendrite), bypassing
/// the file loaders. Shared by solver unit tests.
#[cfg(test)]
pub(crate) fn two_comp_population() -> Population {
    use populations::CompartmentKind;

    let area = [4.0 * std::f64::consts::PI * 1.0e-6, 2.0e-6];
    Population {
        rad: vec![10.0e-4, 1.0e-4],
        len: vec![20.0e-4, 100.0e-4],
        area: area.to_vec(),
        parent: vec![-1, 0],
        kind: vec![CompartmentKind::Soma, CompartmentKind::Dend],
        cm: area.iter().map(|a| 1.0 * a).collect(),
        ra: vec![0.1, 0.1],
        gl: area.iter().map(|a| 1e-4 * a * 1e3).collect(),
        vl: vec![-65.0, -65.0],
        n_neuron: vec![2],
        n_comp: vec![2],
        cid: vec![0, 2],
        gbar: vec![0.0; populations::params::N_GBAR],
        all_active: false,
        gamma: vec![0.0; populations::N_COMPTYPE],
        decay: vec![0.0; populations::N_COMPTYPE],
        start_pid: 0,
        end_pid: 0,
    }
}
