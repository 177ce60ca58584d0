//! Mutable per-compartment simulation state.

use crate::Population;

/// Voltage, calcium and injected current for every rank-local compartment,
/// plus the soma offset and owning population of every rank-local neuron.
///
/// All compartments of neuron `i` occupy the contiguous arena slice
/// `sid[i] .. sid[i] + n_comp[pid[i]]`.
#[derive(Debug, Clone)]
pub struct NeuronState {
    /// Membrane voltage, mV.
    pub v: Vec<f64>,
    /// Somatic calcium concentration, mM.
    pub ca: Vec<f64>,
    /// Injected current.
    pub i_ext: Vec<f64>,
    /// Arena offset of each neuron's soma compartment.
    pub sid: Vec<usize>,
    /// Local population index of each neuron.
    pub pid: Vec<usize>,
}

impl NeuronState {
    /// Allocate and initialise state for every neuron of `pop`:
    /// `v(0) = vl`, `ca(0) = ca_init`, no injected current.
    pub fn new(pop: &Population, ca_init: f64) -> Self {
        let nc: usize = (0..pop.n_popl())
            .map(|p| pop.n_neuron[p] * pop.n_comp[p])
            .sum();
        let n_neuron = pop.total_neurons();

        let mut state = NeuronState {
            v: vec![0.0; nc],
            ca: vec![ca_init; nc],
            i_ext: vec![0.0; nc],
            sid: Vec::with_capacity(n_neuron),
            pid: Vec::with_capacity(n_neuron),
        };

        let mut offset = 0;
        for pid in 0..pop.n_popl() {
            let n_comp = pop.n_comp[pid];
            let vl = &pop.vl[pop.comp_range(pid)];
            for _ in 0..pop.n_neuron[pid] {
                state.sid.push(offset);
                state.pid.push(pid);
                state.v[offset..offset + n_comp].copy_from_slice(vl);
                offset += n_comp;
            }
        }

        state
    }

    /// Number of rank-local neurons.
    pub fn n_neurons(&self) -> usize {
        self.sid.len()
    }

    /// Soma voltage of local neuron `i`.
    pub fn soma_v(&self, i: usize) -> f64 {
        self.v[self.sid[i]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::RankSlice;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn state_tiles_the_arena_per_neuron() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "cell.swc",
            "0 1 0.0 0.0 0.0 10.0 -1\n1 2 -30.0 0.0 0.0 0.5 0\n",
        );
        write_file(
            dir.path(),
            "cell.ion",
            "1,1.0,100.0,3e-5,-65.0\n2,1.0,100.0,3e-5,-70.0\n",
        );
        write_file(dir.path(), "populations.csv", "2,2,cells,cell.swc,cell.ion\n");

        let pop = Population::load(&dir.path().join("populations.csv"), RankSlice::whole(2), false)
            .unwrap();
        let state = NeuronState::new(&pop, 1e-4);

        assert_eq!(state.n_neurons(), 2);
        assert_eq!(state.sid, vec![0, 2]);
        assert_eq!(state.pid, vec![0, 0]);
        // Each compartment starts at its own leak reversal.
        assert_eq!(state.v, vec![-65.0, -70.0, -65.0, -70.0]);
        assert!(state.ca.iter().all(|&c| c == 1e-4));
    }
}
