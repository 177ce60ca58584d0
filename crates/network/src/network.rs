//! One rank's assembled network and its driver loop.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use channels::{calcium, IonState};
use exchange::{program_delays, rank_slice, SpikeDetector, SpikeGather};
use populations::{global_neuron_count, NeuronState, Population, RankSlice};
use solver::{step_tick, Solver};
use synapses::{ConnectionTable, SynapseState};
use tracing::{debug, info};

use crate::{NetworkError, Result, SimConfig};

/// Everything one rank owns: the immutable stores, the mutable state, the
/// per-neuron solvers, spike bookkeeping and the two output files.
pub struct Network {
    pub pop: Population,
    pub neurons: NeuronState,
    pub ions: IonState,
    pub conn: ConnectionTable,
    pub syn: SynapseState,
    pub solver: Solver,
    detector: SpikeDetector,
    cfg: SimConfig,
    slice: RankSlice,
    rank: usize,
    v_out: BufWriter<File>,
    s_out: BufWriter<File>,
    // Exchange scratch, reused every millisecond.
    local_spikes: Vec<u32>,
    all_spikes: Vec<u32>,
}

fn create_output(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path).map_err(|source| NetworkError::Output {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

impl Network {
    /// Load the inputs and assemble rank `rank` of `n_ranks`.
    pub fn build(
        cfg: &SimConfig,
        population_csv: &Path,
        connection_csv: &Path,
        out_dir: &Path,
        rank: usize,
        n_ranks: usize,
    ) -> Result<Self> {
        let global_n = global_neuron_count(population_csv)?;
        let slice = rank_slice(global_n, n_ranks, rank)?;

        let pop = Population::load(population_csv, slice, cfg.all_active)?;
        let neurons = NeuronState::new(&pop, calcium::ca_init());
        let ions = IonState::new(&neurons);
        let conn = ConnectionTable::load(connection_csv, &pop, &neurons, slice, global_n, cfg.dt)?;
        let syn = SynapseState::new(&conn);
        let solver = Solver::new(&pop);
        let detector = SpikeDetector::new(neurons.n_neurons(), cfg.spike_threshold);

        info!(
            rank,
            n_ranks,
            neurons = neurons.n_neurons(),
            populations = pop.n_popl(),
            connections = conn.n_conn() / 2,
            "rank assembled"
        );

        Ok(Network {
            pop,
            neurons,
            ions,
            conn,
            syn,
            solver,
            detector,
            cfg: *cfg,
            slice,
            rank,
            v_out: create_output(out_dir, &format!("v{rank}.dat"))?,
            s_out: create_output(out_dir, &format!("s{rank}.dat"))?,
            local_spikes: Vec::new(),
            all_spikes: Vec::new(),
        })
    }

    /// Run the full simulation, exchanging spikes through `gather`.
    ///
    /// `current` maps `(t_ms, global_neuron_id)` to the injected current at
    /// the soma; the global ID keeps the waveform independent of the rank
    /// decomposition.
    pub fn run<F>(&mut self, gather: &mut dyn SpikeGather, current: &F) -> Result<()>
    where
        F: Fn(f64, usize) -> f64 + Sync + ?Sized,
    {
        let inv_dt = self.cfg.ticks_per_ms();
        let timer = Instant::now();

        for tick in 0..self.cfg.n_ticks() {
            let t = tick as f64 * self.cfg.dt;

            self.write_v_row(t)?;
            for i in 0..self.neurons.n_neurons() {
                self.neurons.i_ext[self.neurons.sid[i]] = current(t, self.slice.offset + i);
            }

            step_tick(
                &self.pop,
                &mut self.neurons,
                &mut self.ions,
                &self.conn,
                &mut self.syn,
                &mut self.solver,
                self.cfg.dt,
            );
            self.detector.observe(&self.neurons);

            if tick % inv_dt == 0 {
                debug!(rank = self.rank, "t = {t}");
                self.detector.drain(self.slice.offset, &mut self.local_spikes);
                for &gid in &self.local_spikes {
                    writeln!(self.s_out, "{t:.6} {gid}").map_err(NetworkError::from_io)?;
                }
                // Shift the registers before programming, so a delay of d
                // delivers exactly d ms after this boundary.
                self.syn.delay_tick();
                gather.allgather(&self.local_spikes, &mut self.all_spikes)?;
                program_delays(&self.all_spikes, &self.conn, &mut self.syn);
            }
        }

        self.v_out.flush().map_err(NetworkError::from_io)?;
        self.s_out.flush().map_err(NetworkError::from_io)?;
        info!(
            rank = self.rank,
            elapsed_s = timer.elapsed().as_secs_f64(),
            "run complete"
        );
        Ok(())
    }

    /// Write one `t v0 v1 …` row of pre-step soma voltages, failing on the
    /// first NaN.
    fn write_v_row(&mut self, t: f64) -> Result<()> {
        write!(self.v_out, "{t:.6}").map_err(NetworkError::from_io)?;
        for i in 0..self.neurons.n_neurons() {
            let v = self.neurons.soma_v(i);
            if v.is_nan() {
                return Err(NetworkError::NanVoltage { neuron: i, t });
            }
            write!(self.v_out, " {v:.6}").map_err(NetworkError::from_io)?;
        }
        writeln!(self.v_out).map_err(NetworkError::from_io)
    }
}
