//! Static connection table with dual CSR indices.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use populations::csv::clean_csv_line;
use populations::{NeuronState, Population, RankSlice};
use serde::{Deserialize, Serialize};

use crate::{Result, SynapseError};

/// Delay registers are 64-bit; the top bit is reserved by the shift.
const MAX_DELAY_MS: u32 = 62;

/// One line of the connection CSV, as declared by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub pre_id: usize,
    pub post_id: usize,
    pub post_comp: usize,
    /// Peak conductance, µS.
    pub weight: f64,
    pub tau_decay: f64,
    pub tau_rise: f64,
    /// Synaptic reversal potential, mV.
    pub erev: f64,
    /// Transmission delay, whole ms.
    pub delay_ms: u32,
}

/// Immutable connection table for the local rank.
///
/// Solver-order arrays are grouped by postsynaptic local neuron
/// (`ptr_post[i]..ptr_post[i+1]` is neuron i's incoming entries); fan-out
/// arrays are grouped by presynaptic global ID (`ptr_pre[k]..ptr_pre[k+1]`
/// belongs to `pre_table[k]`, which is sorted ascending).
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    // Solver order.
    pub post_comp: Vec<usize>,
    pub weight: Vec<f64>,
    pub erev: Vec<f64>,
    /// Pre-computed per-Δt decay factor `exp(−Δt/τ)`.
    pub decay: Vec<f64>,
    pub ptr_post: Vec<usize>,

    // Fan-out order.
    pub pre_table: Vec<usize>,
    pub ptr_pre: Vec<usize>,
    /// Delay in ms, stored as the bit position to program.
    pub fan_delay_bits: Vec<u32>,
    /// Solver index the fan-out entry kicks.
    pub fan_target: Vec<usize>,
}

fn parse_spec(path: &str, lineno: usize, text: &str) -> Result<ConnectionSpec> {
    let malformed = |message: String| SynapseError::Malformed {
        path: path.to_string(),
        line: lineno,
        message,
    };

    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != 9 {
        return Err(malformed(format!("expected 9 fields, got {}", fields.len())));
    }
    let int = |i: usize| -> Result<usize> {
        fields[i]
            .parse()
            .map_err(|_| malformed(format!("bad integer field {:?}", fields[i])))
    };
    let num = |i: usize| -> Result<f64> {
        fields[i]
            .parse()
            .map_err(|_| malformed(format!("bad numeric field {:?}", fields[i])))
    };

    let delay: i64 = fields[7]
        .parse()
        .map_err(|_| malformed(format!("bad delay field {:?}", fields[7])))?;
    if delay <= 0 || delay > MAX_DELAY_MS as i64 {
        return Err(SynapseError::BadDelay {
            path: path.to_string(),
            line: lineno,
            delay,
        });
    }
    if fields[8].len() != 1 {
        return Err(malformed(format!("bad type tag {:?}", fields[8])));
    }

    let tau_decay = num(4)?;
    let tau_rise = num(5)?;
    if !(tau_rise > 0.0 && tau_decay > tau_rise) {
        return Err(malformed(format!(
            "time constants must satisfy 0 < tau_rise < tau_decay, got rise={tau_rise} decay={tau_decay}"
        )));
    }

    Ok(ConnectionSpec {
        pre_id: int(0)?,
        post_id: int(1)?,
        post_comp: int(2)?,
        weight: num(3)?,
        tau_decay,
        tau_rise,
        erev: num(6)?,
        delay_ms: delay as u32,
    })
}

/// Normalisation making the difference of exponentials peak at the declared
/// weight: `1 / (r^(τ*/τ_d) − r^(τ*/τ_r))` with `r = τ_r/τ_d` and
/// `τ* = τ_r·τ_d/(τ_d − τ_r)`.
pub fn peak_normalisation(tau_decay: f64, tau_rise: f64) -> f64 {
    let tau_prime = tau_decay * tau_rise / (tau_decay - tau_rise);
    let ratio = tau_rise / tau_decay;
    1.0 / (ratio.powf(tau_prime / tau_decay) - ratio.powf(tau_prime / tau_rise))
}

impl ConnectionTable {
    /// Parse the connection CSV and build both CSR views for the rank owning
    /// `slice`. Presynaptic IDs stay global; rows whose postsynaptic neuron
    /// is not rank-local are dropped.
    pub fn load(
        path: &Path,
        pop: &Population,
        neurons: &NeuronState,
        slice: RankSlice,
        global_n: usize,
        dt: f64,
    ) -> Result<Self> {
        let path_str = path.display().to_string();
        let file = File::open(path).map_err(|source| SynapseError::Io {
            path: path_str.clone(),
            source,
        })?;

        let lo = slice.offset.min(global_n);
        let hi = (slice.offset + slice.count).min(global_n);

        let mut specs = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| SynapseError::Io {
                path: path_str.clone(),
                source,
            })?;
            let Some(text) = clean_csv_line(&line) else { continue };
            let lineno = lineno + 1;
            let spec = parse_spec(&path_str, lineno, &text)?;

            if spec.pre_id >= global_n || spec.post_id >= global_n {
                return Err(SynapseError::Malformed {
                    path: path_str.clone(),
                    line: lineno,
                    message: format!(
                        "neuron id out of range ({} neurons): pre={} post={}",
                        global_n, spec.pre_id, spec.post_id
                    ),
                });
            }
            if spec.post_id < lo || spec.post_id >= hi {
                continue; // another rank owns the postsynaptic side
            }

            let n_comp = pop.n_comp[neurons.pid[spec.post_id - lo]];
            if spec.post_comp >= n_comp {
                return Err(SynapseError::PostCompOutOfRange {
                    path: path_str.clone(),
                    line: lineno,
                    comp: spec.post_comp,
                    n_comp,
                });
            }
            specs.push(spec);
        }

        Ok(Self::from_specs(&specs, neurons.n_neurons(), lo, dt))
    }

    /// Build the table from validated, rank-local specs. `lo` is the first
    /// rank-owned global ID (post IDs are made local with it).
    pub fn from_specs(specs: &[ConnectionSpec], n_post: usize, lo: usize, dt: f64) -> Self {
        // Counting pass: two entries per declared connection on both views.
        let mut post_counts = vec![0usize; n_post];
        let mut pre_counts: std::collections::BTreeMap<usize, usize> = Default::default();
        for spec in specs {
            post_counts[spec.post_id - lo] += 2;
            *pre_counts.entry(spec.pre_id).or_insert(0) += 2;
        }

        let pre_table: Vec<usize> = pre_counts.keys().copied().collect();
        let mut ptr_pre = vec![0usize; pre_table.len() + 1];
        for (k, pre) in pre_table.iter().enumerate() {
            ptr_pre[k + 1] = ptr_pre[k] + pre_counts[pre];
        }
        let mut ptr_post = vec![0usize; n_post + 1];
        for i in 0..n_post {
            ptr_post[i + 1] = ptr_post[i] + post_counts[i];
        }
        let n_conn = ptr_post[n_post];

        let mut table = ConnectionTable {
            post_comp: vec![0; n_conn],
            weight: vec![0.0; n_conn],
            erev: vec![0.0; n_conn],
            decay: vec![0.0; n_conn],
            ptr_post,
            pre_table,
            ptr_pre,
            fan_delay_bits: vec![0; n_conn],
            fan_target: vec![0; n_conn],
        };

        // Placement pass with per-group cursors; input order is free.
        let mut post_cursor = vec![0usize; n_post];
        let mut pre_cursor = vec![0usize; table.pre_table.len()];
        for spec in specs {
            let post = spec.post_id - lo;
            let norm = peak_normalisation(spec.tau_decay, spec.tau_rise);
            let pre_slot = table
                .pre_table
                .binary_search(&spec.pre_id)
                .expect("pre id counted above");

            for (signed_weight, tau) in [
                (norm * spec.weight, spec.tau_decay),
                (-norm * spec.weight, spec.tau_rise),
            ] {
                let solver_id = table.ptr_post[post] + post_cursor[post];
                post_cursor[post] += 1;
                table.post_comp[solver_id] = spec.post_comp;
                table.weight[solver_id] = signed_weight;
                table.erev[solver_id] = spec.erev;
                table.decay[solver_id] = (-dt / tau).exp();

                let fan_id = table.ptr_pre[pre_slot] + pre_cursor[pre_slot];
                pre_cursor[pre_slot] += 1;
                table.fan_delay_bits[fan_id] = spec.delay_ms;
                table.fan_target[fan_id] = solver_id;
            }
        }

        table
    }

    /// Number of internal connection entries (twice the declared count).
    pub fn n_conn(&self) -> usize {
        self.weight.len()
    }

    /// Solver entries targeting local neuron `i`.
    pub fn post_range(&self, i: usize) -> std::ops::Range<usize> {
        self.ptr_post[i]..self.ptr_post[i + 1]
    }

    /// Fan-out entries of `pre_table[k]`.
    pub fn fan_range(&self, k: usize) -> std::ops::Range<usize> {
        self.ptr_pre[k]..self.ptr_pre[k + 1]
    }
}
