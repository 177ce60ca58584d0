//! The immutable per-compartment population store.
//!
//! One `Population` holds every population owned by the local rank, laid out
//! as flat arenas indexed by `cid[pid] + compartment`. Compartment offsets
//! are computed from the declared compartment bounds in the population CSV;
//! the true per-population counts come from the SWC reconstruction and may
//! be smaller, leaving unused capacity between populations.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::csv::clean_csv_line;
use crate::params::{read_param_file, N_GBAR};
use crate::swc::SegmentTree;
use crate::{CompartmentKind, PopulationError, Result, N_COMPTYPE};

/// Contiguous range of global neuron IDs owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSlice {
    /// First owned global neuron ID.
    pub offset: usize,
    /// Maximum number of owned neurons (`ceil(global / ranks)`).
    pub count: usize,
}

impl RankSlice {
    /// The whole network on a single rank.
    pub fn whole(global_n: usize) -> Self {
        RankSlice {
            offset: 0,
            count: global_n,
        }
    }
}

/// One line of the population CSV.
#[derive(Debug, Clone)]
struct PopulationSpec {
    n_neuron: usize,
    n_comp: usize,
    name: String,
    swc_path: PathBuf,
    ion_path: PathBuf,
}

/// Immutable store for all rank-local populations.
#[derive(Debug, Clone)]
pub struct Population {
    // Morphology, cm and cm².
    pub rad: Vec<f64>,
    pub len: Vec<f64>,
    pub area: Vec<f64>,
    /// Parent compartment within the template, −1 for the soma.
    pub parent: Vec<i32>,
    pub kind: Vec<CompartmentKind>,

    // Passive membrane, pre-scaled by area where appropriate:
    // cm [µF], ra, gl [mS], vl [mV].
    pub cm: Vec<f64>,
    pub ra: Vec<f64>,
    pub gl: Vec<f64>,
    pub vl: Vec<f64>,

    // Per-population sizes; `cid` is the cumulative compartment offset
    // (declared capacities), length n_popl + 1.
    pub n_neuron: Vec<usize>,
    pub n_comp: Vec<usize>,
    pub cid: Vec<usize>,

    /// Maximal conductances [mS], area-scaled. Perisomatic layout is
    /// `N_GBAR` per population; all-active is `N_GBAR` per compartment.
    pub gbar: Vec<f64>,
    pub all_active: bool,

    // Calcium buffer parameters, `N_COMPTYPE` per population.
    pub gamma: Vec<f64>,
    pub decay: Vec<f64>,

    /// Global population index range owned locally (inclusive).
    pub start_pid: usize,
    pub end_pid: usize,
}

fn read_population_csv(path: &Path) -> Result<Vec<PopulationSpec>> {
    let path_str = path.display().to_string();
    let file = File::open(path).map_err(|source| PopulationError::Io {
        path: path_str.clone(),
        source,
    })?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let resolve = |p: &str| -> PathBuf {
        let p = Path::new(p);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
        }
    };

    let mut specs = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| PopulationError::Io {
            path: path_str.clone(),
            source,
        })?;
        let Some(text) = clean_csv_line(&line) else { continue };
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != 5 {
            return Err(PopulationError::Malformed {
                path: path_str.clone(),
                line: lineno + 1,
                message: format!("expected 5 fields, got {}", fields.len()),
            });
        }
        let malformed = |message: String| PopulationError::Malformed {
            path: path_str.clone(),
            line: lineno + 1,
            message,
        };
        specs.push(PopulationSpec {
            n_neuron: fields[0]
                .parse()
                .map_err(|_| malformed(format!("bad neuron count {:?}", fields[0])))?,
            n_comp: fields[1]
                .parse()
                .map_err(|_| malformed(format!("bad compartment bound {:?}", fields[1])))?,
            name: fields[2].to_string(),
            swc_path: resolve(fields[3]),
            ion_path: resolve(fields[4]),
        });
    }
    Ok(specs)
}

/// Total neuron count across all populations in the CSV, before any rank
/// decomposition.
pub fn global_neuron_count(path: &Path) -> Result<usize> {
    Ok(read_population_csv(path)?.iter().map(|s| s.n_neuron).sum())
}

impl Population {
    /// Load the populations overlapping `slice` from the population CSV.
    pub fn load(path: &Path, slice: RankSlice, all_active: bool) -> Result<Self> {
        let specs = read_population_csv(path)?;
        let global_n: usize = specs.iter().map(|s| s.n_neuron).sum();
        let lo = slice.offset.min(global_n);
        let hi = (slice.offset + slice.count).min(global_n);

        // Populations overlapping the owned global-ID range, and the number
        // of neurons each contributes locally.
        let mut start_pid = None;
        let mut end_pid = 0;
        let mut local_counts = Vec::new();
        let mut acc = 0usize;
        for (pid, spec) in specs.iter().enumerate() {
            let pop_lo = acc;
            let pop_hi = acc + spec.n_neuron;
            acc = pop_hi;
            let overlap = pop_hi.min(hi).saturating_sub(pop_lo.max(lo));
            if overlap > 0 {
                if start_pid.is_none() {
                    start_pid = Some(pid);
                }
                end_pid = pid;
                local_counts.push(overlap);
            }
        }
        let start_pid = start_pid.unwrap_or(0);
        let local: &[PopulationSpec] = if local_counts.is_empty() {
            &[]
        } else {
            &specs[start_pid..=end_pid]
        };

        let mut cid = vec![0usize; local.len() + 1];
        for (i, spec) in local.iter().enumerate() {
            cid[i + 1] = cid[i] + spec.n_comp;
        }
        let nc = cid[local.len()];

        let mut pop = Population {
            rad: vec![0.0; nc],
            len: vec![0.0; nc],
            area: vec![0.0; nc],
            parent: vec![-1; nc],
            kind: vec![CompartmentKind::Soma; nc],
            cm: vec![0.0; nc],
            ra: vec![0.0; nc],
            gl: vec![0.0; nc],
            vl: vec![0.0; nc],
            n_neuron: local_counts,
            n_comp: local.iter().map(|s| s.n_comp).collect(),
            cid,
            gbar: vec![0.0; if all_active { nc * N_GBAR } else { local.len() * N_GBAR }],
            all_active,
            gamma: vec![0.0; local.len() * N_COMPTYPE],
            decay: vec![0.0; local.len() * N_COMPTYPE],
            start_pid,
            end_pid,
        };

        for (lpid, spec) in local.iter().enumerate() {
            pop.load_morphology(lpid, spec)?;
            pop.load_params(lpid, spec)?;
            debug!(
                population = spec.name.as_str(),
                neurons = pop.n_neuron[lpid],
                compartments = pop.n_comp[lpid],
                "population loaded"
            );
        }

        Ok(pop)
    }

    fn load_morphology(&mut self, lpid: usize, spec: &PopulationSpec) -> Result<()> {
        let tree = SegmentTree::from_file(&spec.swc_path)?;
        if tree.len() > spec.n_comp {
            return Err(PopulationError::CompartmentOverflow {
                path: spec.swc_path.display().to_string(),
                declared: spec.n_comp,
                actual: tree.len(),
            });
        }
        self.n_comp[lpid] = tree.len();

        let offset = self.cid[lpid];
        for (i, seg) in tree.segments.iter().enumerate() {
            let g = seg.geometry();
            self.rad[offset + i] = g.rad;
            self.len[offset + i] = g.len;
            self.area[offset + i] = g.area;
            self.parent[offset + i] = seg.parent;
            self.kind[offset + i] = seg.kind;
        }
        Ok(())
    }

    fn load_params(&mut self, lpid: usize, spec: &PopulationSpec) -> Result<()> {
        let lines = read_param_file(&spec.ion_path)?;
        let offset = self.cid[lpid];
        let n_comp = self.n_comp[lpid];

        // Per-type passive values; types without a line stay zero.
        let mut cm = [0.0; N_COMPTYPE];
        let mut ra = [0.0; N_COMPTYPE];
        let mut gl = [0.0; N_COMPTYPE];
        let mut vl = [0.0; N_COMPTYPE];
        for line in &lines {
            let t = line.kind.index();
            cm[t] = line.cm;
            ra[t] = line.ra;
            gl[t] = line.gl;
            vl[t] = line.vl;
        }
        for i in 0..n_comp {
            let t = self.kind[offset + i].index();
            let area = self.area[offset + i];
            self.cm[offset + i] = cm[t] * area; // µF
            self.ra[offset + i] = ra[t] * 1e-3;
            self.gl[offset + i] = gl[t] * area * 1e3; // S -> mS
            self.vl[offset + i] = vl[t];
        }

        for line in &lines {
            let Some(active) = line.active else { continue };
            self.gamma[N_COMPTYPE * lpid + line.kind.index()] = active.gamma;
            self.decay[N_COMPTYPE * lpid + line.kind.index()] = active.decay;

            if self.all_active {
                for i in 0..n_comp {
                    if self.kind[offset + i] != line.kind {
                        continue;
                    }
                    let area = self.area[offset + i];
                    for (k, g) in active.gbar.iter().enumerate() {
                        self.gbar[N_GBAR * (offset + i) + k] = g * area * 1e3; // S -> mS
                    }
                }
            } else if line.kind == CompartmentKind::Soma {
                let area = self.area[offset]; // compartment 0 is the soma
                for (k, g) in active.gbar.iter().enumerate() {
                    self.gbar[N_GBAR * lpid + k] = g * area * 1e3; // S -> mS
                }
            }
        }
        Ok(())
    }

    /// Number of rank-local populations.
    pub fn n_popl(&self) -> usize {
        self.n_neuron.len()
    }

    /// Total rank-local neuron count.
    pub fn total_neurons(&self) -> usize {
        self.n_neuron.iter().sum()
    }

    /// Arena range of population `pid`'s template compartments.
    pub fn comp_range(&self, pid: usize) -> std::ops::Range<usize> {
        self.cid[pid]..self.cid[pid] + self.n_comp[pid]
    }

    /// Maximal conductances at the soma of population `pid`.
    pub fn gbar_soma(&self, pid: usize) -> &[f64] {
        let base = if self.all_active {
            N_GBAR * self.cid[pid]
        } else {
            N_GBAR * pid
        };
        &self.gbar[base..base + N_GBAR]
    }

    /// Calcium buffer parameters `(gamma, decay)` for the soma of `pid`.
    pub fn ca_params_soma(&self, pid: usize) -> (f64, f64) {
        let idx = N_COMPTYPE * pid + CompartmentKind::Soma.index();
        (self.gamma[idx], self.decay[idx])
    }
}
