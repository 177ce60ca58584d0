//! Population store and per-compartment neuron state.
//!
//! A population is a homogeneous group of neurons sharing one morphology
//! template (reconstructed from an SWC file) and one passive/ionic parameter
//! set (read from a CSV). This crate owns the immutable per-compartment
//! arenas (geometry, passive membrane parameters, maximal conductances,
//! calcium buffer parameters) and the mutable simulation state (membrane
//! voltage, calcium concentration, injected current).
//!
//! All arrays are contiguous and keyed by dense integer indices; the
//! compartment tree is encoded by a parent index with parents preceding
//! children, soma at index 0.

pub mod csv;
pub mod params;
pub mod population;
pub mod state;
pub mod swc;

pub use population::{global_neuron_count, Population, RankSlice};
pub use state::NeuronState;
pub use swc::SegmentTree;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Malformed {
        path: String,
        line: usize,
        message: String,
    },

    #[error("{path}: first SWC record must be a soma")]
    RootNotSoma { path: String },

    #[error("{path}: reconstruction produced {actual} segments, declared bound is {declared}")]
    CompartmentOverflow {
        path: String,
        declared: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, PopulationError>;

/// Compartment tags as they appear in SWC files and parameter CSVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompartmentKind {
    Soma = 1,
    Axon = 2,
    Apical = 3,
    Dend = 4,
}

/// Number of parameter slots per population for type-indexed tables
/// (index 0 is unused, matching the SWC numbering).
pub const N_COMPTYPE: usize = 5;

impl CompartmentKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(CompartmentKind::Soma),
            2 => Some(CompartmentKind::Axon),
            3 => Some(CompartmentKind::Apical),
            4 => Some(CompartmentKind::Dend),
            _ => None,
        }
    }

    /// Index into type-keyed parameter tables.
    pub fn index(self) -> usize {
        self as usize
    }
}
