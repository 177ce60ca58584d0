//! Chemical synapses: static connection topology and per-connection state.
//!
//! Every user-declared connection expands to two internal entries with equal
//! and opposite weight and with the decay and rise time constants
//! respectively, so that the difference of the two exponentials forms an
//! alpha-like conductance waveform. The table keeps two CSR views of the
//! same bipartite graph: grouped by postsynaptic neuron for the solver, and
//! grouped by presynaptic global ID for spike fan-out.

pub mod state;
pub mod table;

pub use state::SynapseState;
pub use table::ConnectionTable;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynapseError {
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

    #[error("{path}:{line}: postsynaptic compartment {comp} out of range (neuron has {n_comp})")]
    PostCompOutOfRange {
        path: String,
        line: usize,
        comp: usize,
        n_comp: usize,
    },

    #[error("{path}:{line}: delay must be a positive number of milliseconds, got {delay}")]
    BadDelay {
        path: String,
        line: usize,
        delay: i64,
    },
}

pub type Result<T> = std::result::Result<T, SynapseError>;
