//! Network assembly and the per-rank driver loop.
//!
//! Wires the population store, neuron/ion/synapse state, the Hines solver
//! and the spike exchange into one runnable simulation, streaming soma
//! voltages and spike times to per-rank output files.

pub mod config;
pub mod network;
pub mod runner;

pub use config::SimConfig;
pub use network::Network;
pub use runner::run_ranks;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Population(#[from] populations::PopulationError),

    #[error(transparent)]
    Synapse(#[from] synapses::SynapseError),

    #[error(transparent)]
    Exchange(#[from] exchange::ExchangeError),

    #[error("cannot write {path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },

    #[error("output stream failed: {0}")]
    Stream(std::io::Error),

    #[error("voltage diverged (NaN) at t = {t} ms, local neuron {neuron}")]
    NanVoltage { neuron: usize, t: f64 },

    #[error("a rank thread panicked")]
    RankPanicked,
}

impl NetworkError {
    pub(crate) fn from_io(source: std::io::Error) -> Self {
        NetworkError::Stream(source)
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
