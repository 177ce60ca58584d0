//! Distributed spike exchange.
//!
//! Ranks own contiguous global neuron ID ranges. Once per millisecond each
//! rank detects its threshold crossings, all ranks gather the spiking IDs
//! (an all-to-all collective, the sole blocking point of the simulation),
//! and every rank programs the delay registers of the fan-out of each
//! spiking presynaptic neuron it knows about.

pub mod detect;
pub mod gather;
pub mod partition;
pub mod propagate;

pub use detect::SpikeDetector;
pub use gather::{SingleRank, SpikeGather, ThreadedGather};
pub use partition::rank_slice;
pub use propagate::program_delays;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("{ranks} ranks cannot partition {neurons} neurons")]
    TooManyRanks { ranks: usize, neurons: usize },

    #[error("a rank left the exchange; aborting")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
