//! Cable-equation solver: per-neuron Hines systems and the Crank–Nicolson
//! integration tick over all rank-local neurons.

pub mod assemble;
pub mod hines;
pub mod step;

pub use assemble::Solver;
pub use hines::{HinesMatrix, LinSys};
pub use step::step_tick;
