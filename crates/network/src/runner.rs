//! Spawning and joining the SPMD rank threads.

use std::path::Path;

use exchange::{SingleRank, ThreadedGather};

use crate::{Network, NetworkError, Result, SimConfig};

/// Run the whole simulation on `n_ranks` rank threads. Every rank reads the
/// input files itself and writes its own `v<r>.dat`/`s<r>.dat` under
/// `out_dir`; the default step current from `cfg` is injected.
pub fn run_ranks(
    cfg: &SimConfig,
    population_csv: &Path,
    connection_csv: &Path,
    out_dir: &Path,
    n_ranks: usize,
) -> Result<()> {
    if n_ranks == 1 {
        let mut net = Network::build(cfg, population_csv, connection_csv, out_dir, 0, 1)?;
        return net.run(&mut SingleRank, &cfg.step_current());
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = ThreadedGather::fabric(n_ranks)
            .into_iter()
            .enumerate()
            .map(|(rank, mut gather)| {
                scope.spawn(move || -> Result<()> {
                    let mut net =
                        Network::build(cfg, population_csv, connection_csv, out_dir, rank, n_ranks)?;
                    net.run(&mut gather, &cfg.step_current())
                })
            })
            .collect();

        let mut outcome = Ok(());
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => outcome = outcome.and(Err(e)),
                Err(_) => outcome = outcome.and(Err(NetworkError::RankPanicked)),
            }
        }
        outcome
    })
}
