//! `cablenet`: simulate a multi-compartment spiking network described by a
//! population CSV and a connection CSV.
//!
//! Each rank writes `v<r>.dat` (soma voltages per Δt) and `s<r>.dat`
//! (spike times and global neuron IDs) into the output directory. Any
//! configuration error, NaN voltage or rank failure exits with code 1.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use network::{run_ranks, SimConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cablenet", about = "Biophysical spiking network simulator")]
struct Args {
    /// Population CSV: n_neuron,n_comp,name,swc_path,ion_path per line.
    population_csv: PathBuf,

    /// Connection CSV:
    /// pre,post,post_comp,weight,tau_decay,tau_rise,erev,delay_ms,type.
    connection_csv: PathBuf,

    /// Number of SPMD rank threads.
    #[arg(long, default_value_t = 1)]
    ranks: usize,

    /// Directory for the per-rank v/s output files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Integration step, ms.
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Simulated duration, ms.
    #[arg(long, default_value_t = 2000.0)]
    t_stop: f64,

    /// Spike detection threshold, mV.
    #[arg(long, default_value_t = -15.0)]
    spike_threshold: f64,

    /// Use per-compartment maximal conductances instead of perisomatic.
    #[arg(long)]
    all_active: bool,

    /// Injected step-current amplitude.
    #[arg(long, default_value_t = 0.12)]
    i_amp: f64,

    /// Step-current onset, ms.
    #[arg(long, default_value_t = 500.0)]
    i_delay: f64,

    /// Step-current duration, ms.
    #[arg(long, default_value_t = 1000.0)]
    i_duration: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit 1 (clap's default is 2); help/version stay clean.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };
    let cfg = SimConfig {
        dt: args.dt,
        t_stop: args.t_stop,
        spike_threshold: args.spike_threshold,
        all_active: args.all_active,
        i_amp: args.i_amp,
        i_delay: args.i_delay,
        i_duration: args.i_duration,
    };

    run_ranks(
        &cfg,
        &args.population_csv,
        &args.connection_csv,
        &args.out_dir,
        args.ranks,
    )
    .context("simulation failed")
}
