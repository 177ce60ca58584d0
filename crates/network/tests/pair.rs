//! Two-neuron excitatory pair: the presynaptic spike arrives at the
//! postsynaptic cell exactly `delay_ms` after its exchange boundary, as a
//! subthreshold EPSP.

mod common;

use common::*;
use exchange::SingleRank;
use network::{Network, SimConfig};

#[test]
fn epsp_onset_follows_the_programmed_delay() {
    let dir = tempfile::tempdir().unwrap();
    let pop_csv = passive_population(dir.path(), 2);
    // 0 -> 1, soma target, 0.2/3 ms rise/decay, reversal 0 mV, 2 ms delay.
    let conn_csv = write_file(
        dir.path(),
        "connections.csv",
        "0,1,0,2e-4,3.0,0.2,0.0,2,e\n",
    );

    let cfg = SimConfig {
        t_stop: 200.0,
        ..SimConfig::default()
    };
    let mut net = Network::build(&cfg, &pop_csv, &conn_csv, dir.path(), 0, 1).unwrap();

    // Drive only the presynaptic neuron, hard enough to cross threshold.
    let current = |t: f64, gid: usize| {
        if gid == 0 && (100.0..500.0).contains(&t) {
            0.12
        } else {
            0.0
        }
    };
    net.run(&mut SingleRank, &current).unwrap();

    let spikes = read_s(&dir.path().join("s0.dat"));
    assert_eq!(spikes.len(), 1, "expected exactly one presynaptic spike");
    let (t_pre, pre_id) = spikes[0];
    assert_eq!(pre_id, 0);
    assert!(t_pre >= 100.0 && t_pre.fract() == 0.0, "spike records land on ms boundaries");

    let rows = read_v(&dir.path().join("v0.dat"));
    let post = |t_query: f64| -> f64 {
        rows.iter()
            .find(|(t, _)| (t - t_query).abs() < 1e-9)
            .unwrap()
            .1[1]
    };

    // Quiet until the quantum lands t_pre + 2 ms after the exchange.
    let onset = t_pre + 2.0;
    for (t, vs) in rows.iter().filter(|(t, _)| *t <= onset) {
        assert!(
            (vs[1] + 65.0).abs() < 1e-6,
            "post deviated to {} at t={t} before onset {onset}",
            vs[1]
        );
    }
    // A clear depolarisation a few ms later, but nowhere near threshold.
    let peak = rows
        .iter()
        .filter(|(t, _)| *t > onset && *t < onset + 15.0)
        .map(|(_, vs)| vs[1])
        .fold(f64::MIN, f64::max);
    assert!(peak > -64.5, "no EPSP, post peaked at {peak}");
    assert!(peak < -30.0, "EPSP implausibly large: {peak}");
    assert!(post(onset + 0.3) > -65.0 + 1e-4, "rise did not start after onset");
}
