//! Active perisomatic soma under a current step: the full channel set
//! produces spikes during the stimulus and silence after it.

mod common;

use common::*;
use network::{run_ranks, SimConfig};

/// A perisomatic pyramidal-style parameter line: passive fields, calcium
/// buffer, then the 15 maximal conductances in table order (S/cm²):
/// NaV, NaTs, NaTa, Nap, Kv2, Kv3, KP, KT, Kd, Im, Imv2, Ih, SK,
/// CaHVA, CaLVA.
const ACTIVE_ION: &str = "1,1.0,100.0,3e-5,-70.0,0.02,300.0,\
0.05,1.0,0.0,2e-4,0.05,0.3,0.03,0.05,1e-4,2e-4,0.0,1e-4,0.005,1e-3,2e-3\n";

#[test]
fn active_soma_fires_during_the_stimulus_and_stops_after() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "cell.swc", SOMA_SWC);
    write_file(dir.path(), "cell.ion", ACTIVE_ION);
    let pop_csv = write_file(dir.path(), "populations.csv", "1,1,pyr,cell.swc,cell.ion\n");
    let conn_csv = write_file(dir.path(), "connections.csv", "");

    let cfg = SimConfig {
        t_stop: 800.0,
        i_amp: 0.1,
        i_delay: 100.0,
        i_duration: 500.0,
        ..SimConfig::default()
    };
    run_ranks(&cfg, &pop_csv, &conn_csv, dir.path(), 1).unwrap();

    let spikes = read_s(&dir.path().join("s0.dat"));
    assert!(!spikes.is_empty(), "active soma never fired");
    for &(t, id) in &spikes {
        assert_eq!(id, 0);
        assert!(
            (100.0..=620.0).contains(&t),
            "spike at {t} outside the stimulus window"
        );
    }

    let rows = read_v(&dir.path().join("v0.dat"));
    let v_max = rows.iter().map(|(_, vs)| vs[0]).fold(f64::MIN, f64::max);
    assert!(
        v_max > cfg.spike_threshold,
        "soma never crossed threshold, max v = {v_max}"
    );
    // Back near rest at the end of the run.
    let v_end = rows.last().unwrap().1[0];
    assert!(v_end < -40.0, "no repolarisation after stimulus: {v_end}");
}

#[test]
fn resting_active_soma_is_stable_without_input() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "cell.swc", SOMA_SWC);
    write_file(dir.path(), "cell.ion", ACTIVE_ION);
    let pop_csv = write_file(dir.path(), "populations.csv", "1,1,pyr,cell.swc,cell.ion\n");
    let conn_csv = write_file(dir.path(), "connections.csv", "");

    let cfg = SimConfig {
        t_stop: 300.0,
        i_amp: 0.0,
        ..SimConfig::default()
    };
    run_ranks(&cfg, &pop_csv, &conn_csv, dir.path(), 1).unwrap();

    // With gates initialised at steady state the membrane settles close to
    // its effective rest without firing.
    assert!(read_s(&dir.path().join("s0.dat")).is_empty());
    let rows = read_v(&dir.path().join("v0.dat"));
    for (t, vs) in &rows {
        assert!(
            vs[0] < cfg.spike_threshold && vs[0] > -110.0,
            "rest excursion to {} at t={t}",
            vs[0]
        );
    }
}
