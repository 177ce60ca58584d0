//! Shared fixtures: minimal input files and output parsing.
#![allow(dead_code)] // each test binary uses a different subset

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `name` under `dir` and return its path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// A lone spherical soma of radius 10 µm (reconstructed as a cylinder of
/// length 2r, lateral area 4πr² ≈ 1.2566e-5 cm²).
pub const SOMA_SWC: &str = "# id type x y z r parent\n0 1 0.0 0.0 0.0 10.0 -1\n";

/// Soma membrane area of `SOMA_SWC`, cm².
pub fn soma_area() -> f64 {
    4.0 * std::f64::consts::PI * 1.0e-6
}

/// Passive-only parameters: cm 1 µF/cm², ra 100, gl 1e-4 S/cm² (tau_m =
/// 10 ms), vl −65 mV.
pub const PASSIVE_ION: &str = "1,1.0,100.0,1e-4,-65.0\n";

/// Total leak conductance of the passive soma, mS.
pub fn passive_gl() -> f64 {
    1e-4 * soma_area() * 1e3
}

/// Population CSV with `n` identical passive somata in one population.
pub fn passive_population(dir: &Path, n: usize) -> PathBuf {
    write_file(dir, "cell.swc", SOMA_SWC);
    write_file(dir, "cell.ion", PASSIVE_ION);
    write_file(
        dir,
        "populations.csv",
        &format!("{n},1,cells,cell.swc,cell.ion\n"),
    )
}

/// Parse a `v<r>.dat` file into rows of `(t, voltages)`.
pub fn read_v(path: &Path) -> Vec<(f64, Vec<f64>)> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let mut it = line.split_whitespace();
            let t: f64 = it.next().unwrap().parse().unwrap();
            (t, it.map(|v| v.parse().unwrap()).collect())
        })
        .collect()
}

/// Parse an `s<r>.dat` file into `(t_ms, global_id)` records.
pub fn read_s(path: &Path) -> Vec<(f64, usize)> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let mut it = line.split_whitespace();
            let t: f64 = it.next().unwrap().parse().unwrap();
            let id: usize = it.next().unwrap().parse().unwrap();
            (t, id)
        })
        .collect()
}
