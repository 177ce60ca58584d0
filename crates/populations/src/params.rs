//! Passive and ionic parameter CSV parsing.
//!
//! Each data line starts with a compartment type code and either stops after
//! the four passive fields (`type,cm,ra,gl,vl`) or continues with the
//! calcium buffer parameters and the fifteen maximal conductances
//! (`…,gamma,decay,gbar[0..15]`). The five-field form configures passive
//! membrane only; the long form additionally configures the active soma
//! (perisomatic) or, with the all-active flag, every compartment.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::csv::clean_csv_line;
use crate::{CompartmentKind, PopulationError, Result};

/// Number of maximal-conductance slots per parameter line.
pub const N_GBAR: usize = 15;

/// One parsed parameter line.
#[derive(Debug, Clone, Copy)]
pub struct ParamLine {
    pub kind: CompartmentKind,
    /// Specific membrane capacitance, µF/cm².
    pub cm: f64,
    /// Axial resistivity.
    pub ra: f64,
    /// Specific leak conductance, S/cm².
    pub gl: f64,
    /// Leak reversal, mV.
    pub vl: f64,
    /// Present on 22-field lines only.
    pub active: Option<ActiveParams>,
}

/// Calcium buffer parameters and maximal conductances, S/cm².
#[derive(Debug, Clone, Copy)]
pub struct ActiveParams {
    pub gamma: f64,
    pub decay: f64,
    pub gbar: [f64; N_GBAR],
}

/// Parse a parameter file. Order of lines is irrelevant; later lines for the
/// same compartment type win.
pub fn read_param_file(path: &Path) -> Result<Vec<ParamLine>> {
    let path_str = path.display().to_string();
    let file = File::open(path).map_err(|source| PopulationError::Io {
        path: path_str.clone(),
        source,
    })?;

    let mut lines = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| PopulationError::Io {
            path: path_str.clone(),
            source,
        })?;
        let Some(text) = clean_csv_line(&line) else { continue };
        lines.push(parse_line(&path_str, lineno + 1, &text)?);
    }
    Ok(lines)
}

fn parse_line(path: &str, lineno: usize, text: &str) -> Result<ParamLine> {
    let malformed = |message: String| PopulationError::Malformed {
        path: path.to_string(),
        line: lineno,
        message,
    };

    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != 5 && fields.len() != 22 {
        return Err(malformed(format!(
            "expected 5 or 22 fields, got {}",
            fields.len()
        )));
    }

    let code: i32 = fields[0]
        .parse()
        .map_err(|_| malformed(format!("bad type code {:?}", fields[0])))?;
    let kind = CompartmentKind::from_code(code)
        .ok_or_else(|| malformed(format!("unknown compartment type {code}")))?;
    let num = |i: usize| -> Result<f64> {
        fields[i]
            .parse()
            .map_err(|_| malformed(format!("bad numeric field {:?}", fields[i])))
    };

    let active = if fields.len() == 22 {
        let mut gbar = [0.0; N_GBAR];
        for (k, slot) in gbar.iter_mut().enumerate() {
            *slot = num(7 + k)?;
        }
        Some(ActiveParams {
            gamma: num(5)?,
            decay: num(6)?,
            gbar,
        })
    } else {
        None
    };

    Ok(ParamLine {
        kind,
        cm: num(1)?,
        ra: num(2)?,
        gl: num(3)?,
        vl: num(4)?,
        active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn five_field_lines_are_passive_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# type,cm,ra,gl,vl").unwrap();
        writeln!(file, "1, 1.0, 100.0, 3e-5, -65.0").unwrap();
        writeln!(file, "4,2.0,100.0,5e-5,-65.0").unwrap();
        let lines = read_param_file(file.path()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].kind, CompartmentKind::Soma);
        assert!(lines[0].active.is_none());
        assert_eq!(lines[1].cm, 2.0);
    }

    #[test]
    fn long_lines_carry_conductances() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let gbars: Vec<String> = (0..N_GBAR).map(|i| format!("{}", i as f64)).collect();
        writeln!(file, "1,1.0,100.0,3e-5,-65.0,0.05,80.0,{}", gbars.join(",")).unwrap();
        let lines = read_param_file(file.path()).unwrap();
        let active = lines[0].active.expect("active params");
        assert_eq!(active.gamma, 0.05);
        assert_eq!(active.decay, 80.0);
        assert_eq!(active.gbar[14], 14.0);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,1.0,100.0").unwrap();
        assert!(read_param_file(file.path()).is_err());
    }
}
