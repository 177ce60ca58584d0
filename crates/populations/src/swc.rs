//! SWC morphology reconstruction.
//!
//! An SWC file carries one point record per line (`id type x y z r parent`,
//! ids 0-based and contiguous, record 0 the soma). Records are turned into
//! cylindrical segments spanning parent point to child point, with three
//! adjustments around the soma:
//!
//! 1. A soma–dendrite segment whose dendrite record has children of its own
//!    is suppressed; the children attach to the soma segment directly.
//! 2. A two-record dendrite stub hanging off the soma is split through its
//!    midpoint so the segment count still matches the record count.
//! 3. A soma–axon segment is reshaped into a cylinder by copying the axon
//!    radius onto the soma end.
//!
//! The segment list is ordered parents-before-children with the soma at
//! index 0, which is what the tree solver relies on.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::csv::clean_ws_line;
use crate::{CompartmentKind, PopulationError, Result};

/// One SWC point record.
#[derive(Debug, Clone, Copy)]
pub struct SwcRecord {
    pub id: usize,
    pub kind: CompartmentKind,
    /// Position in µm.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Radius in µm.
    pub r: f64,
    /// Parent record id, −1 for the root.
    pub parent: i64,
}

/// A cylindrical segment between two SWC points.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    /// Parent segment index, −1 for the soma.
    pub parent: i32,
    pub proximal: SwcRecord,
    pub distal: SwcRecord,
    pub kind: CompartmentKind,
}

/// Reconstructed morphology template for one population.
#[derive(Debug, Clone)]
pub struct SegmentTree {
    pub segments: Vec<Segment>,
}

fn parse_record(path: &str, lineno: usize, text: &str) -> Result<SwcRecord> {
    let malformed = |message: String| PopulationError::Malformed {
        path: path.to_string(),
        line: lineno,
        message,
    };

    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 7 {
        return Err(malformed(format!("expected 7 SWC fields, got {}", fields.len())));
    }

    let id: usize = fields[0]
        .parse()
        .map_err(|_| malformed(format!("bad record id {:?}", fields[0])))?;
    let code: i32 = fields[1]
        .parse()
        .map_err(|_| malformed(format!("bad type code {:?}", fields[1])))?;
    let kind = CompartmentKind::from_code(code)
        .ok_or_else(|| malformed(format!("unknown compartment type {code}")))?;

    let num = |i: usize| -> Result<f64> {
        fields[i]
            .parse()
            .map_err(|_| malformed(format!("bad numeric field {:?}", fields[i])))
    };
    let parent: i64 = fields[6]
        .parse()
        .map_err(|_| malformed(format!("bad parent id {:?}", fields[6])))?;

    Ok(SwcRecord {
        id,
        kind,
        x: num(2)?,
        y: num(3)?,
        z: num(4)?,
        r: num(5)?,
        parent,
    })
}

impl SegmentTree {
    /// Read an SWC file and reconstruct the segment tree.
    pub fn from_file(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let file = File::open(path).map_err(|source| PopulationError::Io {
            path: path_str.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| PopulationError::Io {
                path: path_str.clone(),
                source,
            })?;
            let Some(text) = clean_ws_line(&line) else { continue };
            let record = parse_record(&path_str, lineno + 1, text)?;
            if record.id != records.len() {
                return Err(PopulationError::Malformed {
                    path: path_str.clone(),
                    line: lineno + 1,
                    message: format!("record ids must be 0-based and contiguous, got {}", record.id),
                });
            }
            records.push(record);
        }

        Self::from_records(&path_str, &records)
    }

    /// Reconstruct from parsed records (soma first, parents before children).
    pub fn from_records(path: &str, records: &[SwcRecord]) -> Result<Self> {
        if records.is_empty() || records[0].kind != CompartmentKind::Soma {
            return Err(PopulationError::RootNotSoma {
                path: path.to_string(),
            });
        }

        let n = records.len();
        let mut n_child = vec![0usize; n];
        for rec in records {
            if rec.parent >= 0 {
                n_child[rec.parent as usize] += 1;
            }
        }

        let mut segments: Vec<Segment> = Vec::with_capacity(n);
        // Segment index created for each record; suppressed records alias
        // their parent's segment.
        let mut seg_of_record = vec![0usize; n];

        // The root soma record becomes a cylinder of length 2r by
        // synthesizing its proximal end.
        let distal = records[0];
        let proximal = SwcRecord {
            id: usize::MAX,
            x: distal.x - 2.0 * distal.r,
            ..distal
        };
        segments.push(Segment {
            parent: -1,
            proximal,
            distal,
            kind: CompartmentKind::Soma,
        });

        for rid in 1..n {
            let distal = records[rid];
            if distal.parent < 0 || distal.parent as usize >= rid {
                return Err(PopulationError::Malformed {
                    path: path.to_string(),
                    line: rid + 1,
                    message: format!("record {rid} must have an earlier parent, got {}", distal.parent),
                });
            }
            let mut proximal = records[distal.parent as usize];
            let grandparent_kind = if proximal.parent < 0 {
                None
            } else {
                Some(records[proximal.parent as usize].kind)
            };

            let attaches_to_soma = proximal.kind == CompartmentKind::Soma;
            let is_axon = distal.kind == CompartmentKind::Axon;

            if attaches_to_soma && n_child[rid] != 0 && !is_axon {
                // Rule 1: suppressed; children of this record will attach to
                // the soma segment.
                seg_of_record[rid] = seg_of_record[proximal.id];
            } else if grandparent_kind == Some(CompartmentKind::Soma)
                && !is_axon
                && seg_of_record[proximal.id] == seg_of_record[proximal.parent as usize]
            {
                // Rule 2: the parent record was suppressed and nothing has
                // claimed it yet: split this stub through its midpoint.
                let parent_seg = seg_of_record[proximal.id] as i32;
                let mid = SwcRecord {
                    id: usize::MAX,
                    kind: distal.kind,
                    x: (distal.x + proximal.x) * 0.5,
                    y: (distal.y + proximal.y) * 0.5,
                    z: (distal.z + proximal.z) * 0.5,
                    r: (distal.r + proximal.r) * 0.5,
                    parent: -1,
                };
                segments.push(Segment {
                    parent: parent_seg,
                    proximal,
                    distal: mid,
                    kind: mid.kind,
                });
                seg_of_record[proximal.id] = segments.len() - 1;
                segments.push(Segment {
                    parent: parent_seg,
                    proximal: mid,
                    distal,
                    kind: distal.kind,
                });
                seg_of_record[rid] = segments.len() - 1;
            } else {
                // Rule 3 and the general case.
                let skipped_parent = grandparent_kind == Some(CompartmentKind::Soma) && !is_axon;
                let parent_seg = if skipped_parent {
                    seg_of_record[proximal.parent as usize]
                } else {
                    seg_of_record[proximal.id]
                } as i32;

                if attaches_to_soma && is_axon {
                    proximal.r = distal.r;
                }
                segments.push(Segment {
                    parent: parent_seg,
                    proximal,
                    distal,
                    kind: distal.kind,
                });
                seg_of_record[rid] = segments.len() - 1;
            }
        }

        Ok(SegmentTree { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Geometry of one segment in cm, as stored in the population arenas.
#[derive(Debug, Clone, Copy)]
pub struct SegmentGeometry {
    pub rad: f64,
    pub len: f64,
    pub area: f64,
}

impl Segment {
    /// µm coordinates to cm lengths and areas (lateral surface of the
    /// truncated cone spanned by the two radii).
    pub fn geometry(&self) -> SegmentGeometry {
        let dx = self.distal.x - self.proximal.x;
        let dy = self.distal.y - self.proximal.y;
        let dz = self.distal.z - self.proximal.z;
        let dr = self.distal.r - self.proximal.r;
        let len = (dx * dx + dy * dy + dz * dz).sqrt() * 1.0e-4; // µm -> cm
        let area = std::f64::consts::PI
            * (self.proximal.r + self.distal.r)
            * 1.0e-4
            * (dr * dr * 1.0e-8 + len * len).sqrt();
        SegmentGeometry {
            rad: self.distal.r * 1.0e-4,
            len,
            area,
        }
    }
}
