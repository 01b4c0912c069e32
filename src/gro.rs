//! Parser for the gro structure format.
//!
//! Layout:
//!   Line 1: title
//!   Line 2: number of atoms
//!   Lines 3..n+2: fixed-width atom records
//!     columns 1-5:   residue number
//!     columns 6-10:  residue name
//!     columns 11-15: atom name
//!     columns 16-20: atom number
//!     columns 21-28: x (nm)
//!     columns 29-36: y (nm)
//!     columns 37-44: z (nm)
//!     columns 45-68: velocities, if present (ignored here)
//!   Last line: box vectors (v1x v2y v3z [v1y v1z v2x v2z v3x v3y])

use std::fs;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;

use crate::{boxvec_from_rows, BoxVec, Error, Result};

/// One atom record of a gro file.
#[derive(Debug, Clone, PartialEq)]
pub struct GroAtom {
    pub resid: u32,
    pub resname: String,
    pub name: String,
    pub serial: u32,
    /// Position in nm.
    pub position: Vec3,
}

/// A parsed gro structure file.
#[derive(Debug, Clone)]
pub struct Structure {
    pub title: String,
    pub atoms: Vec<GroAtom>,
    pub boxvec: BoxVec,
}

impl Structure {
    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }
}

/// Read and parse a gro structure file.
pub fn read_gro(path: impl AsRef<Path>) -> Result<Structure> {
    fs::read_to_string(path)?.parse()
}

impl FromStr for Structure {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let title = lines
            .next()
            .ok_or_else(|| Error::Gro("missing title line".to_string()))?
            .trim()
            .to_string();
        let natoms: usize = lines
            .next()
            .ok_or_else(|| Error::Gro("missing atom count line".to_string()))?
            .trim()
            .parse()
            .map_err(|_| Error::Gro("cannot parse the atom count".to_string()))?;

        let mut atoms = Vec::with_capacity(natoms);
        for i in 0..natoms {
            let line = lines
                .next()
                .ok_or_else(|| Error::Gro(format!("expected {natoms} atom records, found {i}")))?;
            atoms.push(parse_atom(line, i)?);
        }

        let box_line = lines
            .next()
            .ok_or_else(|| Error::Gro("missing box vector line".to_string()))?;
        let boxvec = parse_box_line(box_line)?;

        Ok(Structure {
            title,
            atoms,
            boxvec,
        })
    }
}

fn parse_atom(line: &str, index: usize) -> Result<GroAtom> {
    let column = |range: std::ops::Range<usize>| {
        line.get(range)
            .ok_or_else(|| Error::Gro(format!("atom record {} is too short", index + 1)))
    };

    let resid = column(0..5)?
        .trim()
        .parse()
        .map_err(|_| Error::Gro(format!("bad residue number at atom {}", index + 1)))?;
    let resname = column(5..10)?.trim().to_string();
    let name = column(10..15)?.trim().to_string();
    // Serial columns overflow to asterisks past 99999; fall back to the
    // one-based record position.
    let serial = column(15..20)?
        .trim()
        .parse()
        .unwrap_or((index + 1) as u32);

    let coord = |range: std::ops::Range<usize>, axis: char| {
        column(range)?
            .trim()
            .parse::<f32>()
            .map_err(|_| Error::Gro(format!("bad {axis} coordinate at atom {}", index + 1)))
    };
    let position = Vec3::new(
        coord(20..28, 'x')?,
        coord(28..36, 'y')?,
        coord(36..44, 'z')?,
    );

    Ok(GroAtom {
        resid,
        resname,
        name,
        serial,
        position,
    })
}

fn parse_box_line(line: &str) -> Result<BoxVec> {
    let values: Vec<f32> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| Error::Gro("bad box vector line".to_string()))?;

    let mut rows = [0.0f32; 9];
    match values.len() {
        // v1x v2y v3z
        3 => {
            rows[0] = values[0];
            rows[4] = values[1];
            rows[8] = values[2];
        }
        // ... plus v1y v1z v2x v2z v3x v3y
        9 => {
            rows[0] = values[0];
            rows[4] = values[1];
            rows[8] = values[2];
            rows[1] = values[3];
            rows[2] = values[4];
            rows[3] = values[5];
            rows[5] = values[6];
            rows[6] = values[7];
            rows[7] = values[8];
        }
        n => {
            return Err(Error::Gro(format!(
                "expected 3 or 9 box vector components, found {n}"
            )))
        }
    }
    Ok(boxvec_from_rows(rows))
}
