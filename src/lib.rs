//! A fast reader for gromacs trajectories.
//!
//! Decodes the compressed xtc trajectory format frame by frame, and parses
//! gro structure files into a queryable [`Topology`](topology::Topology).

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use glam::{Mat3, Vec3};

pub mod bits;
pub mod codec;
mod decode;
mod error;
pub mod gro;
pub mod selection;
pub mod topology;
mod xdr;

pub use decode::PRECISION_UNCOMPRESSED;
pub use error::{Error, Result};
pub use xdr::padding;

pub type BoxVec = Mat3;

/// Frame magic of the classic xtc format.
pub const MAGIC_1995: i32 = 1995;
/// Frame magic of the extended format with 64-bit payload sizes.
pub const MAGIC_2023: i32 = 2023;

#[derive(Debug, Default, Clone)]
pub struct Frame {
    pub step: i64,
    /// Time in picoseconds.
    pub time: f32,
    pub boxvec: BoxVec,
    /// The precision the coordinates were quantized with, or
    /// [`PRECISION_UNCOMPRESSED`] for frames stored as plain floats.
    pub precision: f32,
    /// Flat `[x, y, z, x, y, z, ...]` positions in nm.
    pub positions: Vec<f32>,
}

impl Frame {
    pub fn natoms(&self) -> usize {
        self.positions.len() / 3
    }

    /// The positions as three-component vectors.
    pub fn coords(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|xyz| Vec3::new(xyz[0], xyz[1], xyz[2]))
    }
}

/// A fully materialized trajectory.
#[derive(Debug, Default, Clone)]
pub struct Trajectory {
    /// The file the frames were read from.
    pub path: PathBuf,
    /// Atom count shared by all frames.
    pub natoms: usize,
    pub frames: Vec<Frame>,
}

impl Trajectory {
    pub fn nframes(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Debug)]
pub struct XTCReader<R> {
    pub file: R,
    /// Reusable buffer for the compressed payload of a frame.
    scratch: Vec<u8>,
}

impl XTCReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> XTCReader<R> {
    pub fn new(file: R) -> Self {
        Self {
            file,
            scratch: Vec::new(),
        }
    }

    /// Read one [`Frame`], overwriting `frame` in place.
    ///
    /// An exhausted reader yields [`Error::UnexpectedEof`], just like a
    /// frame that was cut short.
    pub fn read_frame(&mut self, frame: &mut Frame) -> Result<()> {
        match self.try_read_frame(frame)? {
            true => Ok(()),
            false => Err(Error::UnexpectedEof),
        }
    }

    /// Like [`XTCReader::read_frame`], except that a reader with no bytes
    /// left is reported as `false` rather than as an error.
    fn try_read_frame(&mut self, frame: &mut Frame) -> Result<bool> {
        let file = &mut self.file;

        let magic = match xdr::read_i32_or_eof(file)? {
            None => return Ok(false),
            Some(magic) => magic,
        };
        let long_bufsize = match magic {
            MAGIC_1995 => false,
            MAGIC_2023 => true,
            _ => return Err(Error::BadMagic(magic)),
        };
        let natoms = xdr::read_i32(file)?;
        if natoms <= 0 {
            return Err(Error::CorruptStream("header declares a non-positive atom count"));
        }
        // The wire carries a 32-bit step count; zero-extend it.
        let step = xdr::read_i32(file)? as u32 as i64;
        let time = xdr::read_f32(file)?;
        let boxvec = read_boxvec(file)?;

        frame.precision = decode::read_positions(
            file,
            natoms as u32,
            long_bufsize,
            &mut frame.positions,
            &mut self.scratch,
        )?;

        frame.step = step;
        frame.time = time;
        frame.boxvec = boxvec;

        Ok(true)
    }

    /// Read all remaining frames, allocating a fresh one per frame.
    pub fn read_all_frames(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        loop {
            let mut frame = Frame::default();
            if !self.try_read_frame(&mut frame)? {
                return Ok(frames);
            }
            frames.push(frame);
        }
    }
}

impl<R: Read + Seek> XTCReader<R> {
    /// Rewind to the start of the trajectory.
    pub fn home(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

fn read_boxvec(file: &mut impl Read) -> Result<BoxVec> {
    let mut boxvec = [0f32; 9];
    xdr::read_f32s(file, &mut boxvec)?;
    Ok(boxvec_from_rows(boxvec))
}

pub(crate) fn boxvec_from_rows(b: [f32; 9]) -> BoxVec {
    let cols = [
        [b[0], b[3], b[6]],
        [b[1], b[4], b[7]],
        [b[2], b[5], b[8]],
    ];
    BoxVec::from_cols_array_2d(&cols)
}

/// Load every frame of an xtc file into memory.
pub fn read_xtc(path: impl AsRef<Path>) -> Result<Trajectory> {
    let path = path.as_ref();
    let mut reader = XTCReader::new(BufReader::new(File::open(path)?));
    let frames = reader.read_all_frames()?;
    let natoms = frames.first().map(Frame::natoms).unwrap_or(0);
    Ok(Trajectory {
        path: path.to_path_buf(),
        natoms,
        frames,
    })
}

/// Stream the frames of an xtc file through a single reused [`Frame`].
pub fn each_frame(path: impl AsRef<Path>) -> Result<FrameStream> {
    Ok(FrameStream {
        reader: XTCReader::new(BufReader::new(File::open(path)?)),
        frame: Frame::default(),
    })
}

/// A pull-based frame stream that overwrites one internal [`Frame`] per
/// step instead of allocating, created by [`each_frame`].
pub struct FrameStream {
    reader: XTCReader<BufReader<File>>,
    frame: Frame,
}

impl FrameStream {
    /// Advance to the next frame and lend it out, or return `Ok(None)` once
    /// the file is exhausted.
    ///
    /// The borrow ends before the next call; callers that want to keep a
    /// frame around must clone it.
    pub fn next_frame(&mut self) -> Result<Option<&Frame>> {
        if self.reader.try_read_frame(&mut self.frame)? {
            Ok(Some(&self.frame))
        } else {
            Ok(None)
        }
    }
}
