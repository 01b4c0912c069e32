use std::io;

/// Everything that can go wrong while reading a trajectory or structure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stream ended in the middle of a record.
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// The frame header magic was neither 1995 nor 2023.
    #[error("bad frame magic `{0}`")]
    BadMagic(i32),
    /// The compressed data stream is internally inconsistent.
    #[error("corrupt stream: {0}")]
    CorruptStream(&'static str),
    /// A malformed gro structure file.
    #[error("malformed gro file: {0}")]
    Gro(String),
    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        // An exhausted reader is its own kind, since running out of bytes
        // mid-record is a property of the trajectory rather than of the
        // underlying file system.
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            _ => Error::Io(err),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
