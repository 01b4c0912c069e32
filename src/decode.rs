//! Decompression of the coordinate block of an xtc frame.

use std::io::Read;

use crate::bits::BitReader;
use crate::codec::{calc_sizeint, receive_ints, FIRSTIDX, LASTIDX, MAGICINTS};
use crate::xdr::{read_f32, read_f32s, read_i32, read_i32x3, read_i64, read_opaque};
use crate::{Error, Result};

/// Frames with up to this many atoms store their positions as plain floats.
pub(crate) const MAX_UNCOMPRESSED_ATOMS: usize = 9;

/// The precision reported for frames whose coordinates were never quantized.
pub const PRECISION_UNCOMPRESSED: f32 = -1.0;

/// Read the coordinate block of one frame into `positions`, resizing it to
/// the atom count the frame declares.
///
/// The reader must be positioned directly after the box matrix. `scratch`
/// receives the compressed payload and is reused across calls. Returns the
/// precision the positions were quantized with, or
/// [`PRECISION_UNCOMPRESSED`] for the uncompressed small-system layout.
pub(crate) fn read_positions<R: Read>(
    file: &mut R,
    natoms: u32,
    long_bufsize: bool,
    positions: &mut Vec<f32>,
    scratch: &mut Vec<u8>,
) -> Result<f32> {
    let lsize = read_i32(file)?;
    if lsize <= 0 {
        return Err(Error::CorruptStream("frame declares a non-positive atom count"));
    }
    let lsize = lsize as usize;
    if lsize as u32 != natoms {
        log::warn!("frame holds {lsize} atoms where its header promised {natoms}, going with {lsize}");
    }
    positions.resize(lsize * 3, 0.0);

    if lsize <= MAX_UNCOMPRESSED_ATOMS {
        // Very small systems skip compression altogether.
        read_f32s(file, positions)?;
        return Ok(PRECISION_UNCOMPRESSED);
    }

    let precision = read_f32(file)?;
    if !(precision > 0.0) {
        return Err(Error::CorruptStream("compressed frame with a non-positive precision"));
    }
    let inv_precision = 1.0 / precision;

    let minint = read_i32x3(file)?;
    let maxint = read_i32x3(file)?;
    let (sizeint, bitsizeint, bitsize) = calc_sizeint(minint, maxint)?;

    let mut smallidx = read_i32(file)? as usize;
    if !(FIRSTIDX..LASTIDX).contains(&smallidx) {
        return Err(Error::CorruptStream("small-size index out of range"));
    }

    let tmpidx = usize::max(FIRSTIDX, smallidx - 1);
    let mut smaller = MAGICINTS[tmpidx] / 2;
    let mut smallnum = MAGICINTS[smallidx] / 2;
    let mut sizesmall = [MAGICINTS[smallidx] as u32; 3];

    let nbytes = if long_bufsize {
        read_i64(file)?
    } else {
        read_i32(file)? as i64
    };
    let nbytes = match usize::try_from(nbytes) {
        Ok(n) if n > 0 => n,
        _ => return Err(Error::CorruptStream("declared payload size is not positive")),
    };
    read_opaque(file, scratch, nbytes).map_err(|err| match err {
        Error::UnexpectedEof => {
            Error::CorruptStream("declared payload size exceeds the remaining stream")
        }
        err => err,
    })?;

    let mut bits = BitReader::new(scratch);
    let mut prevcoord = [0i32; 3];
    // The run length survives across atoms; the per-atom flag bit signals a
    // *change* in run length, not its presence.
    let mut run: u32 = 0;
    let mut write_idx = 0;
    let mut read_idx = 0;
    while read_idx < lsize {
        let mut thiscoord = if bitsize == 0 {
            [
                bits.receive_bits(bitsizeint[0] as usize)? as i32,
                bits.receive_bits(bitsizeint[1] as usize)? as i32,
                bits.receive_bits(bitsizeint[2] as usize)? as i32,
            ]
        } else {
            receive_ints(&mut bits, bitsize, sizeint)?
        };

        thiscoord[0] = thiscoord[0].wrapping_add(minint[0]);
        thiscoord[1] = thiscoord[1].wrapping_add(minint[1]);
        thiscoord[2] = thiscoord[2].wrapping_add(minint[2]);

        prevcoord = thiscoord;

        let flag = bits.receive_bits(1)? > 0;
        let mut is_smaller: i32 = 0;
        if flag {
            let stored = bits.receive_bits(5)?;
            is_smaller = (stored % 3) as i32;
            run = stored - is_smaller as u32;
            is_smaller -= 1;
        }

        if run > 0 {
            if (write_idx + 1) * 3 + run as usize > lsize * 3 {
                return Err(Error::CorruptStream("small-atom run overruns the frame"));
            }

            for k in (0..run).step_by(3) {
                let mut small = receive_ints(&mut bits, smallidx as u32, sizesmall)?;
                read_idx += 1;
                small[0] += prevcoord[0] - smallnum;
                small[1] += prevcoord[1] - smallnum;
                small[2] += prevcoord[2] - smallnum;
                thiscoord = small;
                if k == 0 {
                    // Swap the first delta-coded atom with the base atom. The
                    // encoder stores e.g. water as OHH with the middle atom
                    // first; swapping restores the on-disk atom order.
                    std::mem::swap(&mut thiscoord, &mut prevcoord);
                    emit(positions, write_idx, prevcoord, inv_precision);
                    write_idx += 1;
                } else {
                    prevcoord = thiscoord;
                }
                emit(positions, write_idx, thiscoord, inv_precision);
                write_idx += 1;
            }
        } else {
            emit(positions, write_idx, thiscoord, inv_precision);
            write_idx += 1;
        }

        if is_smaller < 0 {
            smallidx -= 1;
            smallnum = smaller;
            if smallidx > FIRSTIDX {
                smaller = MAGICINTS[smallidx - 1] / 2;
            } else {
                smaller = 0;
            }
        } else if is_smaller > 0 {
            smallidx += 1;
            if smallidx >= LASTIDX {
                return Err(Error::CorruptStream("small-size index ran off the magic table"));
            }
            smaller = smallnum;
            smallnum = MAGICINTS[smallidx] / 2;
        }
        if MAGICINTS[smallidx] == 0 {
            return Err(Error::CorruptStream("small-size index fell into the sentinel zone"));
        }
        sizesmall.fill(MAGICINTS[smallidx] as u32);
        read_idx += 1;
    }

    Ok(precision)
}

#[inline]
fn emit(positions: &mut [f32], idx: usize, coord: [i32; 3], inv_precision: f32) {
    let out = &mut positions[idx * 3..idx * 3 + 3];
    out[0] = coord[0] as f32 * inv_precision;
    out[1] = coord[1] as f32 * inv_precision;
    out[2] = coord[2] as f32 * inv_precision;
}
