// Compact index codec
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of TAME.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Variable-length encoding of signed 32-bit table indices.
//!
//! Nearly every index stored in a container is small,
//!   and so indices are stored as _compact indices_ that occupy between
//!   one and [`global::COMPACT_INDEX_MAX_LEN`] bytes.
//! The sign is stored as its own bit rather than in two's complement so
//!   that small negative values
//!     (which reference imports)
//!   cost no more than small positive ones.
//!
//! Layout
//! ======
//! ```text
//!  byte 0:    S M x x x x x x    S = sign, M = more, x = bits 0..=5
//!  byte 1-4:  M x x x x x x x    M = more, x = next 7 bits
//! ```
//!
//! The magnitude is stored least significant bits first.
//! A value whose magnitude is less than `64` therefore occupies a single
//!   byte:
//!
//! ```
//! use tamepkg::index;
//!
//! assert_eq!(&[0x05][..], &index::encode(5)[..]);
//! assert_eq!(&[0x85][..], &index::encode(-5)[..]);
//! assert_eq!(&[0x40, 0x01][..], &index::encode(64)[..]);
//!
//! assert_eq!(Ok((-5, 1)), index::decode(&[0x85, 0xFF]));
//! ```

use crate::global;
use arrayvec::ArrayVec;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fmt::{self, Display};
use std::io::{self, Read, Write};

/// Bytes of a single encoded compact index.
pub type CompactBytes = ArrayVec<u8, { global::COMPACT_INDEX_MAX_LEN }>;

const SIGN_BIT: u8 = 0x80;
const FIRST_MORE_BIT: u8 = 0x40;
const FIRST_VALUE_MASK: u8 = 0x3F;
const FIRST_VALUE_BITS: u32 = 6;
const MORE_BIT: u8 = 0x80;
const VALUE_MASK: u8 = 0x7F;
const VALUE_BITS: u32 = 7;

/// Error decoding a compact index.
#[derive(Debug)]
pub enum CompactIndexError {
    /// Propagated I/O error,
    ///   most often an unexpected end of input.
    Io(io::Error),

    /// The final permitted byte still has its continuation bit set.
    Overlong,

    /// The decoded magnitude does not fit within a signed 32-bit integer.
    Overflow,
}

impl PartialEq for CompactIndexError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Overlong, Self::Overlong) => true,
            (Self::Overflow, Self::Overflow) => true,
            _ => false,
        }
    }
}

impl Display for CompactIndexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => Display::fmt(e, f),
            Self::Overlong => write!(
                f,
                "compact index exceeds {} bytes",
                global::COMPACT_INDEX_MAX_LEN
            ),
            Self::Overflow => write!(f, "compact index overflows 32 bits"),
        }
    }
}

impl std::error::Error for CompactIndexError {}

impl From<io::Error> for CompactIndexError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Encode `value` as a compact index.
pub fn encode(value: i32) -> CompactBytes {
    let mut bytes = CompactBytes::new();
    let mut rest = value.unsigned_abs();

    let mut first = (rest as u8) & FIRST_VALUE_MASK;
    rest >>= FIRST_VALUE_BITS;

    if value < 0 {
        first |= SIGN_BIT;
    }
    if rest != 0 {
        first |= FIRST_MORE_BIT;
    }

    bytes.push(first);

    while rest != 0 {
        let mut byte = (rest as u8) & VALUE_MASK;
        rest >>= VALUE_BITS;

        if rest != 0 {
            byte |= MORE_BIT;
        }

        // The magnitude of an i32 is at most 32 bits,
        //   which always fits within the maximum width.
        bytes.push(byte);
    }

    bytes
}

/// Number of bytes that [`encode`] will produce for `value`.
pub fn encoded_len(value: i32) -> usize {
    let bits = u32::BITS - value.unsigned_abs().leading_zeros();

    match bits.checked_sub(FIRST_VALUE_BITS) {
        None | Some(0) => 1,
        Some(rest) => 1 + ((rest + VALUE_BITS - 1) / VALUE_BITS) as usize,
    }
}

/// Decode a compact index from the start of `bytes`.
///
/// Produces the decoded value along with the number of bytes consumed;
///   any trailing bytes are ignored.
pub fn decode(mut bytes: &[u8]) -> Result<(i32, usize), CompactIndexError> {
    let total = bytes.len();
    let value = read_compact(&mut bytes)?;

    Ok((value, total - bytes.len()))
}

/// Read a single compact index from `reader`.
///
/// This reads only as many bytes as the index occupies.
pub fn read_compact<R: Read>(reader: &mut R) -> Result<i32, CompactIndexError> {
    let first = reader.read_u8()?;
    let negative = first & SIGN_BIT != 0;

    let mut magnitude = u64::from(first & FIRST_VALUE_MASK);

    if first & FIRST_MORE_BIT != 0 {
        let mut shift = FIRST_VALUE_BITS;

        for n in 1..global::COMPACT_INDEX_MAX_LEN {
            let byte = reader.read_u8()?;
            magnitude |= u64::from(byte & VALUE_MASK) << shift;
            shift += VALUE_BITS;

            if byte & MORE_BIT == 0 {
                break;
            }

            if n == global::COMPACT_INDEX_MAX_LEN - 1 {
                return Err(CompactIndexError::Overlong);
            }
        }
    }

    if negative {
        match magnitude {
            m if m <= 1 << 31 => Ok((m as i64).wrapping_neg() as i32),
            _ => Err(CompactIndexError::Overflow),
        }
    } else {
        i32::try_from(magnitude).map_err(|_| CompactIndexError::Overflow)
    }
}

/// Write `value` to `writer` as a compact index,
///   producing the number of bytes written.
pub fn write_compact<W: Write>(
    writer: &mut W,
    value: i32,
) -> io::Result<usize> {
    let bytes = encode(value);

    for byte in &bytes {
        writer.write_u8(*byte)?;
    }

    Ok(bytes.len())
}
