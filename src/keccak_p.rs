//! The Keccak-f permutations of widths 200 through 1600.
//!
//! All four widths share the same step mappings, differing only in the integer
//! type holding a lane. Rotation offsets are reduced modulo the lane length, and
//! round constants are truncated to it.
use core::fmt::Debug;
use core::ops::{BitAnd, BitXor, BitXorAssign, Not};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bits::{bit_high, set_bit_high, BYTE_BITS};
use crate::state::{Permutation, GRID, LANES};

/// Every width the Keccak-f family defines, in bits.
pub const VALID_WIDTHS: [usize; 7] = [25, 50, 100, 200, 400, 800, 1600];

const ROUND_CONSTANTS: [u64; 24] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808A,
    0x8000000080008000,
    0x000000000000808B,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008A,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000A,
    0x000000008000808B,
    0x800000000000008B,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800A,
    0x800000008000000A,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

// Indexed as [x][y], for 64 bit lanes.
const ROTATION_OFFSETS: [[u32; GRID]; GRID] = [
    [0, 36, 3, 41, 18],
    [1, 44, 10, 45, 2],
    [62, 6, 43, 15, 61],
    [28, 55, 25, 21, 56],
    [27, 20, 39, 8, 14],
];

/// An unsigned integer holding one lane of the state.
pub trait Lane:
    Copy
    + Default
    + Debug
    + Eq
    + Zeroize
    + BitXor<Output = Self>
    + BitXorAssign
    + BitAnd<Output = Self>
    + Not<Output = Self>
{
    const BITS: u32;
    const BYTES: usize = Self::BITS as usize / BYTE_BITS;

    fn rotate(self, offset: u32) -> Self;

    /// The low bits of a 64 bit round constant.
    fn truncate(constant: u64) -> Self;

    /// Read a lane from `bytes`, least significant byte first.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` isn't exactly [`Self::BYTES`] long.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Write the lane to `out`, least significant byte first.
    ///
    /// # Panics
    ///
    /// Panics if `out` isn't exactly [`Self::BYTES`] long.
    fn write_le_slice(self, out: &mut [u8]);

    fn is_bit_set(self, bit: u32) -> bool;

    fn single_bit(bit: u32) -> Self;
}

macro_rules! impl_lane {
    ($($t:ty),*) => {
        $(
            impl Lane for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn rotate(self, offset: u32) -> Self {
                    self.rotate_left(offset % Self::BITS)
                }

                #[inline(always)]
                fn truncate(constant: u64) -> Self {
                    constant as $t
                }

                #[inline(always)]
                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; <$t>::BITS as usize / BYTE_BITS];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }

                #[inline(always)]
                fn write_le_slice(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline(always)]
                fn is_bit_set(self, bit: u32) -> bool {
                    (self >> bit) & 1 == 1
                }

                #[inline(always)]
                fn single_bit(bit: u32) -> Self {
                    1 << bit
                }
            }
        )*
    };
}

impl_lane!(u8, u16, u32, u64);

#[inline(always)]
const fn ind(x: usize, y: usize) -> usize {
    x + GRID * y
}

/// The Keccak-f permutation over lanes of type `L`.
///
/// The lanes are zeroized when the state is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeccakP<L: Lane> {
    pub(crate) lanes: [L; LANES],
}

impl<L: Lane> KeccakP<L> {
    pub fn new() -> Self {
        Self {
            lanes: [L::default(); LANES],
        }
    }

    /// The lanes of the state, lane `(x, y)` being at index `x + 5 * y`.
    pub fn lanes(&self) -> &[L; LANES] {
        &self.lanes
    }
}

impl<L: Lane> Default for KeccakP<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lane> Permutation for KeccakP<L> {
    fn lane_length(&self) -> usize {
        L::BITS as usize
    }

    /// 12 + 2l rounds, for lanes of 2^l bits.
    fn rounds_per_permutation(&self) -> usize {
        12 + 2 * L::BITS.trailing_zeros() as usize
    }

    fn absorb_whole_lane(&mut self, input: &[u8], bit_index: usize, x: usize, y: usize) {
        debug_assert!(bit_index.is_multiple_of(BYTE_BITS));
        let start = bit_index / BYTE_BITS;
        self.lanes[ind(x, y)] ^= L::from_le_slice(&input[start..start + L::BYTES]);
    }

    fn absorb_partial_lane(
        &mut self,
        input: &[u8],
        bit_index: usize,
        length: usize,
        x: usize,
        y: usize,
    ) {
        debug_assert!(length <= L::BITS as usize);
        for bit in 0..length {
            if bit_high(input, bit_index + bit) {
                self.lanes[ind(x, y)] ^= L::single_bit(bit as u32);
            }
        }
    }

    fn squeeze_whole_lane(&self, x: usize, y: usize, output: &mut [u8], bit_index: usize) {
        debug_assert!(bit_index.is_multiple_of(BYTE_BITS));
        let start = bit_index / BYTE_BITS;
        self.lanes[ind(x, y)].write_le_slice(&mut output[start..start + L::BYTES]);
    }

    fn squeeze_partial_lane(
        &self,
        output: &mut [u8],
        bit_index: usize,
        stop_index: usize,
        x: usize,
        y: usize,
    ) -> usize {
        let lane = self.lanes[ind(x, y)];
        let end = usize::min(bit_index + L::BITS as usize, stop_index);
        for (bit, index) in (bit_index..end).enumerate() {
            if lane.is_bit_set(bit as u32) {
                set_bit_high(output, index);
            }
        }
        end
    }

    fn theta(&mut self) {
        let mut c = [L::default(); GRID];
        for (x, column) in c.iter_mut().enumerate() {
            *column = (0..GRID).fold(L::default(), |acc, y| acc ^ self.lanes[ind(x, y)]);
        }
        for x in 0..GRID {
            let d = c[(x + GRID - 1) % GRID] ^ c[(x + 1) % GRID].rotate(1);
            for y in 0..GRID {
                self.lanes[ind(x, y)] ^= d;
            }
        }
    }

    fn rho_pi(&mut self) {
        let mut b = [L::default(); LANES];
        for x in 0..GRID {
            for y in 0..GRID {
                let rotated = self.lanes[ind(x, y)].rotate(ROTATION_OFFSETS[x][y]);
                b[ind(y, (2 * x + 3 * y) % GRID)] = rotated;
            }
        }
        self.lanes = b;
    }

    fn chi(&mut self) {
        for y in 0..GRID {
            let mut row = [L::default(); GRID];
            for (x, lane) in row.iter_mut().enumerate() {
                *lane = self.lanes[ind(x, y)];
            }
            for x in 0..GRID {
                self.lanes[ind(x, y)] = row[x] ^ (!row[(x + 1) % GRID] & row[(x + 2) % GRID]);
            }
        }
    }

    fn iota(&mut self, round: usize) {
        self.lanes[0] ^= L::truncate(ROUND_CONSTANTS[round]);
    }
}

/// A supported permutation width, selecting the lane type of the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    W200,
    W400,
    W800,
    W1600,
}

impl Width {
    /// Look up the width with `bits` bits of state.
    ///
    /// Widths in the Keccak-f family below 200 bits have lanes narrower than a
    /// byte, and are rejected as unsupported.
    pub fn from_bits(bits: usize) -> Result<Self, crate::Error> {
        match bits {
            200 => Ok(Width::W200),
            400 => Ok(Width::W400),
            800 => Ok(Width::W800),
            1600 => Ok(Width::W1600),
            b if b < 200 => Err(crate::Error::UnsupportedWidth(b)),
            b => Err(crate::Error::InvalidWidth(b)),
        }
    }

    pub fn bits(self) -> usize {
        match self {
            Width::W200 => 200,
            Width::W400 => 400,
            Width::W800 => 800,
            Width::W1600 => 1600,
        }
    }

    pub fn lane_length(self) -> usize {
        self.bits() / LANES
    }

    pub fn rounds(self) -> usize {
        12 + 2 * self.lane_length().trailing_zeros() as usize
    }
}
