//! The Keccak permutation state, and the generic algorithms driving it.
//!
//! A state is a 5x5 grid of lanes. Everything width specific (how bits map onto
//! a lane, and the round step mappings) lives behind [`Permutation`], whose
//! provided methods implement absorbing, permuting, and squeezing once for all
//! widths.
//!
//! A state is used for a single hash computation: it starts zeroed, absorbs the
//! whole padded input, and is then squeezed. Absorbing after squeezing has begun
//! is not guarded against; [`crate::Sponge`] never does it.
use alloc::vec;
use alloc::vec::Vec;

use crate::bits::{ceil_div, BYTE_BITS};

/// The number of lanes along each side of the state.
pub const GRID: usize = 5;
/// The number of lanes in the state.
pub const LANES: usize = GRID * GRID;

/// A width specific Keccak permutation state.
///
/// Positions passed to the lane methods are bit indices into the whole buffer,
/// using the addressing of [`crate::bits`].
pub trait Permutation {
    /// The length of a lane, in bits.
    fn lane_length(&self) -> usize;

    fn rounds_per_permutation(&self) -> usize;

    /// XOR a full lane's worth of bits, starting at the byte aligned `bit_index`,
    /// into lane `(x, y)`.
    fn absorb_whole_lane(&mut self, input: &[u8], bit_index: usize, x: usize, y: usize);

    /// XOR `length` bits starting at `bit_index` into the low bits of lane `(x, y)`.
    ///
    /// `length` never exceeds the lane length.
    fn absorb_partial_lane(
        &mut self,
        input: &[u8],
        bit_index: usize,
        length: usize,
        x: usize,
        y: usize,
    );

    /// Write lane `(x, y)` into `output`, starting at the byte aligned `bit_index`.
    fn squeeze_whole_lane(&self, x: usize, y: usize, output: &mut [u8], bit_index: usize);

    /// Write the low bits of lane `(x, y)` into `output` from `bit_index`,
    /// stopping at the end of the lane or at `stop_index`, whichever comes first.
    ///
    /// The bits being written must be zero in `output`. Returns the index after
    /// the last bit written.
    fn squeeze_partial_lane(
        &self,
        output: &mut [u8],
        bit_index: usize,
        stop_index: usize,
        x: usize,
        y: usize,
    ) -> usize;

    fn theta(&mut self);

    /// The rho and pi steps, combined.
    fn rho_pi(&mut self);

    fn chi(&mut self);

    fn iota(&mut self, round: usize);

    /// Absorb `input_bits` bits of `input`, in blocks of `bitrate` bits,
    /// permuting after each block.
    fn absorb(&mut self, input: &[u8], input_bits: usize, bitrate: usize) {
        debug_assert!(bitrate > 0);
        let mut index = 0;
        while index < input_bits {
            let length = usize::min(bitrate, input_bits - index);
            self.absorb_bits_into_state(input, index, length);
            self.permute();
            index += bitrate;
        }
    }

    /// XOR a single block of `length` bits, starting at `start`, into the state.
    ///
    /// Lanes are filled in row major order. Once a lane can't be filled whole,
    /// the rest of the block goes in bit by bit.
    fn absorb_bits_into_state(&mut self, input: &[u8], start: usize, length: usize) {
        let lane_length = self.lane_length();
        debug_assert!(length <= lane_length * LANES);
        let mut index = start;
        let mut remaining = length;
        let mut whole = true;
        for y in 0..GRID {
            for x in 0..GRID {
                if remaining == 0 {
                    return;
                }
                whole = whole && index.is_multiple_of(BYTE_BITS) && remaining >= lane_length;
                let taken = if whole {
                    self.absorb_whole_lane(input, index, x, y);
                    lane_length
                } else {
                    let taken = usize::min(remaining, lane_length);
                    self.absorb_partial_lane(input, index, taken, x, y);
                    taken
                };
                index += taken;
                remaining -= taken;
            }
        }
    }

    /// Apply every round of the permutation.
    fn permute(&mut self) {
        for round in 0..self.rounds_per_permutation() {
            self.theta();
            self.rho_pi();
            self.chi();
            self.iota(round);
        }
    }

    /// Squeeze `output_bits` bits out of the state, `bitrate` bits at a time.
    ///
    /// The state is permuted between blocks, but never before the first or after
    /// the last. Unused high bits of the final byte are zero.
    fn squeeze(&mut self, bitrate: usize, output_bits: usize) -> Vec<u8> {
        debug_assert!(bitrate > 0);
        let mut output = vec![0u8; ceil_div(output_bits, BYTE_BITS)];
        self.squeeze_bits_from_state(&mut output, 0, usize::min(bitrate, output_bits));
        let mut index = bitrate;
        while index < output_bits {
            self.permute();
            let length = usize::min(bitrate, output_bits - index);
            self.squeeze_bits_from_state(&mut output, index, length);
            index += bitrate;
        }
        output
    }

    /// Copy `length` bits of the state into `output`, starting at `start`.
    ///
    /// This walks the lanes in the same order as [`Self::absorb_bits_into_state`].
    fn squeeze_bits_from_state(&self, output: &mut [u8], start: usize, length: usize) {
        let lane_length = self.lane_length();
        let stop = start + length;
        let mut index = start;
        for y in 0..GRID {
            for x in 0..GRID {
                if index == stop {
                    return;
                }
                if index.is_multiple_of(BYTE_BITS) && stop - index >= lane_length {
                    self.squeeze_whole_lane(x, y, output, index);
                    index += lane_length;
                } else {
                    index = self.squeeze_partial_lane(output, index, stop, x, y);
                }
            }
        }
    }
}
