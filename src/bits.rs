//! Bit addressing inside byte buffers, and the checks applied to sponge parameters.
//!
//! Bits are numbered little-endian within each byte: bit `i` of a buffer lives in
//! byte `i / 8`, at position `i % 8` counted from the least significant end.
use alloc::string::String;

use crate::error::Error;

/// The number of bits in a byte.
pub const BYTE_BITS: usize = 8;
/// The width of the largest Keccak-f permutation, in bits.
pub const MAX_WIDTH: usize = 1600;

/// Test whether the bit at `index` is set.
#[inline]
pub fn bit_high(buffer: &[u8], index: usize) -> bool {
    (buffer[index / BYTE_BITS] >> (index % BYTE_BITS)) & 1 == 1
}

/// Set the bit at `index`.
///
/// Setting an already set bit leaves it set.
#[inline]
pub fn set_bit_high(buffer: &mut [u8], index: usize) {
    buffer[index / BYTE_BITS] |= 1 << (index % BYTE_BITS);
}

/// Divide, rounding towards positive infinity.
#[inline]
pub const fn ceil_div(dividend: usize, divisor: usize) -> usize {
    debug_assert!(divisor > 0);
    dividend.div_ceil(divisor)
}

/// Encode bytes as uppercase hexadecimal, two digits per byte.
///
/// The first pair of digits describes `bytes[0]`, and within each pair the
/// most significant nibble comes first.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Copy the first `bit_limit` bits of `source` into `destination`.
///
/// Whole bytes are copied directly. The trailing `bit_limit % 8` bits are then
/// copied one at a time into the next byte of `destination`, which must be zero.
pub fn partial_byte_copy(source: &[u8], destination: &mut [u8], bit_limit: usize) {
    let whole = bit_limit / BYTE_BITS;
    destination[..whole].copy_from_slice(&source[..whole]);
    for bit in 0..bit_limit % BYTE_BITS {
        if (source[whole] >> bit) & 1 == 1 {
            destination[whole] |= 1 << bit;
        }
    }
}

/// Move the first `message_bits` bits of `message` to the front of `input`.
pub fn copy_message_bits(message: &[u8], message_bits: usize, input: &mut [u8]) {
    if message_bits.is_multiple_of(BYTE_BITS) {
        let bytes = message_bits / BYTE_BITS;
        input[..bytes].copy_from_slice(&message[..bytes]);
    } else {
        partial_byte_copy(message, input, message_bits);
    }
}

pub fn validate_bitrate(bitrate: usize) -> Result<(), Error> {
    if !(1..MAX_WIDTH).contains(&bitrate) {
        return Err(Error::InvalidBitrate(bitrate));
    }
    if !bitrate.is_multiple_of(BYTE_BITS) {
        return Err(Error::UnsupportedBitrate(bitrate));
    }
    Ok(())
}

pub fn validate_capacity(capacity: usize) -> Result<(), Error> {
    if !(1..MAX_WIDTH).contains(&capacity) {
        return Err(Error::InvalidCapacity(capacity));
    }
    Ok(())
}

pub fn validate_suffix(suffix: &str) -> Result<(), Error> {
    if suffix.chars().any(|c| c != '0' && c != '1') {
        return Err(Error::InvalidSuffix(suffix.into()));
    }
    Ok(())
}

pub fn validate_output_length(output_bits: usize) -> Result<(), Error> {
    if output_bits < 1 {
        return Err(Error::InvalidOutputLength);
    }
    Ok(())
}

/// The number of bits in `bytes` bytes, or `None` if that overflows a `usize`.
pub fn bit_length(bytes: usize) -> Option<usize> {
    bytes.checked_mul(BYTE_BITS)
}

/// A buffer too large for its bit length to fit in a `usize` holds any bit
/// length the caller can ask for.
pub fn validate_message_length(message: &[u8], message_bits: usize) -> Result<(), Error> {
    match bit_length(message.len()) {
        Some(available) if message_bits > available => Err(Error::MessageTooLong {
            bits: message_bits,
            available,
        }),
        _ => Ok(()),
    }
}

/// Streams are read a byte at a time, so blocks must be whole bytes.
pub fn require_whole_byte_bitrate(bitrate: usize) -> Result<(), Error> {
    if !bitrate.is_multiple_of(BYTE_BITS) {
        return Err(Error::UnsupportedBitrate(bitrate));
    }
    Ok(())
}
