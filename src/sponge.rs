//! The Keccak sponge construction.
//!
//! See: https://keccak.team/files/Keccak-reference-3.0.pdf, and FIPS 202 section 4.
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use tracing::instrument;
use zeroize::Zeroizing;

use crate::bits::{
    ceil_div, copy_message_bits, set_bit_high, validate_bitrate, validate_capacity,
    validate_message_length, validate_output_length, validate_suffix, BYTE_BITS,
};
use crate::error::Error;
use crate::keccak_p::{KeccakP, Width};
use crate::state::Permutation;

/// The suffix FIPS 202 appends for the SHA-3 hash functions.
const SHA3_SUFFIX: &str = "01";
/// The suffix FIPS 202 appends for the SHAKE extendable output functions.
const SHAKE_SUFFIX: &str = "1111";

/// A Keccak sponge function, `Keccak[r, c](M || suffix, d)`.
///
/// The configuration is fixed at construction. Each call to one of the `apply`
/// methods runs on its own freshly zeroed permutation state, so a sponge can be
/// shared freely between threads.
///
/// Two sponges compare equal exactly when their bitrate, capacity, suffix, and
/// output length match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sponge {
    bitrate: usize,
    capacity: usize,
    suffix: String,
    output_bits: usize,
    width: Width,
}

impl Sponge {
    /// Create a sponge absorbing `bitrate` bits per block, with `capacity` bits
    /// of hidden state, appending `suffix` to every message, and squeezing out
    /// `output_bits` bits.
    ///
    /// `suffix` is a bitstring such as `"01"`, its first character being the
    /// first bit appended.
    pub fn new(
        bitrate: usize,
        capacity: usize,
        suffix: &str,
        output_bits: usize,
    ) -> Result<Self, Error> {
        validate_bitrate(bitrate)?;
        validate_capacity(capacity)?;
        validate_suffix(suffix)?;
        validate_output_length(output_bits)?;
        let width = Width::from_bits(bitrate + capacity)?;
        Ok(Self {
            bitrate,
            capacity,
            suffix: suffix.into(),
            output_bits,
            width,
        })
    }

    /// A sponge over Keccak-f[1600] with a capacity twice its output length.
    fn over_f1600(output_bits: usize, suffix: &str) -> Self {
        let capacity = 2 * output_bits;
        Self {
            bitrate: Width::W1600.bits() - capacity,
            capacity,
            suffix: suffix.into(),
            output_bits,
            width: Width::W1600,
        }
    }

    pub fn sha3_224() -> Self {
        Self::over_f1600(224, SHA3_SUFFIX)
    }

    pub fn sha3_256() -> Self {
        Self::over_f1600(256, SHA3_SUFFIX)
    }

    pub fn sha3_384() -> Self {
        Self::over_f1600(384, SHA3_SUFFIX)
    }

    pub fn sha3_512() -> Self {
        Self::over_f1600(512, SHA3_SUFFIX)
    }

    /// SHAKE128, producing `output_bits` bits.
    pub fn shake128(output_bits: usize) -> Result<Self, Error> {
        Self::new(1344, 256, SHAKE_SUFFIX, output_bits)
    }

    /// SHAKE256, producing `output_bits` bits.
    pub fn shake256(output_bits: usize) -> Result<Self, Error> {
        Self::new(1088, 512, SHAKE_SUFFIX, output_bits)
    }

    /// Keccak-224 as submitted to the SHA-3 competition, without a suffix.
    pub fn keccak224() -> Self {
        Self::over_f1600(224, "")
    }

    pub fn keccak256() -> Self {
        Self::over_f1600(256, "")
    }

    pub fn keccak384() -> Self {
        Self::over_f1600(384, "")
    }

    pub fn keccak512() -> Self {
        Self::over_f1600(512, "")
    }

    /// The number of bits absorbed or squeezed per block.
    pub fn bitrate(&self) -> usize {
        self.bitrate
    }

    /// The number of bits of state untouched by absorbing and squeezing.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The size of the permutation state, the sum of bitrate and capacity.
    pub fn permutation_width(&self) -> usize {
        self.bitrate + self.capacity
    }

    pub fn lane_length(&self) -> usize {
        self.width.lane_length()
    }

    /// The number of rounds applied per permutation.
    ///
    /// This follows the width of the state, 12 + 2l rounds for lanes of 2^l
    /// bits, rather than using 22 rounds for every width. The two agree only
    /// for a 800 bit state.
    pub fn rounds_per_permutation(&self) -> usize {
        self.width.rounds()
    }

    /// The domain separation suffix, if there is one.
    pub fn suffix(&self) -> Option<&str> {
        if self.suffix.is_empty() {
            None
        } else {
            Some(&self.suffix)
        }
    }

    /// The digest length, in bits.
    pub fn output_length(&self) -> usize {
        self.output_bits
    }

    /// The digest length, in bytes.
    pub fn output_bytes(&self) -> usize {
        ceil_div(self.output_bits, BYTE_BITS)
    }

    /// Hash every bit of `message`.
    pub fn apply(&self, message: &[u8]) -> Vec<u8> {
        let block_bytes = self.bitrate / BYTE_BITS;
        let (blocks, rest) = message.split_at(message.len() - message.len() % block_bytes);
        self.digest(blocks, rest, rest.len() * BYTE_BITS)
    }

    /// Hash the first `message_bits` bits of `message`.
    ///
    /// Bits are taken from each byte starting with the least significant, so a
    /// trailing partial byte contributes its low bits. Anything past
    /// `message_bits` is ignored.
    #[instrument(level = "debug", skip(self, message), fields(sponge = %self))]
    pub fn apply_bits(&self, message_bits: usize, message: &[u8]) -> Result<Vec<u8>, Error> {
        validate_message_length(message, message_bits)?;
        let whole = message_bits / self.bitrate * (self.bitrate / BYTE_BITS);
        let (blocks, rest) = message.split_at(whole);
        Ok(self.digest(blocks, rest, message_bits % self.bitrate))
    }

    /// Hash everything `reader` yields until it reports the end of the stream.
    ///
    /// Full blocks are absorbed as soon as they're read. A stalled reader stalls
    /// the hash, and read errors are returned as is.
    #[cfg(feature = "std")]
    #[instrument(level = "debug", skip_all, fields(sponge = %self))]
    pub fn apply_reader<R: std::io::Read>(&self, mut reader: R) -> Result<Vec<u8>, Error> {
        crate::bits::require_whole_byte_bitrate(self.bitrate)?;
        self.with_state(|state| -> Result<Vec<u8>, Error> {
            let mut block = Zeroizing::new(vec![0u8; self.bitrate / BYTE_BITS]);
            let mut blocks = 0usize;
            let final_bits = loop {
                let read = read_block(&mut reader, &mut block)?;
                if read < self.bitrate {
                    break read;
                }
                state.absorb_bits_into_state(&block, 0, read);
                state.permute();
                blocks += 1;
            };
            tracing::trace!(blocks, final_bits, "absorbed full blocks from stream");
            Ok(self.finish(state, final_bits, block))
        })
    }

    /// Absorb `blocks`, a whole number of blocks, straight from the caller's
    /// buffer, then finish with the first `final_bits` bits of `rest`.
    ///
    /// Bit lengths here never exceed a block, whatever the message size.
    fn digest(&self, blocks: &[u8], rest: &[u8], final_bits: usize) -> Vec<u8> {
        debug_assert!(final_bits < self.bitrate);
        let block_bytes = self.bitrate / BYTE_BITS;
        self.with_state(|state| {
            for block in blocks.chunks_exact(block_bytes) {
                state.absorb_bits_into_state(block, 0, self.bitrate);
                state.permute();
            }
            tracing::trace!(
                blocks = blocks.len() / block_bytes,
                final_bits,
                "absorbed full blocks"
            );
            let mut block = Zeroizing::new(vec![0u8; block_bytes]);
            copy_message_bits(rest, final_bits, &mut block);
            self.finish(state, final_bits, block)
        })
    }

    /// Append the suffix and padding to the `final_bits` message bits at the
    /// front of `block`, absorb the result, and squeeze out the digest.
    fn finish(
        &self,
        state: &mut dyn Permutation,
        final_bits: usize,
        block: Zeroizing<Vec<u8>>,
    ) -> Vec<u8> {
        let mut last = self.final_block(final_bits, block);
        let last_bits = last.len() * BYTE_BITS;
        self.append_suffix(&mut last, final_bits);
        self.pad(&mut last, final_bits, last_bits);
        state.absorb(&last, last_bits, self.bitrate);
        state.squeeze(self.bitrate, self.output_bits)
    }

    /// Run `f` against a new, zeroed state of this sponge's width.
    fn with_state<T>(&self, f: impl FnOnce(&mut dyn Permutation) -> T) -> T {
        match self.width {
            Width::W200 => f(&mut KeccakP::<u8>::new()),
            Width::W400 => f(&mut KeccakP::<u16>::new()),
            Width::W800 => f(&mut KeccakP::<u32>::new()),
            Width::W1600 => f(&mut KeccakP::<u64>::new()),
        }
    }

    /// The shortest length holding the message, the suffix, and the two bits
    /// that pad10*1 always sets.
    fn minimum_padded_length(&self, message_bits: usize) -> usize {
        message_bits + self.suffix.len() + 2
    }

    /// The length of the padded input, the smallest multiple of the bitrate
    /// that fits the minimum padded length.
    pub(crate) fn padded_length(&self, message_bits: usize) -> usize {
        let minimum = self.minimum_padded_length(message_bits);
        ceil_div(minimum, self.bitrate) * self.bitrate
    }

    fn append_suffix(&self, input: &mut [u8], start: usize) {
        for (i, c) in self.suffix.bytes().enumerate() {
            if c == b'1' {
                set_bit_high(input, start + i);
            }
        }
    }

    /// Apply pad10*1 to an input of `input_bits` bits holding a message of
    /// `message_bits` bits followed by the suffix.
    fn pad(&self, input: &mut [u8], message_bits: usize, input_bits: usize) {
        debug_assert!(input_bits >= self.minimum_padded_length(message_bits));
        set_bit_high(input, message_bits + self.suffix.len());
        set_bit_high(input, input_bits - 1);
    }

    /// Make room for the suffix and padding after the last `final_bits` bits
    /// of a message.
    ///
    /// The final block is reused when the suffix and padding fit inside it.
    /// Otherwise the message bits move to a buffer a whole number of blocks
    /// long.
    fn final_block(&self, final_bits: usize, block: Zeroizing<Vec<u8>>) -> Zeroizing<Vec<u8>> {
        if self.minimum_padded_length(final_bits) <= self.bitrate {
            return block;
        }
        let padded = self.padded_length(final_bits);
        tracing::trace!(final_bits, padded, "suffix and padding overflow the final block");
        let mut last = Zeroizing::new(vec![0u8; padded / BYTE_BITS]);
        let used = ceil_div(final_bits, BYTE_BITS);
        last[..used].copy_from_slice(&block[..used]);
        last
    }
}

/// Fill `block` from `reader`, returning the number of bits read.
///
/// A short count means the stream has ended, and the rest of the block is zeroed.
#[cfg(feature = "std")]
fn read_block<R: std::io::Read>(reader: &mut R, block: &mut [u8]) -> Result<usize, Error> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    block[filled..].fill(0);
    Ok(filled * BYTE_BITS)
}

impl fmt::Display for Sponge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak[{}, {}](M", self.bitrate, self.capacity)?;
        if let Some(suffix) = self.suffix() {
            write!(f, " || {}", suffix)?;
        }
        write!(f, ", {})", self.output_bits)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bits::hex_encode;
    use crate::ErrorKind;
    use alloc::string::ToString;

    fn hex_digest(sponge: &Sponge, message: &[u8]) -> String {
        hex_encode(&sponge.apply(message))
    }

    #[test]
    fn test_sha3_empty() {
        assert_eq!(
            hex_digest(&Sponge::sha3_224(), b""),
            "6B4E03423667DBB73B6E15454F0EB1ABD4597F9A1B078E3F5B5A6BC7"
        );
        assert_eq!(
            hex_digest(&Sponge::sha3_256(), b""),
            "A7FFC6F8BF1ED76651C14756A061D662F580FF4DE43B49FA82D80A4B80F8434A"
        );
        assert_eq!(
            hex_digest(&Sponge::sha3_384(), b""),
            "0C63A75B845E4F7D01107D852E4C2485C51A50AAAA94FC61995E71BBEE983A2AC3713831264ADB47FB6BD1E058D5F004"
        );
        assert_eq!(
            hex_digest(&Sponge::sha3_512(), b""),
            "A69F73CCA23A9AC5C8B567DC185A756E97C982164FE25859E0D1DCC1475C80A615B2123AF1F5F94C11E3E9402C3AC558F500199D95B6D3E301758586281DCD26"
        );
    }

    #[test]
    fn test_sha3_abc() {
        assert_eq!(
            hex_digest(&Sponge::sha3_256(), b"abc"),
            "3A985DA74FE225B2045C172D6BD390BD855F086E3E9D525B46BFE24511431532"
        );
        assert_eq!(
            hex_digest(&Sponge::sha3_512(), b"abc"),
            "B751850B1A57168A5693CD924B6B096E08F621827444F70D884F5D0240D2712E10E116E9192AF3C91A7EC57647E3934057340B4CF408D5A56592F8274EEC53F0"
        );
    }

    #[test]
    fn test_sha3_256_five_bit_message() {
        let digest = Sponge::sha3_256().apply_bits(5, &[0x13]).unwrap();
        assert_eq!(
            hex_encode(&digest),
            "7B0047CF5A456882363CBF0FB05322CF65F4B7059A46365E830132E3B5D957AF"
        );
    }

    #[test]
    fn test_sha3_256_multi_block() {
        let message = [0xA3u8; 200];
        assert_eq!(
            hex_digest(&Sponge::sha3_256(), &message),
            "79F38ADEC5C20307A98EF76E8324AFBFD46CFD81B22E3973C65FA1BD9DE31787"
        );
    }

    #[test]
    fn test_shake_empty() {
        assert_eq!(
            hex_digest(&Sponge::shake128(256).unwrap(), b""),
            "7F9C2BA4E88F827D616045507605853ED73B8093F6EFBC88EB1A6EACFA66EF26"
        );
        assert_eq!(
            hex_digest(&Sponge::shake256(512).unwrap(), b""),
            "46B9DD2B0BA88D13233B3FEB743EEB243FCD52EA62B81B82B50C27646ED5762FD75DC4DDD8C0F200CB05019D67B592F6FC821C49479AB48640292EACB3B7C4BE"
        );
    }

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex_digest(&Sponge::keccak256(), b""),
            "C5D2460186F7233C927E7DB2DCC703C0E500B653CA82273B7BFAD8045D85A470"
        );
    }

    #[test]
    fn test_presets_match_generic_constructor() {
        assert_eq!(Sponge::sha3_256(), Sponge::new(1088, 512, "01", 256).unwrap());
        assert_eq!(Sponge::sha3_512(), Sponge::new(576, 1024, "01", 512).unwrap());
        assert_eq!(Sponge::keccak224(), Sponge::new(1152, 448, "", 224).unwrap());
        assert_eq!(Sponge::keccak384(), Sponge::new(832, 768, "", 384).unwrap());
        assert_eq!(Sponge::keccak512(), Sponge::new(576, 1024, "", 512).unwrap());
    }

    #[test]
    fn test_accessors() {
        let sponge = Sponge::new(544, 256, "", 100).unwrap();
        assert_eq!(sponge.bitrate(), 544);
        assert_eq!(sponge.capacity(), 256);
        assert_eq!(sponge.permutation_width(), 800);
        assert_eq!(sponge.lane_length(), 32);
        assert_eq!(sponge.rounds_per_permutation(), 22);
        assert_eq!(sponge.suffix(), None);
        assert_eq!(sponge.output_length(), 100);
        assert_eq!(sponge.output_bytes(), 13);
        assert_eq!(Sponge::sha3_256().suffix(), Some("01"));
        assert_eq!(Sponge::sha3_256().rounds_per_permutation(), 24);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Sponge::new(576, 1024, "", 512).unwrap().to_string(),
            "Keccak[576, 1024](M, 512)"
        );
        assert_eq!(
            Sponge::sha3_256().to_string(),
            "Keccak[1088, 512](M || 01, 256)"
        );
    }

    #[test]
    fn test_equality_and_hash() {
        use std::collections::HashSet;

        let a = Sponge::new(1088, 512, "1111", 300).unwrap();
        let b = Sponge::shake256(300).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.apply(b"message"), b.apply(b"message"));
        assert_ne!(a, Sponge::shake256(301).unwrap());
        assert_ne!(a, Sponge::new(1088, 512, "111", 300).unwrap());

        let set: HashSet<Sponge> = [a, b, Sponge::sha3_256()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_constructor_rejects_bad_configuration() {
        let kind = |r: Result<Sponge, Error>| r.unwrap_err().kind();
        assert_eq!(kind(Sponge::new(0, 1600, "", 8)), ErrorKind::Configuration);
        assert_eq!(kind(Sponge::new(1600, 1, "", 8)), ErrorKind::Configuration);
        assert_eq!(kind(Sponge::new(1084, 516, "", 8)), ErrorKind::Unsupported);
        assert_eq!(kind(Sponge::new(1088, 0, "", 8)), ErrorKind::Configuration);
        assert_eq!(kind(Sponge::new(1088, 512, "012", 8)), ErrorKind::Configuration);
        assert_eq!(kind(Sponge::new(1088, 512, "", 0)), ErrorKind::Configuration);
        assert_eq!(kind(Sponge::new(1088, 500, "", 8)), ErrorKind::Configuration);
        assert_eq!(kind(Sponge::new(64, 36, "", 8)), ErrorKind::Unsupported);
        assert!(matches!(
            Sponge::new(64, 36, "", 8),
            Err(Error::UnsupportedWidth(100))
        ));
        assert!(matches!(
            Sponge::new(1088, 500, "", 8),
            Err(Error::InvalidWidth(1588))
        ));
        assert_eq!(kind(Sponge::shake128(0)), ErrorKind::Configuration);
    }

    #[test]
    fn test_message_length_is_checked() {
        let sponge = Sponge::sha3_256();
        assert!(matches!(
            sponge.apply_bits(25, &[0; 3]),
            Err(Error::MessageTooLong {
                bits: 25,
                available: 24
            })
        ));
        assert_eq!(sponge.apply_bits(24, &[0; 3]).unwrap(), sponge.apply(&[0; 3]));
        assert_eq!(sponge.apply_bits(0, &[0xFF]).unwrap(), sponge.apply(b""));
    }

    #[test]
    fn test_apply_bits_splits_at_block_boundary() {
        let sponge = Sponge::sha3_256();
        let message: Vec<u8> = (0..300).map(|i| (i * 13 + 5) as u8).collect();
        for bits in [1080, 1088, 1096, 2176, 2400] {
            assert_eq!(
                sponge.apply_bits(bits, &message).unwrap(),
                sponge.apply(&message[..bits / 8])
            );
        }
        // Bits of a partial final byte, right after a whole block.
        let mut truncated = message[..137].to_vec();
        truncated[136] &= 0x07;
        assert_eq!(
            sponge.apply_bits(1091, &message).unwrap(),
            sponge.apply_bits(1091, &truncated).unwrap()
        );
    }

    #[test]
    fn test_final_block_grows_past_bitrate() {
        let sponge = Sponge::new(1088, 512, "0101010101", 256).unwrap();
        let block = Zeroizing::new(vec![0x5Au8; 136]);
        assert_eq!(sponge.final_block(1080, block.clone()).len(), 272);
        assert_eq!(sponge.final_block(1076, block).len(), 136);
    }

    #[test]
    fn test_padded_length() {
        let sponge = Sponge::sha3_256();
        assert_eq!(sponge.padded_length(0), 1088);
        assert_eq!(sponge.padded_length(1084), 1088);
        assert_eq!(sponge.padded_length(1085), 2176);
        assert_eq!(sponge.padded_length(1088), 2176);
        let bare = Sponge::keccak256();
        assert_eq!(bare.padded_length(1086), 1088);
        assert_eq!(bare.padded_length(1087), 2176);
    }

    #[test]
    fn test_padding_only_block() {
        // An empty message with no suffix pads to 0x01, zeroes, then 0x80.
        let sponge = Sponge::new(1088, 512, "", 1088).unwrap();
        let mut input = vec![0u8; 136];
        sponge.pad(&mut input, 0, 1088);
        assert_eq!(input[0], 0x01);
        assert_eq!(input[135], 0x80);
        assert!(input[1..135].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_suffix_crossing_byte_boundary() {
        let sponge = Sponge::new(1088, 512, "110101", 256).unwrap();
        let mut input = vec![0u8; 136];
        copy_message_bits(&[0xFF], 5, &mut input);
        sponge.append_suffix(&mut input, 5);
        sponge.pad(&mut input, 5, 1088);
        // Five message bits, then 1, 1, 0, 1, 0, 1, then the first pad bit.
        assert_eq!(input[0], 0b0111_1111);
        assert_eq!(input[1], 0b0000_1101);
        assert_eq!(input[135], 0x80);
    }

    #[test]
    fn test_every_width_hashes() {
        for (bitrate, capacity) in [(40, 160), (144, 256), (544, 256), (1088, 512)] {
            let sponge = Sponge::new(bitrate, capacity, "01", 3 * bitrate + 5).unwrap();
            let digest = sponge.apply(b"the quick brown fox");
            assert_eq!(digest.len(), sponge.output_bytes());
            assert_eq!(digest[digest.len() - 1] & !0x1F, 0);
            assert_ne!(digest, sponge.apply(b"the quick brown fix"));
        }
    }

    #[cfg(feature = "std")]
    struct ChunkReader<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    #[cfg(feature = "std")]
    impl std::io::Read for ChunkReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[cfg(feature = "std")]
    struct BrokenReader;

    #[cfg(feature = "std")]
    impl std::io::Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_reader_matches_buffer() {
        let sponge = Sponge::sha3_256();
        for len in [0, 1, 135, 136, 137, 272, 300] {
            let message: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let expected = sponge.apply(&message);
            assert_eq!(sponge.apply_reader(&message[..]).unwrap(), expected);
            let chunked = ChunkReader {
                data: &message,
                chunk: 5,
            };
            assert_eq!(sponge.apply_reader(chunked).unwrap(), expected);
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_reader_grows_final_block() {
        // 135 bytes leave 8 bits in the block, too few for a 10 bit suffix.
        let sponge = Sponge::new(1088, 512, "0101010101", 256).unwrap();
        let message = [0x5Au8; 135];
        assert_eq!(sponge.padded_length(135 * 8), 2176);
        assert_eq!(
            sponge.apply_reader(&message[..]).unwrap(),
            sponge.apply(&message)
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_reader_error_is_propagated() {
        let err = Sponge::sha3_256().apply_reader(BrokenReader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        match err {
            Error::Io(inner) => assert_eq!(inner.kind(), std::io::ErrorKind::ConnectionReset),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
