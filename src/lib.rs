#![cfg_attr(not(any(test, feature = "std")), no_std)]
//! A generic Keccak sponge, `Keccak[r, c](M || suffix, d)`, over the Keccak-f
//! permutations of widths 200 through 1600.
//!
//! ```
//! use keccak_sponge::{hex_encode, Sponge};
//!
//! let sponge = Sponge::new(1088, 512, "01", 256)?;
//! assert_eq!(sponge, Sponge::sha3_256());
//! assert_eq!(
//!     hex_encode(&sponge.apply(b"abc")),
//!     "3A985DA74FE225B2045C172D6BD390BD855F086E3E9D525B46BFE24511431532"
//! );
//! # Ok::<(), keccak_sponge::Error>(())
//! ```
extern crate alloc;

pub mod bits;
mod error;
mod keccak_p;
mod sponge;
pub mod state;

pub use crate::bits::hex_encode;
pub use crate::error::{Error, ErrorKind};
pub use crate::keccak_p::{KeccakP, Lane, Width, VALID_WIDTHS};
pub use crate::sponge::Sponge;
