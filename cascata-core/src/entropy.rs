// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `entropy` module defines the traits every entropy coder and adaptive bit predictor
//! implements. Implementations live in the `cascata-entropy` crate.

use crate::errors::Result;

/// Default number of bytes after which the chunked coders re-estimate their statistics and
/// write a fresh header.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest legal explicit chunk size.
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Largest legal chunk size.
pub const MAX_CHUNK_SIZE: usize = 1 << 30;

/// An `EntropyEncoder` encodes byte buffers into a borrowed bitstream.
///
/// Encoders are chunk-aware: implementations that transmit per-chunk statistics write a header
/// before each chunk of the block. [`EntropyEncoder::dispose`] flushes any residual coder state
/// (pending arithmetic-coder bits); it must be called exactly once, after the last block.
pub trait EntropyEncoder {
    /// Encodes the block, returning the number of bytes consumed.
    fn encode(&mut self, block: &[u8]) -> Result<usize>;

    /// Flushes residual coder state to the bitstream.
    fn dispose(&mut self) -> Result<()>;
}

/// An `EntropyDecoder` decodes byte buffers out of a borrowed bitstream.
///
/// The caller sizes `block` to the exact number of bytes the matching encoder consumed; the
/// decoder fills it completely or fails.
pub trait EntropyDecoder {
    /// Decodes into the block, returning the number of bytes produced.
    fn decode(&mut self, block: &mut [u8]) -> Result<usize>;

    /// Releases any residual decoder state.
    fn dispose(&mut self) -> Result<()>;
}

/// Upper bound of the probability scale used by [`Predictor`].
pub const PREDICTOR_SCALE: u32 = 4096;

/// A `Predictor` is the adaptive model driving a binary arithmetic coder.
///
/// It estimates the probability that the next bit is 1 on a `0..=4096` scale, and is updated
/// with every bit actually observed. After observing the same bit value repeatedly the estimate
/// approaches that extreme of the scale monotonically.
pub trait Predictor {
    /// Returns the probability that the next bit is 1, strictly inside `0..=4096`.
    ///
    /// Takes `&mut self` because mixing models latch the context they computed the estimate
    /// from, for use by the matching [`Predictor::update`] call.
    fn get(&mut self) -> u32;

    /// Updates the model with the bit that was actually coded.
    fn update(&mut self, bit: bool);
}
