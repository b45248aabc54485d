// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `binary` module implements a bit-by-bit arithmetic coder generic over the
//! [`Predictor`] capability.
//!
//! The coder keeps 56-bit `low`/`high` registers and flushes 32 bits whenever the top 32 bits
//! of the interval agree. The decoder mirrors the register discipline with an additional
//! `current` register holding the next 56 bits of the code value, primed lazily so an empty
//! block costs zero bits.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder, Predictor};
use cascata_core::errors::Result;
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};

const TOP: u64 = 0x00FF_FFFF_FFFF_FFFF;
const MASK_24_56: u64 = 0x00FF_FFFF_FF00_0000;
const MASK_0_24: u64 = 0x0000_0000_00FF_FFFF;
const MASK_0_32: u64 = 0x0000_0000_FFFF_FFFF;

/// Binary arithmetic encoder driven by a predictor.
pub struct BinaryEntropyEncoder<'a, W: WriteBytes, P: Predictor> {
    bw: &'a mut BitWriterLtr<W>,
    predictor: P,
    low: u64,
    high: u64,
    started: bool,
}

impl<'a, W: WriteBytes, P: Predictor> BinaryEntropyEncoder<'a, W, P> {
    pub fn new(bw: &'a mut BitWriterLtr<W>, predictor: P) -> Self {
        BinaryEntropyEncoder { bw, predictor, low: 0, high: TOP, started: false }
    }

    /// Gets a mutable reference to the predictor, for callers that steer its context from
    /// outside the coded bit stream.
    pub fn predictor_mut(&mut self) -> &mut P {
        &mut self.predictor
    }

    /// Encodes one bit under the predictor's current estimate.
    #[inline(always)]
    pub fn encode_bit(&mut self, bit: bool) -> Result<()> {
        self.started = true;

        let p = self.predictor.get();
        debug_assert!(p >= 1 && p < 4096);

        // The interval for a 1 bit is [low, split]; for a 0 bit, [split + 1, high].
        let split = self.low + ((((self.high - self.low) >> 4) * u64::from(p)) >> 8);

        if bit {
            self.high = split;
        }
        else {
            self.low = split + 1;
        }

        self.predictor.update(bit);

        while (self.low ^ self.high) & MASK_24_56 == 0 {
            self.bw.write_bits((self.high >> 24) & MASK_0_32, 32)?;
            self.low = (self.low << 32) & TOP;
            self.high = ((self.high << 32) & TOP) | MASK_0_32;
        }

        Ok(())
    }
}

impl<'a, W: WriteBytes, P: Predictor> EntropyEncoder for BinaryEntropyEncoder<'a, W, P> {
    fn encode(&mut self, block: &[u8]) -> Result<usize> {
        for &b in block {
            for i in (0..8).rev() {
                self.encode_bit((b >> i) & 1 == 1)?;
            }
        }

        Ok(block.len())
    }

    fn dispose(&mut self) -> Result<()> {
        // Nothing was coded, so the decoder never primes and needs no tail.
        if self.started {
            self.bw.write_bits((self.low | MASK_0_24) & TOP, 56)?;
            self.started = false;
        }
        Ok(())
    }
}

/// Binary arithmetic decoder driven by a predictor.
pub struct BinaryEntropyDecoder<'a, 'b, P: Predictor> {
    br: &'a mut BitReaderLtr<'b>,
    predictor: P,
    low: u64,
    high: u64,
    current: u64,
    primed: bool,
}

impl<'a, 'b, P: Predictor> BinaryEntropyDecoder<'a, 'b, P> {
    pub fn new(br: &'a mut BitReaderLtr<'b>, predictor: P) -> Self {
        BinaryEntropyDecoder { br, predictor, low: 0, high: TOP, current: 0, primed: false }
    }

    /// Gets a mutable reference to the predictor, for callers that steer its context from
    /// outside the coded bit stream.
    pub fn predictor_mut(&mut self) -> &mut P {
        &mut self.predictor
    }

    /// Decodes one bit under the predictor's current estimate.
    #[inline(always)]
    pub fn decode_bit(&mut self) -> Result<bool> {
        self.prime()?;

        let p = self.predictor.get();

        let split = self.low + ((((self.high - self.low) >> 4) * u64::from(p)) >> 8);

        let bit = self.current <= split;

        if bit {
            self.high = split;
        }
        else {
            self.low = split + 1;
        }

        self.predictor.update(bit);

        while (self.low ^ self.high) & MASK_24_56 == 0 {
            self.low = (self.low << 32) & TOP;
            self.high = ((self.high << 32) & TOP) | MASK_0_32;
            self.current = ((self.current << 32) & TOP) | self.br.read_bits(32)?;
        }

        Ok(bit)
    }

    fn prime(&mut self) -> Result<()> {
        if !self.primed {
            self.current = self.br.read_bits(56)?;
            self.primed = true;
        }
        Ok(())
    }
}

impl<'a, 'b, P: Predictor> EntropyDecoder for BinaryEntropyDecoder<'a, 'b, P> {
    fn decode(&mut self, block: &mut [u8]) -> Result<usize> {
        if block.is_empty() {
            return Ok(0);
        }

        for b in block.iter_mut() {
            let mut v = 0u8;
            for _ in 0..8 {
                v = (v << 1) | u8::from(self.decode_bit()?);
            }
            *b = v;
        }

        Ok(block.len())
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}
