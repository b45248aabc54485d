// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `null` module implements the passthrough entropy coder: bytes are copied to the
//! bitstream as 8-bit groups, eight at a time on the fast path.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder};
use cascata_core::errors::Result;
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};

/// Passthrough encoder.
pub struct NullEncoder<'a, W: WriteBytes> {
    bw: &'a mut BitWriterLtr<W>,
}

impl<'a, W: WriteBytes> NullEncoder<'a, W> {
    pub fn new(bw: &'a mut BitWriterLtr<W>) -> Self {
        NullEncoder { bw }
    }
}

impl<'a, W: WriteBytes> EntropyEncoder for NullEncoder<'a, W> {
    fn encode(&mut self, block: &[u8]) -> Result<usize> {
        let mut chunks = block.chunks_exact(8);

        for chunk in &mut chunks {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            self.bw.write_bits(u64::from_be_bytes(word), 64)?;
        }

        for &b in chunks.remainder() {
            self.bw.write_bits(u64::from(b), 8)?;
        }

        Ok(block.len())
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Passthrough decoder.
pub struct NullDecoder<'a, 'b> {
    br: &'a mut BitReaderLtr<'b>,
}

impl<'a, 'b> NullDecoder<'a, 'b> {
    pub fn new(br: &'a mut BitReaderLtr<'b>) -> Self {
        NullDecoder { br }
    }
}

impl<'a, 'b> EntropyDecoder for NullDecoder<'a, 'b> {
    fn decode(&mut self, block: &mut [u8]) -> Result<usize> {
        let len = block.len();
        let mut chunks = block.chunks_exact_mut(8);

        for chunk in &mut chunks {
            let word = self.br.read_bits(64)?;
            chunk.copy_from_slice(&word.to_be_bytes());
        }

        for b in chunks.into_remainder() {
            *b = self.br.read_bits(8)? as u8;
        }

        Ok(len)
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}
