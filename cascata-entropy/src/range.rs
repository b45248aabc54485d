// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `range` module implements a chunked multi-symbol range coder with 60-bit state and
//! 28-bit renormalization.
//!
//! Per chunk the symbol frequencies are scaled to `2^log_range` and transmitted after the
//! alphabet. All register arithmetic wraps; the decoder replays the encoder's `low` register
//! exactly, so the wrapped high bits cancel in the `code - low` offset.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder};
use cascata_core::errors::{decode_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};
use cascata_core::util::entropy::histogram;

use log::debug;

use crate::alphabet::{
    decode_alphabet, decode_frequencies, effective_log_range, encode_alphabet,
    encode_frequencies, normalize_frequencies,
};

const TOP_RANGE: u64 = 0x0FFF_FFFF_FFFF_FFFF;
const BOTTOM_RANGE: u64 = 0x0000_0000_0000_FFFF;
const RANGE_MASK: u64 = 0x0FFF_FFFF_0000_0000;

/// Chunked range encoder.
pub struct RangeEncoder<'a, W: WriteBytes> {
    bw: &'a mut BitWriterLtr<W>,
    chunk_size: usize,
    log_range: u32,
    low: u64,
    range: u64,
    freqs: [u32; 256],
    scaled: [u32; 256],
    cum_freqs: [u32; 257],
}

impl<'a, W: WriteBytes> RangeEncoder<'a, W> {
    /// `chunk_size` of 0 selects one chunk per block; `log_range` must already be validated to
    /// `[8, 16]`.
    pub fn new(bw: &'a mut BitWriterLtr<W>, chunk_size: usize, log_range: u32) -> Self {
        RangeEncoder {
            bw,
            chunk_size,
            log_range,
            low: 0,
            range: TOP_RANGE,
            freqs: [0; 256],
            scaled: [0; 256],
            cum_freqs: [0; 257],
        }
    }

    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let lr = effective_log_range(self.log_range, chunk.len());
        let scale = 1u32 << lr;

        self.freqs.fill(0);
        histogram(chunk, &mut self.freqs);

        let alphabet =
            normalize_frequencies(&self.freqs, chunk.len(), scale, &mut self.scaled)?;

        debug!("range: chunk of {} bytes, {} symbols, scale 2^{}", chunk.len(), alphabet.len(), lr);

        self.cum_freqs[0] = 0;
        for s in 0..256usize {
            self.cum_freqs[s + 1] = self.cum_freqs[s] + self.scaled[s];
        }

        self.bw.write_bits(u64::from(lr - 8), 3)?;
        encode_alphabet(self.bw, &alphabet)?;
        encode_frequencies(self.bw, &self.scaled, &alphabet)?;

        self.low = 0;
        self.range = TOP_RANGE;

        for &b in chunk {
            self.encode_byte(b, lr)?;
        }

        // Flush the final 60 bits of low.
        self.bw.write_bits(self.low, 60)?;

        Ok(())
    }

    fn encode_byte(&mut self, b: u8, lr: u32) -> Result<()> {
        let s = usize::from(b);

        self.range >>= lr;
        self.low = self.low.wrapping_add(u64::from(self.cum_freqs[s]).wrapping_mul(self.range));
        self.range = self.range.wrapping_mul(u64::from(self.scaled[s]));

        // Emit the settled top bits; resolve an underflowed interval by snapping the range to
        // the bottom mask.
        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) & RANGE_MASK != 0 {
                if self.range > BOTTOM_RANGE {
                    break;
                }
                // Keep the range non-zero when low sits exactly on a carry boundary.
                self.range = (self.low.wrapping_neg() & BOTTOM_RANGE).max(1);
            }

            self.bw.write_bits((self.low >> 32) & 0x0FFF_FFFF, 28)?;
            self.range = self.range.wrapping_shl(28);
            self.low = self.low.wrapping_shl(28);
        }

        Ok(())
    }
}

impl<'a, W: WriteBytes> EntropyEncoder for RangeEncoder<'a, W> {
    fn encode(&mut self, block: &[u8]) -> Result<usize> {
        let chunk_size = if self.chunk_size == 0 { block.len().max(1) } else { self.chunk_size };

        for chunk in block.chunks(chunk_size) {
            self.encode_chunk(chunk)?;
        }

        Ok(block.len())
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Chunked range decoder.
pub struct RangeDecoder<'a, 'b> {
    br: &'a mut BitReaderLtr<'b>,
    chunk_size: usize,
    low: u64,
    range: u64,
    code: u64,
    scaled: [u32; 256],
    cum_freqs: [u32; 257],
    freq_to_symbol: Vec<u16>,
}

impl<'a, 'b> RangeDecoder<'a, 'b> {
    pub fn new(br: &'a mut BitReaderLtr<'b>, chunk_size: usize) -> Self {
        RangeDecoder {
            br,
            chunk_size,
            low: 0,
            range: TOP_RANGE,
            code: 0,
            scaled: [0; 256],
            cum_freqs: [0; 257],
            freq_to_symbol: Vec::new(),
        }
    }

    fn decode_chunk(&mut self, chunk: &mut [u8]) -> Result<()> {
        let lr = self.br.read_bits(3)? as u32 + 8;
        let scale = 1u32 << lr;

        let mut alphabet = [0u8; 256];
        let count = decode_alphabet(self.br, &mut alphabet)?;

        decode_frequencies(self.br, scale, &alphabet[..count], &mut self.scaled)?;

        self.cum_freqs[0] = 0;
        for s in 0..256usize {
            self.cum_freqs[s + 1] = self.cum_freqs[s] + self.scaled[s];
        }

        // Frequency-to-symbol table sized to the scale.
        self.freq_to_symbol.clear();
        self.freq_to_symbol.resize(scale as usize, 0);
        for &s in alphabet[..count].iter() {
            let lo = self.cum_freqs[usize::from(s)] as usize;
            let hi = self.cum_freqs[usize::from(s) + 1] as usize;
            for e in self.freq_to_symbol[lo..hi].iter_mut() {
                *e = u16::from(s);
            }
        }

        self.low = 0;
        self.range = TOP_RANGE;
        self.code = self.br.read_bits(60)?;

        for b in chunk.iter_mut() {
            *b = self.decode_byte(lr)?;
        }

        Ok(())
    }

    fn decode_byte(&mut self, lr: u32) -> Result<u8> {
        self.range >>= lr;

        let offset = self.code.wrapping_sub(self.low);
        let count = (offset / self.range) as u64;

        if count >= 1u64 << lr {
            return decode_error("range: symbol count out of range");
        }

        let s = usize::from(self.freq_to_symbol[count as usize]);

        self.low = self.low.wrapping_add(u64::from(self.cum_freqs[s]).wrapping_mul(self.range));
        self.range = self.range.wrapping_mul(u64::from(self.scaled[s]));

        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) & RANGE_MASK != 0 {
                if self.range > BOTTOM_RANGE {
                    break;
                }
                // Keep the range non-zero when low sits exactly on a carry boundary.
                self.range = (self.low.wrapping_neg() & BOTTOM_RANGE).max(1);
            }

            self.code = (self.code.wrapping_shl(28)) | self.br.read_bits(28)?;
            self.range = self.range.wrapping_shl(28);
            self.low = self.low.wrapping_shl(28);
        }

        Ok(s as u8)
    }
}

impl<'a, 'b> EntropyDecoder for RangeDecoder<'a, 'b> {
    fn decode(&mut self, block: &mut [u8]) -> Result<usize> {
        let len = block.len();
        let chunk_size = if self.chunk_size == 0 { len.max(1) } else { self.chunk_size };

        for chunk in block.chunks_mut(chunk_size) {
            self.decode_chunk(chunk)?;
        }

        Ok(len)
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};

    fn round_trip(data: &[u8], chunk_size: usize, log_range: u32) -> usize {
        let mut sink = Vec::new();
        let mut bw = BitWriterLtr::new(&mut sink);

        let mut enc = RangeEncoder::new(&mut bw, chunk_size, log_range);
        assert_eq!(enc.encode(data).unwrap(), data.len());
        enc.dispose().unwrap();
        bw.close().unwrap();

        let n = sink.len();

        let mut br = BitReaderLtr::new(&sink);
        let mut out = vec![0u8; data.len()];
        let mut dec = RangeDecoder::new(&mut br, chunk_size);
        assert_eq!(dec.decode(&mut out).unwrap(), data.len());

        assert_eq!(out, data);
        n
    }

    #[test]
    fn verify_range_skewed_round_trip() {
        let mut data = vec![0u8; 32_768];
        for (i, b) in data.iter_mut().enumerate() {
            *b = if i % 11 == 0 { 0x55 } else { 0x00 };
        }

        let n = round_trip(&data, 0, 13);
        assert!(n < data.len() / 4);
    }

    #[test]
    fn verify_range_random_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut data = vec![0u8; 100_000];
        rng.fill_bytes(&mut data);

        round_trip(&data, 32 * 1024, 13);
    }

    #[test]
    fn verify_range_log_range_extremes() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

        round_trip(&data, 0, 8);
        // 16 is legal at the API and clamped to the 15 the wire format can carry.
        round_trip(&data, 0, 16);
    }

    #[test]
    fn verify_range_boundaries() {
        round_trip(&[], 0, 13);
        round_trip(&[0xaa], 0, 13);
        round_trip(&[1, 2, 3], 0, 13);
        round_trip(&vec![7u8; 4096], 1024, 13);
    }
}
