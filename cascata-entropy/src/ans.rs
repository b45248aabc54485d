// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `ans` module implements a chunked table-based range asymmetric numeral system (rANS)
//! coder.
//!
//! State lives in `[2^24, 2^64)` and renormalizes 32 bits at a time. Symbols are pushed in
//! reverse order so the decoder pops them forward; the 32-bit renormalization words therefore
//! land in a reversal buffer and are written to the bitstream after the final state, in
//! reverse emission order.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder};
use cascata_core::errors::{decode_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};
use cascata_core::util::entropy::histogram;

use log::debug;

use crate::alphabet::{
    decode_alphabet, decode_frequencies, effective_log_range, encode_alphabet,
    encode_frequencies, normalize_frequencies,
};

/// Lower bound of the coder state.
const ANS_MIN_STATE: u64 = 1 << 24;

/// Chunked rANS encoder.
pub struct AnsEncoder<'a, W: WriteBytes> {
    bw: &'a mut BitWriterLtr<W>,
    chunk_size: usize,
    log_range: u32,
    freqs: [u32; 256],
    scaled: [u32; 256],
    cum_freqs: [u32; 257],
    reversal: Vec<u32>,
}

impl<'a, W: WriteBytes> AnsEncoder<'a, W> {
    /// `chunk_size` of 0 selects one chunk per block; `log_range` must already be validated to
    /// `[8, 16]`.
    pub fn new(bw: &'a mut BitWriterLtr<W>, chunk_size: usize, log_range: u32) -> Self {
        AnsEncoder {
            bw,
            chunk_size,
            log_range,
            freqs: [0; 256],
            scaled: [0; 256],
            cum_freqs: [0; 257],
            reversal: Vec::new(),
        }
    }

    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let lr = effective_log_range(self.log_range, chunk.len());
        let scale = 1u32 << lr;

        self.freqs.fill(0);
        histogram(chunk, &mut self.freqs);

        let alphabet =
            normalize_frequencies(&self.freqs, chunk.len(), scale, &mut self.scaled)?;

        debug!("ans: chunk of {} bytes, {} symbols, scale 2^{}", chunk.len(), alphabet.len(), lr);

        self.cum_freqs[0] = 0;
        for s in 0..256usize {
            self.cum_freqs[s + 1] = self.cum_freqs[s] + self.scaled[s];
        }

        self.bw.write_bits(u64::from(lr - 8), 3)?;
        encode_alphabet(self.bw, &alphabet)?;
        encode_frequencies(self.bw, &self.scaled, &alphabet)?;

        self.reversal.clear();

        let mut x = ANS_MIN_STATE;

        for &b in chunk.iter().rev() {
            let s = usize::from(b);
            let f = u64::from(self.scaled[s]);
            let c = u64::from(self.cum_freqs[s]);

            // Renormalize before the push would overflow the state interval.
            if x >= f << (56 - lr) {
                self.reversal.push(x as u32);
                x >>= 32;
            }

            x = ((x / f) << lr) | ((x % f) + c);
        }

        self.bw.write_bits(x, 64)?;

        for &w in self.reversal.iter().rev() {
            self.bw.write_bits(u64::from(w), 32)?;
        }

        Ok(())
    }
}

impl<'a, W: WriteBytes> EntropyEncoder for AnsEncoder<'a, W> {
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

/// Chunked rANS decoder.
pub struct AnsDecoder<'a, 'b> {
    br: &'a mut BitReaderLtr<'b>,
    chunk_size: usize,
    scaled: [u32; 256],
    cum_freqs: [u32; 257],
    freq_to_symbol: Vec<u16>,
}

impl<'a, 'b> AnsDecoder<'a, 'b> {
    pub fn new(br: &'a mut BitReaderLtr<'b>, chunk_size: usize) -> Self {
        AnsDecoder {
            br,
            chunk_size,
            scaled: [0; 256],
            cum_freqs: [0; 257],
            freq_to_symbol: Vec::new(),
        }
    }

    fn decode_chunk(&mut self, chunk: &mut [u8]) -> Result<()> {
        let lr = self.br.read_bits(3)? as u32 + 8;
        let scale = 1u32 << lr;
        let mask = u64::from(scale) - 1;

        let mut alphabet = [0u8; 256];
        let count = decode_alphabet(self.br, &mut alphabet)?;

        decode_frequencies(self.br, scale, &alphabet[..count], &mut self.scaled)?;

        self.cum_freqs[0] = 0;
        for s in 0..256usize {
            self.cum_freqs[s + 1] = self.cum_freqs[s] + self.scaled[s];
        }

        self.freq_to_symbol.clear();
        self.freq_to_symbol.resize(scale as usize, 0);
        for &s in alphabet[..count].iter() {
            let lo = self.cum_freqs[usize::from(s)] as usize;
            let hi = self.cum_freqs[usize::from(s) + 1] as usize;
            for e in self.freq_to_symbol[lo..hi].iter_mut() {
                *e = u16::from(s);
            }
        }

        let mut x = self.br.read_bits(64)?;

        for b in chunk.iter_mut() {
            let slot = x & mask;
            let s = usize::from(self.freq_to_symbol[slot as usize]);

            *b = s as u8;

            let f = u64::from(self.scaled[s]);
            let c = u64::from(self.cum_freqs[s]);

            x = f * (x >> lr) + slot - c;

            while x < ANS_MIN_STATE {
                x = (x << 32) | self.br.read_bits(32)?;
            }
        }

        // A well-formed chunk unwinds exactly to the encoder's initial state.
        if x != ANS_MIN_STATE {
            return decode_error("ans: state does not return to its seed");
        }

        Ok(())
    }
}

impl<'a, 'b> EntropyDecoder for AnsDecoder<'a, 'b> {
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

        let mut enc = AnsEncoder::new(&mut bw, chunk_size, log_range);
        assert_eq!(enc.encode(data).unwrap(), data.len());
        enc.dispose().unwrap();
        bw.close().unwrap();

        let n = sink.len();

        let mut br = BitReaderLtr::new(&sink);
        let mut out = vec![0u8; data.len()];
        let mut dec = AnsDecoder::new(&mut br, chunk_size);
        assert_eq!(dec.decode(&mut out).unwrap(), data.len());

        assert_eq!(out, data);
        n
    }

    #[test]
    fn verify_ans_skewed_round_trip() {
        let mut data = vec![0u8; 65_536];
        for (i, b) in data.iter_mut().enumerate() {
            *b = match i % 16 {
                0 => 0x31,
                1 | 2 => 0x32,
                _ => 0x30,
            };
        }

        let n = round_trip(&data, 0, 13);
        assert!(n < data.len() / 4);
    }

    #[test]
    fn verify_ans_random_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0xa75);
        let mut data = vec![0u8; 100_000];
        rng.fill_bytes(&mut data);

        round_trip(&data, 32 * 1024, 13);
    }

    #[test]
    fn verify_ans_boundaries() {
        round_trip(&[], 0, 13);
        round_trip(&[0x00], 0, 13);
        round_trip(&[0xff, 0xff], 0, 8);
        round_trip(&vec![0u8; 4096], 1024, 16);
    }

    #[test]
    fn verify_ans_zeros_compact() {
        // 4 KiB of zeros must collapse to almost nothing beyond the per-chunk state.
        let n = round_trip(&vec![0u8; 4096], 0, 13);
        assert!(n <= 16);
    }
}
