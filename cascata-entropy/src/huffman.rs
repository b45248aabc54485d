// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `huffman` module implements a chunked canonical Huffman coder.
//!
//! Per chunk the encoder computes symbol frequencies, derives minimum-redundancy code lengths
//! with the in-place Moffat-Katajainen algorithm (capped at 24 bits by iterative frequency
//! scaling), and transmits the alphabet followed by the code-length deltas as signed
//! Exp-Golomb values. Codes are canonical: codes of equal length are consecutive integers, so
//! the decoder rebuilds the assignment from the lengths alone and drives a 12-bit fast lookup
//! table, falling back to a per-length scan for longer codes.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder};
use cascata_core::errors::{decode_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};
use cascata_core::util::entropy::histogram;

use log::debug;

use crate::alphabet::{decode_alphabet, encode_alphabet};
use crate::expgolomb;

/// Longest canonical code transmitted.
const MAX_CODE_LEN: u32 = 24;

/// Width of the fast decoding table lookup.
const FAST_BITS: u32 = 12;

/// Sentinel fast-table entry: the code is longer than [`FAST_BITS`].
const FAST_NONE: u16 = u16::MAX;

/// Computes minimum-redundancy code lengths in place.
///
/// On entry `a` holds frequencies sorted ascending; on return it holds the code length of each
/// entry. This is the three-pass in-place algorithm of Moffat and Katajainen.
fn compute_code_lengths(a: &mut [u32]) {
    let n = a.len();

    if n == 1 {
        a[0] = 1;
        return;
    }

    // First pass: build the tree bottom-up, overwriting freed slots with parent indices.
    a[0] += a[1];

    let mut root = 0usize;
    let mut leaf = 2usize;

    for next in 1..n - 1 {
        if leaf >= n || a[root] < a[leaf] {
            a[next] = a[root];
            a[root] = next as u32;
            root += 1;
        }
        else {
            a[next] = a[leaf];
            leaf += 1;
        }

        if leaf >= n || (root < next && a[root] < a[leaf]) {
            a[next] += a[root];
            a[root] = next as u32;
            root += 1;
        }
        else {
            a[next] += a[leaf];
            leaf += 1;
        }
    }

    // Second pass: convert parent pointers into depths.
    a[n - 2] = 0;

    for next in (0..n.saturating_sub(2)).rev() {
        a[next] = a[a[next] as usize] + 1;
    }

    // Third pass: assign depths to the leaves.
    let mut avail = 1i32;
    let mut used = 0i32;
    let mut depth = 0u32;
    let mut root = n as i32 - 2;
    let mut next = n as i32 - 1;

    while avail > 0 {
        while root >= 0 && a[root as usize] == depth {
            used += 1;
            root -= 1;
        }
        while avail > used {
            a[next as usize] = depth;
            next -= 1;
            avail -= 1;
        }
        avail = 2 * used;
        depth += 1;
        used = 0;
    }
}

/// Derives capped canonical code lengths for the chunk.
///
/// `lengths[s]` is 0 for absent symbols. Returns the sorted alphabet.
fn compute_chunk_lengths(freqs: &[u32; 256], lengths: &mut [u8; 256]) -> Vec<u8> {
    let mut alphabet: Vec<u8> =
        (0..=255u8).filter(|&s| freqs[usize::from(s)] > 0).collect();

    // Sort by ascending frequency, ties by symbol, for the in-place sizing.
    alphabet.sort_by_key(|&s| (freqs[usize::from(s)], s));

    let mut work: Vec<u32> = Vec::with_capacity(alphabet.len());
    let mut scaled: Vec<u32> = alphabet.iter().map(|&s| freqs[usize::from(s)]).collect();

    loop {
        work.clear();
        work.extend_from_slice(&scaled);

        compute_code_lengths(&mut work);

        // The last entry is the most frequent and therefore holds the shallowest depth; the
        // first holds the deepest.
        if work.first().map_or(0, |&d| d.max(1)) <= MAX_CODE_LEN {
            break;
        }

        // Halve the dynamic range of the frequencies and retry.
        for f in scaled.iter_mut() {
            *f = (*f >> 1).max(1);
        }
    }

    lengths.fill(0);

    for (i, &s) in alphabet.iter().enumerate() {
        lengths[usize::from(s)] = work[i].max(1) as u8;
    }

    alphabet.sort_unstable();
    alphabet
}

/// Assigns canonical codes from lengths.
///
/// Symbols are ordered by (length, symbol); codes of equal length are consecutive.
fn assign_canonical_codes(lengths: &[u8; 256], codes: &mut [u32; 256]) {
    let mut order: Vec<u8> =
        (0..=255u8).filter(|&s| lengths[usize::from(s)] > 0).collect();
    order.sort_by_key(|&s| (lengths[usize::from(s)], s));

    let mut code = 0u32;
    let mut prev_len = 0u8;

    codes.fill(0);

    for &s in order.iter() {
        let len = lengths[usize::from(s)];
        code <<= len - prev_len;
        codes[usize::from(s)] = code;
        code += 1;
        prev_len = len;
    }
}

/// Chunked canonical Huffman encoder.
pub struct HuffmanEncoder<'a, W: WriteBytes> {
    bw: &'a mut BitWriterLtr<W>,
    chunk_size: usize,
    freqs: [u32; 256],
    lengths: [u8; 256],
    codes: [u32; 256],
}

impl<'a, W: WriteBytes> HuffmanEncoder<'a, W> {
    /// `chunk_size` of 0 selects one chunk per block.
    pub fn new(bw: &'a mut BitWriterLtr<W>, chunk_size: usize) -> Self {
        HuffmanEncoder {
            bw,
            chunk_size,
            freqs: [0; 256],
            lengths: [0; 256],
            codes: [0; 256],
        }
    }

    fn encode_chunk_header(&mut self, alphabet: &[u8]) -> Result<()> {
        encode_alphabet(self.bw, alphabet)?;

        // Code lengths as deltas in symbol order, compressed with signed Exp-Golomb.
        let mut prev = 0i32;
        for &s in alphabet {
            let len = i32::from(self.lengths[usize::from(s)]);
            expgolomb::encode_value(self.bw, (len - prev) as i8 as u8)?;
            prev = len;
        }

        Ok(())
    }

    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.freqs.fill(0);
        histogram(chunk, &mut self.freqs);

        let alphabet = compute_chunk_lengths(&self.freqs, &mut self.lengths);
        assign_canonical_codes(&self.lengths, &mut self.codes);

        debug!("huffman: chunk of {} bytes, {} symbols", chunk.len(), alphabet.len());

        self.encode_chunk_header(&alphabet)?;

        for &b in chunk {
            let s = usize::from(b);
            self.bw.write_bits(u64::from(self.codes[s]), u32::from(self.lengths[s]))?;
        }

        Ok(())
    }
}

impl<'a, W: WriteBytes> EntropyEncoder for HuffmanEncoder<'a, W> {
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

/// Per-length canonical decoding state for codes longer than [`FAST_BITS`].
#[derive(Default)]
struct SlowTables {
    /// First canonical code value of each length, `1..=24`.
    first_code: [u32; MAX_CODE_LEN as usize + 1],
    /// Index into `symbols` of the first code of each length.
    first_index: [u16; MAX_CODE_LEN as usize + 1],
    /// Number of codes of each length.
    count: [u16; MAX_CODE_LEN as usize + 1],
    /// Symbols in canonical (length, symbol) order.
    symbols: Vec<u8>,
}

/// Chunked canonical Huffman decoder.
pub struct HuffmanDecoder<'a, 'b> {
    br: &'a mut BitReaderLtr<'b>,
    chunk_size: usize,
    lengths: [u8; 256],
    fast: Vec<u16>,
    slow: SlowTables,
}

impl<'a, 'b> HuffmanDecoder<'a, 'b> {
    pub fn new(br: &'a mut BitReaderLtr<'b>, chunk_size: usize) -> Self {
        HuffmanDecoder {
            br,
            chunk_size,
            lengths: [0; 256],
            fast: vec![FAST_NONE; 1 << FAST_BITS],
            slow: SlowTables::default(),
        }
    }

    fn decode_chunk_header(&mut self) -> Result<()> {
        let mut alphabet = [0u8; 256];
        let count = decode_alphabet(self.br, &mut alphabet)?;

        self.lengths.fill(0);

        let mut prev = 0i32;
        for &s in alphabet[..count].iter() {
            let delta = i32::from(expgolomb::decode_value(self.br)? as i8);
            let len = prev + delta;

            if len < 1 || len > MAX_CODE_LEN as i32 {
                return decode_error("huffman: code length out of range");
            }

            self.lengths[usize::from(s)] = len as u8;
            prev = len;
        }

        self.rebuild_tables()
    }

    fn rebuild_tables(&mut self) -> Result<()> {
        let mut order: Vec<u8> =
            (0..=255u8).filter(|&s| self.lengths[usize::from(s)] > 0).collect();
        order.sort_by_key(|&s| (self.lengths[usize::from(s)], s));

        self.fast.fill(FAST_NONE);

        let slow = &mut self.slow;
        slow.first_code.fill(0);
        slow.first_index.fill(0);
        slow.count.fill(0);
        slow.symbols.clear();
        slow.symbols.extend_from_slice(&order);

        let mut code = 0u64;
        let mut prev_len = 0u8;

        for (i, &s) in order.iter().enumerate() {
            let len = self.lengths[usize::from(s)];
            code <<= len - prev_len;

            // A canonical code set that overflows its length space is malformed.
            if code >= 1u64 << len {
                return decode_error("huffman: invalid canonical code set");
            }

            if slow.count[usize::from(len)] == 0 {
                slow.first_code[usize::from(len)] = code as u32;
                slow.first_index[usize::from(len)] = i as u16;
            }
            slow.count[usize::from(len)] += 1;

            if u32::from(len) <= FAST_BITS {
                // Every FAST_BITS-wide word starting with this code maps to the symbol.
                let shift = FAST_BITS - u32::from(len);
                let base = ((code as u32) << shift) as usize;
                let entry = (u16::from(s) << 4) | u16::from(len);

                for e in self.fast[base..base + (1 << shift)].iter_mut() {
                    *e = entry;
                }
            }

            code += 1;
            prev_len = len;
        }

        Ok(())
    }

    fn decode_symbol(&mut self) -> Result<u8> {
        let peek = self.br.peek_bits(FAST_BITS) as usize;
        let entry = self.fast[peek];

        if entry != FAST_NONE {
            self.br.consume_bits(u32::from(entry) & 0xf)?;
            return Ok((entry >> 4) as u8);
        }

        // Long code: extend bit by bit past the fast prefix.
        let mut code = 0u32;

        for len in 1..=MAX_CODE_LEN {
            code = (code << 1) | self.br.read_bit()?;

            let l = len as usize;
            if self.slow.count[l] > 0 {
                let offset = code.wrapping_sub(self.slow.first_code[l]);
                if offset < u32::from(self.slow.count[l]) {
                    let idx = usize::from(self.slow.first_index[l]) + offset as usize;
                    return Ok(self.slow.symbols[idx]);
                }
            }
        }

        decode_error("huffman: code longer than 24 bits")
    }

    fn decode_chunk(&mut self, chunk: &mut [u8]) -> Result<()> {
        self.decode_chunk_header()?;

        for b in chunk.iter_mut() {
            *b = self.decode_symbol()?;
        }

        Ok(())
    }
}

impl<'a, 'b> EntropyDecoder for HuffmanDecoder<'a, 'b> {
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

    fn round_trip(data: &[u8], chunk_size: usize) -> usize {
        let mut sink = Vec::new();
        let mut bw = BitWriterLtr::new(&mut sink);

        let mut enc = HuffmanEncoder::new(&mut bw, chunk_size);
        assert_eq!(enc.encode(data).unwrap(), data.len());
        enc.dispose().unwrap();
        bw.close().unwrap();

        let n = sink.len();

        let mut br = BitReaderLtr::new(&sink);
        let mut out = vec![0u8; data.len()];
        let mut dec = HuffmanDecoder::new(&mut br, chunk_size);
        assert_eq!(dec.decode(&mut out).unwrap(), data.len());

        assert_eq!(out, data);
        n
    }

    #[test]
    fn verify_code_lengths_sorted_input() {
        // Frequencies from the Moffat-Katajainen paper example.
        let mut a = [1u32, 1, 5, 7, 10, 14];
        compute_code_lengths(&mut a);

        // Kraft equality must hold for a minimum-redundancy code.
        let kraft: f64 = a.iter().map(|&l| (0.5f64).powi(l as i32)).sum();
        assert!((kraft - 1.0).abs() < 1e-9);

        // Rarest symbols get the longest codes.
        assert!(a[0] >= a[5]);
    }

    #[test]
    fn verify_huffman_skewed_round_trip() {
        let mut data = Vec::new();
        for i in 0..4096usize {
            // Exponentially skewed distribution.
            let b = (i.trailing_zeros().min(7)) as u8;
            data.push(b);
        }

        let n = round_trip(&data, 0);
        // Two-ish symbols dominate; output must be far below 1 byte per symbol.
        assert!(n < data.len() / 2);
    }

    #[test]
    fn verify_huffman_random_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0x1db7);
        let mut data = vec![0u8; 100_000];
        rng.fill_bytes(&mut data);

        round_trip(&data, 16 * 1024);
    }

    #[test]
    fn verify_huffman_boundaries() {
        round_trip(&[], 0);
        round_trip(&[0x61], 0);
        round_trip(&[0x61, 0x61], 0);
        round_trip(&[0x61, 0x62, 0x63], 1024);
        round_trip(&vec![0u8; 70_000], 0);
    }
}
