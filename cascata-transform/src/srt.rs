// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `srt` module implements the sorted-ranks transform, a post-BWT re-ranker.
//!
//! Symbols are seeded into rank order by descending frequency (ties by symbol value), then
//! each occurrence emits the symbol's current rank and moves it to the front. A repeated
//! symbol therefore emits 0, and globally common symbols hover near the low ranks. The header
//! is the 4x256-byte big-endian frequency table the decoder needs to rebuild the seed order.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::bits::{read_be_u32, write_be_u32};
use cascata_core::util::entropy::histogram;

/// Size of the frequency-table header.
const HEADER_SIZE: usize = 4 * 256;

const MIN_BLOCK_LEN: usize = HEADER_SIZE;

/// Builds the seed permutation: rank by descending frequency, ties by symbol.
fn seed_order(freqs: &[u32; 256], sym_to_rank: &mut [u8; 256], rank_to_sym: &mut [u8; 256]) {
    let mut order: Vec<u8> = (0..=255u8).collect();
    order.sort_by_key(|&s| (std::cmp::Reverse(freqs[usize::from(s)]), s));

    for (rank, &s) in order.iter().enumerate() {
        sym_to_rank[usize::from(s)] = rank as u8;
        rank_to_sym[rank] = s;
    }
}

#[derive(Default)]
pub struct SrtCodec;

impl SrtCodec {
    pub fn new() -> Self {
        SrtCodec
    }
}

impl ByteTransform for SrtCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        if dst.len() < self.max_encoded_len(src.len()) {
            return Ok(ForwardStatus::Skipped);
        }

        let mut freqs = [0u32; 256];
        histogram(src, &mut freqs);

        for (s, &f) in freqs.iter().enumerate() {
            write_be_u32(&mut dst[4 * s..], f);
        }

        let mut sym_to_rank = [0u8; 256];
        let mut rank_to_sym = [0u8; 256];
        seed_order(&freqs, &mut sym_to_rank, &mut rank_to_sym);

        for (i, &b) in src.iter().enumerate() {
            let r = sym_to_rank[usize::from(b)];

            dst[HEADER_SIZE + i] = r;

            // Move to front: everything ahead of the symbol slips back one rank.
            for k in (1..=usize::from(r)).rev() {
                let moved = rank_to_sym[k - 1];
                rank_to_sym[k] = moved;
                sym_to_rank[usize::from(moved)] = k as u8;
            }
            rank_to_sym[0] = b;
            sym_to_rank[usize::from(b)] = 0;
        }

        Ok(ForwardStatus::Applied(TransformOutput {
            read: src.len(),
            written: src.len() + HEADER_SIZE,
        }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        if src.len() < HEADER_SIZE {
            return decode_error("srt: truncated frequency header");
        }

        let count = src.len() - HEADER_SIZE;

        if dst.len() < count {
            return decode_error("srt: output overflows the block");
        }

        let mut freqs = [0u32; 256];
        for (s, f) in freqs.iter_mut().enumerate() {
            *f = read_be_u32(&src[4 * s..]);
        }

        let mut sym_to_rank = [0u8; 256];
        let mut rank_to_sym = [0u8; 256];
        seed_order(&freqs, &mut sym_to_rank, &mut rank_to_sym);

        for i in 0..count {
            let r = usize::from(src[HEADER_SIZE + i]);
            let b = rank_to_sym[r];

            dst[i] = b;

            for k in (1..=r).rev() {
                let moved = rank_to_sym[k - 1];
                rank_to_sym[k] = moved;
                sym_to_rank[usize::from(moved)] = k as u8;
            }
            rank_to_sym[0] = b;
            sym_to_rank[usize::from(b)] = 0;
        }

        // Documented count convention: read covers the payload plus the header, written is the
        // payload alone.
        Ok(TransformOutput { read: count + HEADER_SIZE, written: count })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len + HEADER_SIZE
    }

    fn name(&self) -> &'static str {
        "SRT"
    }
}
