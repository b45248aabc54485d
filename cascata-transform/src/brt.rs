// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `brt` module implements the behemoth rank transform, the heavier sibling of SRT.
//!
//! The rank vector is indexed by symbol and bumped branchlessly on every byte: all ranks below
//! the emitted one are incremented with `ranks[j] -= (ranks[j] - r) >> 31`, then the symbol
//! takes rank 0. The header is the count of present symbols followed by `(symbol, varint)`
//! frequency pairs with 7-bit continuation varints.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::entropy::histogram;

use crate::pack::{decode_varint7, emit_varint7};

const MIN_BLOCK_LEN: usize = 64;

/// Worst-case header: count byte plus 256 pairs of symbol and 5-byte varint.
const MAX_HEADER_SIZE: usize = 1 + 256 * 6;

/// Seeds the rank vector: present symbols by descending frequency (ties by symbol), absent
/// symbols after them in symbol order.
fn seed_ranks(freqs: &[u32; 256], ranks: &mut [i32; 256]) {
    let mut order: Vec<u8> = (0..=255u8).collect();
    order.sort_by_key(|&s| (std::cmp::Reverse(freqs[usize::from(s)]), s));

    for (rank, &s) in order.iter().enumerate() {
        ranks[usize::from(s)] = rank as i32;
    }
}

/// Branchless move-to-front bump: every rank below `r` slips up one, freeing rank 0.
#[inline(always)]
fn bump_ranks(ranks: &mut [i32; 256], r: i32) {
    for j in 0..256 {
        ranks[j] -= (ranks[j] - r) >> 31;
    }
}

#[derive(Default)]
pub struct BrtCodec;

impl BrtCodec {
    pub fn new() -> Self {
        BrtCodec
    }
}

impl ByteTransform for BrtCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let mut freqs = [0u32; 256];
        histogram(src, &mut freqs);

        let mut header = Vec::with_capacity(512);
        let present = freqs.iter().filter(|&&f| f > 0).count();

        header.push((present - 1) as u8);
        for (s, &f) in freqs.iter().enumerate() {
            if f > 0 {
                header.push(s as u8);
                emit_varint7(&mut header, f);
            }
        }

        if dst.len() < header.len() + src.len() {
            return Ok(ForwardStatus::Skipped);
        }

        dst[..header.len()].copy_from_slice(&header);

        let mut ranks = [0i32; 256];
        seed_ranks(&freqs, &mut ranks);

        for (i, &b) in src.iter().enumerate() {
            let r = ranks[usize::from(b)];

            dst[header.len() + i] = r as u8;

            bump_ranks(&mut ranks, r);
            ranks[usize::from(b)] = 0;
        }

        Ok(ForwardStatus::Applied(TransformOutput {
            read: src.len(),
            written: header.len() + src.len(),
        }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        let present = usize::from(src[0]) + 1;
        let mut pos = 1usize;

        let mut freqs = [0u32; 256];
        for _ in 0..present {
            let s = match src.get(pos) {
                Some(&s) => s,
                None => return decode_error("brt: truncated header"),
            };
            pos += 1;

            let f = decode_varint7(src, &mut pos)?;
            if f == 0 {
                return decode_error("brt: zero frequency in header");
            }
            freqs[usize::from(s)] = f;
        }

        let count = src.len() - pos;

        if dst.len() < count {
            return decode_error("brt: output overflows the block");
        }

        let mut ranks = [0i32; 256];
        seed_ranks(&freqs, &mut ranks);

        for i in 0..count {
            let r = i32::from(src[pos + i]);

            // The rank vector is a permutation, so exactly one symbol matches.
            let b = match ranks.iter().position(|&x| x == r) {
                Some(b) => b,
                None => return decode_error("brt: rank not held by any symbol"),
            };

            dst[i] = b as u8;

            bump_ranks(&mut ranks, r);
            ranks[b] = 0;
        }

        Ok(TransformOutput { read: src.len(), written: count })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len + MAX_HEADER_SIZE
    }

    fn name(&self) -> &'static str {
        "BRT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) -> Vec<u8> {
        let mut t = BrtCodec::new();
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        let out = match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => out,
            ForwardStatus::Skipped => panic!("block long enough to transform"),
        };

        let mut inv = vec![0u8; data.len()];
        let res = t.inverse(&fwd[..out.written], &mut inv).unwrap();

        assert_eq!(res.written, data.len());
        assert_eq!(&inv[..res.written], data);

        fwd[..out.written].to_vec()
    }

    #[test]
    fn verify_bump_is_a_conditional_increment() {
        let mut ranks = [0i32; 256];
        for (i, r) in ranks.iter_mut().enumerate() {
            *r = i as i32;
        }

        bump_ranks(&mut ranks, 10);

        for (i, &r) in ranks.iter().enumerate() {
            let expected = if (i as i32) < 10 { i as i32 + 1 } else { i as i32 };
            assert_eq!(r, expected);
        }
    }

    #[test]
    fn verify_brt_round_trip() {
        let data: Vec<u8> =
            (0..10_000).map(|i| [b'x', b'x', b'y', b'x', b'z', b'y'][i % 6]).collect();
        round_trip(&data);
    }

    #[test]
    fn verify_brt_repeats_emit_zero() {
        let data = vec![0x99u8; 256];
        let fwd = round_trip(&data);

        // Header: count byte, symbol, two varint bytes for 256.
        let payload = &fwd[4..];
        assert!(payload.iter().all(|&r| r == 0));
    }

    #[test]
    fn verify_brt_full_alphabet() {
        let data: Vec<u8> = (0..=255u8).cycle().take(9000).collect();
        round_trip(&data);
    }
}
