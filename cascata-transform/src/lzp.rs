// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `lzp` module implements context-predicted LZ.
//!
//! A 16-bit hash of the four trailing bytes predicts where the current data appeared before.
//! When at least 64 bytes match the prediction, a single `0xFC` escape and a length varint
//! replace them; otherwise the literal passes through, with a literal `0xFC` stuffed by a
//! following `0xFF`. The decoder maintains the same position table over its own output, so no
//! positions are transmitted at all.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};

use crate::pack;

const MIN_BLOCK_LEN: usize = 128;

const MIN_MATCH: usize = 64;

/// Capped so the length varint never starts with `0xFF`, which is the literal-stuffing byte.
/// Longer repeats simply split into back-to-back matches.
const MAX_MATCH: usize = MIN_MATCH + 0xFE + 0xFFFF;

/// Escape introducing a predicted match.
const ESCAPE: u8 = 0xFC;

const HASH_SEED: u32 = 0x7FEB_352D;

const HASH_LOG: u32 = 16;

#[inline(always)]
fn hash(ctx: u32) -> usize {
    (ctx.wrapping_mul(HASH_SEED) >> (32 - HASH_LOG)) as usize
}

#[inline(always)]
fn context(buf: &[u8], idx: usize) -> u32 {
    (u32::from(buf[idx - 4]) << 24)
        | (u32::from(buf[idx - 3]) << 16)
        | (u32::from(buf[idx - 2]) << 8)
        | u32::from(buf[idx - 1])
}

pub struct LzpCodec {
    table: Vec<u32>,
}

impl LzpCodec {
    pub fn new() -> Self {
        LzpCodec { table: Vec::new() }
    }

    fn prepare(&mut self) {
        if self.table.is_empty() {
            self.table.resize(1 << HASH_LOG, 0);
        }
        else {
            self.table.fill(0);
        }
    }
}

impl Default for LzpCodec {
    fn default() -> Self {
        LzpCodec::new()
    }
}

impl ByteTransform for LzpCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        // The transform must shrink the block by a margin to be worth a pipeline stage.
        let budget = (src.len() - (src.len() >> 6)).min(dst.len());

        self.prepare();

        dst[..4].copy_from_slice(&src[..4]);

        let mut ctx = context(src, 4);
        let mut src_idx = 4usize;
        let mut dst_idx = 4usize;
        let mut buf = [0u8; 4];

        while src_idx < src.len() {
            if dst_idx + 6 > budget {
                return Ok(ForwardStatus::Skipped);
            }

            let h = hash(ctx);
            let pos = self.table[h] as usize;
            self.table[h] = src_idx as u32;

            let mut mlen = 0usize;
            let max_len = (src.len() - src_idx).min(MAX_MATCH);

            while mlen < max_len && src[pos + mlen] == src[src_idx + mlen] {
                mlen += 1;
            }

            if mlen >= MIN_MATCH {
                dst[dst_idx] = ESCAPE;
                dst_idx += 1;

                let n = pack::encode_length(&mut buf, mlen - MIN_MATCH);
                dst[dst_idx..dst_idx + n].copy_from_slice(&buf[..n]);
                dst_idx += n;

                src_idx += mlen;
                ctx = context(src, src_idx);
            }
            else {
                let b = src[src_idx];

                dst[dst_idx] = b;
                dst_idx += 1;

                if b == ESCAPE {
                    dst[dst_idx] = 0xFF;
                    dst_idx += 1;
                }

                ctx = (ctx << 8) | u32::from(b);
                src_idx += 1;
            }
        }

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: dst_idx }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.len() <= 4 {
            if dst.len() < src.len() {
                return decode_error("lzp: output overflows the block");
            }
            dst[..src.len()].copy_from_slice(src);
            return Ok(TransformOutput { read: src.len(), written: src.len() });
        }

        self.prepare();

        dst[..4].copy_from_slice(&src[..4]);

        let mut ctx = context(dst, 4);
        let mut src_idx = 4usize;
        let mut dst_idx = 4usize;

        while src_idx < src.len() {
            let h = hash(ctx);
            let pos = self.table[h] as usize;
            self.table[h] = dst_idx as u32;

            let b = src[src_idx];

            if b == ESCAPE {
                src_idx += 1;

                match src.get(src_idx) {
                    Some(0xFF) => {
                        if dst_idx >= dst.len() {
                            return decode_error("lzp: output overflows the block");
                        }
                        dst[dst_idx] = ESCAPE;
                        ctx = (ctx << 8) | u32::from(ESCAPE);
                        dst_idx += 1;
                        src_idx += 1;
                    }
                    Some(_) => {
                        let mlen = MIN_MATCH + pack::decode_length(src, &mut src_idx)?;

                        if dst_idx + mlen > dst.len() {
                            return decode_error("lzp: match overflows the block");
                        }

                        // Overlapping self-copy, so strictly byte by byte.
                        for k in 0..mlen {
                            dst[dst_idx + k] = dst[pos + k];
                        }

                        dst_idx += mlen;
                        ctx = context(dst, dst_idx);
                    }
                    None => return decode_error("lzp: truncated escape"),
                }
            }
            else {
                if dst_idx >= dst.len() {
                    return decode_error("lzp: output overflows the block");
                }

                dst[dst_idx] = b;
                ctx = (ctx << 8) | u32::from(b);
                dst_idx += 1;
                src_idx += 1;
            }
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len
    }

    fn reset(&mut self) {
        self.table.fill(0);
    }

    fn name(&self) -> &'static str {
        "LZP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) -> Option<usize> {
        let mut t = LzpCodec::new();
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => {
                let mut inv = vec![0u8; data.len()];
                let res = t.inverse(&fwd[..out.written], &mut inv).unwrap();
                assert_eq!(res.written, data.len());
                assert_eq!(&inv[..res.written], data);
                Some(out.written)
            }
            ForwardStatus::Skipped => None,
        }
    }

    #[test]
    fn verify_lzp_long_repeats_shrink() {
        let phrase: Vec<u8> = (b"the quick brown fox jumps over the lazy dog. ").to_vec();
        let mut data = Vec::new();
        while data.len() < 100_000 {
            data.extend_from_slice(&phrase);
        }

        let n = round_trip(&data).expect("repetitive data must not skip");
        assert!(n < data.len() / 10);
    }

    #[test]
    fn verify_lzp_skips_random() {
        use rand::rngs::SmallRng;
        use rand::{RngCore, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(0x12f);
        let mut data = vec![0u8; 32_768];
        rng.fill_bytes(&mut data);

        assert!(round_trip(&data).is_none());
    }

    #[test]
    fn verify_lzp_escape_stuffing() {
        let mut data = vec![0xFCu8; 4096];
        // Break the run so the matcher sees both stuffed literals and matches.
        data[1000] = 0x00;
        data[3000] = 0x11;

        round_trip(&data).expect("long escape runs still match");
    }

    #[test]
    fn verify_lzp_short_input_skips() {
        assert!(round_trip(&[1, 2, 3, 4, 5]).is_none());
    }
}
