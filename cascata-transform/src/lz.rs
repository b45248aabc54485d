// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `lz` module implements the LZ77 codec with banked hash matching.
//!
//! Two parameter sets share the implementation. The base set uses a 4-byte fingerprint, a
//! 17-bit hash, 17-bit distances, and minimum match 5; the extra set (`LZX`) hashes a 40-bit
//! fingerprint into a 21-bit table, allows 24-bit distances, and drops the minimum match to 4.
//!
//! A sequence is a token `lll_f_mmmm` (3-bit literal length code, distance flag, 4-bit match
//! length code), overflow lengths as varints, and a 2- or 3-byte distance; distance 0 repeats
//! the previous match distance. Tokens, overflow lengths, and distances accumulate in three
//! scratch regions that are interleaved behind a 12-byte header, with the literals last, so
//! the decoder walks four flat cursors.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::bits::{read_be_u32, write_be_u32};

use log::debug;

use crate::pack;

const MIN_BLOCK_LEN: usize = 64;

/// Match length cap, excess over the code maximum goes to the varint stream.
const MAX_MATCH: usize = 32767;

const HEADER_SIZE: usize = 12;

/// Base parameter set.
const HASH_SEED_32: u32 = 0x7FEB_352D;
const HASH_LOG: u32 = 17;
const MIN_MATCH: usize = 5;
const MAX_DIST: usize = (1 << 17) - 1;

/// Extra ("LZX") parameter set.
const HASH_SEED_40: u64 = 0x1E35_A7BD_1E35_A7BD;
const HASH_LOG_X: u32 = 21;
const MIN_MATCH_X: usize = 4;
const MAX_DIST_X: usize = (1 << 24) - 1;

pub struct LzCodec {
    extra: bool,
    /// Two-way banked hash table of positions plus one.
    table: Vec<u32>,
    tokens: Vec<u8>,
    extras: Vec<u8>,
    dists: Vec<u8>,
    lits: Vec<u8>,
}

impl LzCodec {
    pub fn new(extra: bool) -> Self {
        LzCodec {
            extra,
            table: Vec::new(),
            tokens: Vec::new(),
            extras: Vec::new(),
            dists: Vec::new(),
            lits: Vec::new(),
        }
    }

    fn hash_log(&self) -> u32 {
        if self.extra {
            HASH_LOG_X
        }
        else {
            HASH_LOG
        }
    }

    fn min_match(&self) -> usize {
        if self.extra {
            MIN_MATCH_X
        }
        else {
            MIN_MATCH
        }
    }

    fn max_dist(&self) -> usize {
        if self.extra {
            MAX_DIST_X
        }
        else {
            MAX_DIST
        }
    }

    #[inline(always)]
    fn hash(&self, src: &[u8], idx: usize) -> usize {
        if self.extra {
            // 40-bit fingerprint.
            let v = (u64::from(src[idx])
                | (u64::from(src[idx + 1]) << 8)
                | (u64::from(src[idx + 2]) << 16)
                | (u64::from(src[idx + 3]) << 24)
                | (u64::from(src[idx + 4]) << 32))
                .wrapping_mul(HASH_SEED_40);
            (v >> (64 - HASH_LOG_X)) as usize
        }
        else {
            let v = u32::from(src[idx])
                | (u32::from(src[idx + 1]) << 8)
                | (u32::from(src[idx + 2]) << 16)
                | (u32::from(src[idx + 3]) << 24);
            (v.wrapping_mul(HASH_SEED_32) >> (32 - HASH_LOG)) as usize
        }
    }

    fn prepare(&mut self) {
        let size = 2 << self.hash_log();

        if self.table.len() != size {
            self.table.clear();
            self.table.resize(size, 0);
        }
        else {
            self.table.fill(0);
        }

        self.tokens.clear();
        self.extras.clear();
        self.dists.clear();
        self.lits.clear();
    }

    /// Checks both bank slots and returns the longest match at `idx`, then records `idx`.
    #[inline]
    fn find_and_insert(&mut self, src: &[u8], idx: usize) -> Option<(usize, usize)> {
        let h = self.hash(src, idx) << 1;
        let max_dist = self.max_dist();
        let min_match = self.min_match();

        let mut best: Option<(usize, usize)> = None;

        for slot in 0..2usize {
            let entry = self.table[h + slot];
            if entry == 0 {
                continue;
            }

            let pos = (entry - 1) as usize;
            let dist = idx - pos;

            if dist == 0 || dist > max_dist {
                continue;
            }

            let limit = (src.len() - idx).min(MAX_MATCH + min_match);
            let mut len = 0usize;

            while len < limit && src[pos + len] == src[idx + len] {
                len += 1;
            }

            if len >= min_match && best.map_or(true, |(blen, _)| len > blen) {
                best = Some((len, dist));
            }
        }

        self.table[h + 1] = self.table[h];
        self.table[h] = idx as u32 + 1;

        best
    }

    fn emit_sequence(&mut self, lits: &[u8], mlen: usize, dist_code: usize) {
        let min_match = self.min_match();

        let lit_code = lits.len().min(7);
        let m = mlen - min_match;
        let m_code = m.min(15);

        let mut flag = 0usize;
        if self.extra {
            if dist_code >= 1 << 16 {
                flag = 1;
            }
        }
        else {
            flag = (dist_code >> 16) & 1;
        }

        self.tokens.push(((lit_code << 5) | (flag << 4) | m_code) as u8);

        if lit_code == 7 {
            pack::emit_length(&mut self.extras, lits.len() - 7);
        }
        if m_code == 15 {
            pack::emit_length(&mut self.extras, m - 15);
        }

        if self.extra && flag == 1 {
            self.dists.push((dist_code >> 16) as u8);
        }
        self.dists.push((dist_code >> 8) as u8);
        self.dists.push(dist_code as u8);

        self.lits.extend_from_slice(lits);
    }
}

impl Default for LzCodec {
    fn default() -> Self {
        LzCodec::new(false)
    }
}

impl ByteTransform for LzCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        self.prepare();

        let min_match = self.min_match();

        // Leave room to read a full fingerprint at the probe position.
        let probe_end = src.len().saturating_sub(if self.extra { 8 } else { 4 });

        let mut anchor = 0usize;
        let mut idx = 0usize;
        let mut last_dist = 0usize;

        while idx < probe_end {
            let found = self.find_and_insert(src, idx);

            let (mlen, dist) = match found {
                Some(m) => m,
                None => {
                    idx += 1;
                    continue;
                }
            };

            // Literal runs beyond the varint ceiling cannot be represented.
            if idx - anchor > pack::MAX_LENGTH + 7 {
                return Ok(ForwardStatus::Skipped);
            }

            let dist_code = if dist == last_dist { 0 } else { dist };
            last_dist = dist;

            self.emit_sequence(&src[anchor..idx], mlen, dist_code);

            // Feed the skipped positions into the table so close repeats stay findable.
            let stop = (idx + mlen).min(probe_end);
            let mut k = idx + 1;
            while k < stop {
                let h = self.hash(src, k) << 1;
                self.table[h + 1] = self.table[h];
                self.table[h] = k as u32 + 1;
                k += 1;
            }

            idx += mlen;
            anchor = idx;
        }

        if src.len() - anchor > pack::MAX_LENGTH + 7 {
            return Ok(ForwardStatus::Skipped);
        }

        // Tail literals ride without a token.
        self.lits.extend_from_slice(&src[anchor..]);

        let total = HEADER_SIZE
            + self.tokens.len()
            + self.extras.len()
            + self.dists.len()
            + self.lits.len();

        if total >= src.len() || total > dst.len() {
            debug!("lz: no gain ({} -> {})", src.len(), total);
            return Ok(ForwardStatus::Skipped);
        }

        write_be_u32(&mut dst[0..], self.tokens.len() as u32);
        write_be_u32(&mut dst[4..], self.extras.len() as u32);
        write_be_u32(&mut dst[8..], self.dists.len() as u32);

        let mut at = HEADER_SIZE;
        for region in [&self.tokens, &self.extras, &self.dists, &self.lits] {
            dst[at..at + region.len()].copy_from_slice(region);
            at += region.len();
        }

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: total }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        if src.len() < HEADER_SIZE {
            return decode_error("lz: truncated header");
        }

        let n_tokens = read_be_u32(&src[0..]) as usize;
        let n_extras = read_be_u32(&src[4..]) as usize;
        let n_dists = read_be_u32(&src[8..]) as usize;

        let lits_at = HEADER_SIZE
            .checked_add(n_tokens)
            .and_then(|v| v.checked_add(n_extras))
            .and_then(|v| v.checked_add(n_dists))
            .ok_or(cascata_core::errors::Error::InvalidData("lz: region overflow"))?;

        if lits_at > src.len() {
            return decode_error("lz: regions overflow the block");
        }

        let tokens = &src[HEADER_SIZE..HEADER_SIZE + n_tokens];
        let extras = &src[HEADER_SIZE + n_tokens..HEADER_SIZE + n_tokens + n_extras];
        let dists = &src[HEADER_SIZE + n_tokens + n_extras..lits_at];
        let lits = &src[lits_at..];

        let min_match = self.min_match();

        let mut e_idx = 0usize;
        let mut d_idx = 0usize;
        let mut l_idx = 0usize;
        let mut dst_idx = 0usize;
        let mut last_dist = 0usize;

        for &token in tokens {
            let mut lit_len = usize::from(token >> 5);
            if lit_len == 7 {
                lit_len += pack::decode_length(extras, &mut e_idx)?;
            }

            let mut mlen = usize::from(token & 0x0F);
            if mlen == 15 {
                mlen += pack::decode_length(extras, &mut e_idx)?;
            }
            mlen += min_match;

            let flag = usize::from((token >> 4) & 1);

            if l_idx + lit_len > lits.len() || dst_idx + lit_len > dst.len() {
                return decode_error("lz: literal run out of range");
            }
            dst[dst_idx..dst_idx + lit_len].copy_from_slice(&lits[l_idx..l_idx + lit_len]);
            dst_idx += lit_len;
            l_idx += lit_len;

            let dist_bytes = if self.extra && flag == 1 { 3 } else { 2 };
            if d_idx + dist_bytes > dists.len() {
                return decode_error("lz: distance out of range");
            }

            let mut dist_code = 0usize;
            for _ in 0..dist_bytes {
                dist_code = (dist_code << 8) | usize::from(dists[d_idx]);
                d_idx += 1;
            }
            if !self.extra {
                dist_code |= flag << 16;
            }

            let dist = if dist_code == 0 { last_dist } else { dist_code };
            last_dist = dist;

            if dist == 0 || dist > dst_idx || dst_idx + mlen > dst.len() {
                return decode_error("lz: match out of range");
            }

            if dist >= mlen {
                dst.copy_within(dst_idx - dist..dst_idx - dist + mlen, dst_idx);
            }
            else {
                for k in 0..mlen {
                    dst[dst_idx + k] = dst[dst_idx - dist + k];
                }
            }
            dst_idx += mlen;
        }

        // Whatever literals remain belong to the tail.
        let tail = lits.len() - l_idx;
        if dst_idx + tail > dst.len() {
            return decode_error("lz: tail literals out of range");
        }
        dst[dst_idx..dst_idx + tail].copy_from_slice(&lits[l_idx..]);
        dst_idx += tail;

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len
    }

    fn reset(&mut self) {
        self.table.fill(0);
        self.tokens.clear();
        self.extras.clear();
        self.dists.clear();
        self.lits.clear();
    }

    fn name(&self) -> &'static str {
        if self.extra {
            "LZX"
        }
        else {
            "LZ"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};

    fn round_trip(data: &[u8], extra: bool) -> Option<usize> {
        let mut t = LzCodec::new(extra);
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => {
                let mut inv = vec![0u8; data.len()];
                let res = t.inverse(&fwd[..out.written], &mut inv).unwrap();
                assert_eq!(res.written, data.len(), "extra: {}", extra);
                assert_eq!(&inv[..res.written], data);
                Some(out.written)
            }
            ForwardStatus::Skipped => None,
        }
    }

    #[test]
    fn verify_lz_periodic_text_shrinks_hard() {
        let mut data = Vec::new();
        while data.len() < 1 << 20 {
            data.extend_from_slice(b"abc");
        }

        for extra in [false, true] {
            let n = round_trip(&data, extra).expect("periodic data must not skip");
            assert!(n < data.len() / 100, "ratio too poor: {} (extra {})", n, extra);
        }
    }

    #[test]
    fn verify_lz_mixed_content() {
        let mut rng = SmallRng::seed_from_u64(0x17a);
        let mut data = Vec::new();

        // Compressible structure with noisy gaps.
        for i in 0..200usize {
            data.extend_from_slice(b"header: value; ");
            let mut noise = vec![0u8; 16 + (i % 32)];
            rng.fill_bytes(&mut noise);
            data.extend_from_slice(&noise);
        }

        for extra in [false, true] {
            round_trip(&data, extra).expect("structured data must not skip");
        }
    }

    #[test]
    fn verify_lz_skips_random() {
        let mut rng = SmallRng::seed_from_u64(0x900d);
        let mut data = vec![0u8; 65_536];
        rng.fill_bytes(&mut data);

        assert!(round_trip(&data, false).is_none());
        assert!(round_trip(&data, true).is_none());
    }

    #[test]
    fn verify_lz_overlapping_matches() {
        // Single repeated byte forces distance 1 with long overlapping copies.
        let data = vec![0x61u8; 100_000];
        round_trip(&data, false).expect("runs must not skip");
        round_trip(&data, true).expect("runs must not skip");
    }

    #[test]
    fn verify_lz_long_literal_runs() {
        let mut rng = SmallRng::seed_from_u64(0x11ee);

        // A long noisy head (all literals) followed by repeats.
        let mut data = vec![0u8; 4096];
        rng.fill_bytes(&mut data);
        let head = data.clone();
        for _ in 0..16 {
            data.extend_from_slice(&head);
        }

        for extra in [false, true] {
            round_trip(&data, extra).expect("repeated tail must not skip");
        }
    }

    #[test]
    fn verify_lz_boundaries() {
        assert!(round_trip(&[], false).is_some());
        assert!(round_trip(&[1], false).is_none());
        assert!(round_trip(&[1, 2, 3], true).is_none());
    }
}
