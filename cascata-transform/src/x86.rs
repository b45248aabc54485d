// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `x86` module implements the executable-code transform.
//!
//! `call`/`jmp` instructions (`0xE8`/`0xE9`) with a near displacement (sign byte `0x00` or
//! `0xFF`) are rewritten from relative to absolute form, so repeated jump targets become
//! repeated byte patterns for the later stages. The rewritten form is the opcode, a sign
//! marker (`0x00` or `0x01`), and the low 24 bits of `position + displacement` whitened by a
//! fixed XOR mask. After an opcode that is not rewritten, a first byte of 0, 1, or 2 is
//! shielded behind the `0x02` escape so the decoder cannot mistake it for a marker. A 4-byte
//! header carries the original length; positions are offsets into the original stream, which
//! the inverse recovers from its output cursor.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::bits::{read_be_u32, write_be_u32};

use log::debug;

const MIN_BLOCK_LEN: usize = 256;

/// Escape shielding a literal 0, 1, or 2 after a jump opcode.
const ESCAPE: u8 = 0x02;

/// Whitening mask applied to the 24-bit absolute address.
const ADDR_MASK: u32 = 0x00A5_5AA5;

const HEADER_SIZE: usize = 4;

#[inline(always)]
fn is_jump(op: u8) -> bool {
    op & 0xFE == 0xE8
}

#[derive(Default)]
pub struct X86Codec;

impl X86Codec {
    pub fn new() -> Self {
        X86Codec
    }

    /// Counts rewritable jumps; the transform only pays off on real code.
    fn count_jumps(src: &[u8]) -> usize {
        let mut count = 0usize;
        let mut i = 0usize;

        while i + 5 <= src.len() {
            if is_jump(src[i]) && (src[i + 4] == 0x00 || src[i + 4] == 0xFF) {
                count += 1;
                i += 5;
            }
            else {
                i += 1;
            }
        }

        count
    }
}

impl ByteTransform for X86Codec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let jumps = Self::count_jumps(src);

        if jumps < src.len() >> 7 {
            debug!("x86: {} jumps in {} bytes, not code", jumps, src.len());
            return Ok(ForwardStatus::Skipped);
        }

        let budget = self.max_encoded_len(src.len()).min(dst.len());

        if budget < HEADER_SIZE {
            return Ok(ForwardStatus::Skipped);
        }

        write_be_u32(dst, src.len() as u32);

        let mut src_idx = 0usize;
        let mut dst_idx = HEADER_SIZE;

        while src_idx < src.len() {
            if dst_idx + 5 > budget {
                return Ok(ForwardStatus::Skipped);
            }

            let op = src[src_idx];

            dst[dst_idx] = op;
            src_idx += 1;
            dst_idx += 1;

            if !is_jump(op) || src_idx + 4 > src.len() {
                continue;
            }

            let sign = src[src_idx + 3];

            if sign == 0x00 || sign == 0xFF {
                // The opcode position anchors the absolute form.
                let pos = (src_idx - 1) as i64;
                let disp = i64::from(i32::from_le_bytes([
                    src[src_idx],
                    src[src_idx + 1],
                    src[src_idx + 2],
                    src[src_idx + 3],
                ]));

                let addr = (((pos + disp) as u32) & 0x00FF_FFFF) ^ ADDR_MASK;

                dst[dst_idx] = u8::from(sign == 0xFF);
                dst[dst_idx + 1] = (addr >> 16) as u8;
                dst[dst_idx + 2] = (addr >> 8) as u8;
                dst[dst_idx + 3] = addr as u8;

                src_idx += 4;
                dst_idx += 4;
            }
            else if src[src_idx] <= ESCAPE {
                // Shield the next literal from being read as a marker.
                dst[dst_idx] = ESCAPE;
                dst[dst_idx + 1] = src[src_idx];

                src_idx += 1;
                dst_idx += 2;
            }
        }

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: dst_idx }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        if src.len() < HEADER_SIZE {
            return decode_error("x86: truncated header");
        }

        let orig_len = read_be_u32(src) as usize;

        if dst.len() < orig_len {
            return decode_error("x86: output overflows the block");
        }

        let mut src_idx = HEADER_SIZE;
        let mut dst_idx = 0usize;

        while src_idx < src.len() {
            if dst_idx >= orig_len {
                return decode_error("x86: output longer than the header claims");
            }

            let op = src[src_idx];

            dst[dst_idx] = op;
            src_idx += 1;
            dst_idx += 1;

            // Mirror of the forward gate: the opcode at original position p was only treated
            // specially when p + 5 <= original length.
            if !is_jump(op) || dst_idx + 4 > orig_len || src_idx >= src.len() {
                continue;
            }

            let marker = src[src_idx];

            if marker <= 0x01 {
                if src_idx + 4 > src.len() {
                    return decode_error("x86: truncated address");
                }

                let addr = ((u32::from(src[src_idx + 1]) << 16)
                    | (u32::from(src[src_idx + 2]) << 8)
                    | u32::from(src[src_idx + 3]))
                    ^ ADDR_MASK;

                let pos = (dst_idx - 1) as i64;
                let diff = (i64::from(addr & 0x00FF_FFFF) - pos).rem_euclid(1 << 24);
                let disp = if marker == 0x01 { diff - (1 << 24) } else { diff };

                let bytes = (disp as i32).to_le_bytes();
                dst[dst_idx..dst_idx + 4].copy_from_slice(&bytes);

                src_idx += 4;
                dst_idx += 4;
            }
            else if marker == ESCAPE {
                if src_idx + 2 > src.len() {
                    return decode_error("x86: truncated escape");
                }

                dst[dst_idx] = src[src_idx + 1];

                src_idx += 2;
                dst_idx += 1;
            }
        }

        if dst_idx != orig_len {
            return decode_error("x86: output shorter than the header claims");
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len + (len >> 1) + 32
    }

    fn name(&self) -> &'static str {
        "X86"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthesizes call-heavy code: filler with embedded E8 relative calls to a handful of
    /// shared targets.
    fn synth_code(len: usize) -> Vec<u8> {
        let mut data = vec![0x90u8; len];
        let targets = [64i64, 1024, 2048, 4096];

        let mut i = 16usize;
        let mut k = 0usize;
        while i + 16 < len {
            let disp = targets[k % targets.len()] - i as i64;
            data[i] = 0xE8;
            data[i + 1..i + 5].copy_from_slice(&(disp as i32).to_le_bytes());
            i += 11;
            k += 1;
        }

        data
    }

    fn round_trip(data: &[u8]) -> Option<Vec<u8>> {
        let mut t = X86Codec::new();
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => {
                let mut inv = vec![0u8; data.len()];
                let res = t.inverse(&fwd[..out.written], &mut inv).unwrap();
                assert_eq!(res.written, data.len());
                assert_eq!(&inv[..res.written], data);
                Some(fwd[..out.written].to_vec())
            }
            ForwardStatus::Skipped => None,
        }
    }

    #[test]
    fn verify_x86_round_trip() {
        let data = synth_code(65_536);
        round_trip(&data).expect("call-heavy code must not skip");
    }

    #[test]
    fn verify_x86_shared_targets_repeat() {
        // Calls to the same target from different sites must rewrite to identical address
        // bytes, which is the whole point of the transform.
        let mut data = vec![0x90u8; 8192];
        for &site in [100usize, 600, 1100, 1600, 2100, 2600, 3100, 3600].iter() {
            let disp = 5000i64 - site as i64;
            data[site] = 0xE8;
            data[site + 1..site + 5].copy_from_slice(&(disp as i32).to_le_bytes());
        }
        // Pad the density gate with more calls.
        let mut i = 4200usize;
        while i + 8 < 8192 {
            let disp = 5000i64 - i as i64;
            data[i] = 0xE9;
            data[i + 1..i + 5].copy_from_slice(&(disp as i32).to_le_bytes());
            i += 64;
        }

        let fwd = round_trip(&data);
        // The density gate needs 64 jumps for 8 KiB; the synthetic block has ~70.
        let fwd = fwd.expect("dense enough to transform");

        // Find two rewritten sites and compare their address bytes.
        let mut addrs = Vec::new();
        let mut i = HEADER_SIZE;
        while i + 5 <= fwd.len() && addrs.len() < 2 {
            if is_jump(fwd[i]) && fwd[i + 1] <= 1 {
                addrs.push([fwd[i + 2], fwd[i + 3], fwd[i + 4]]);
                i += 5;
            }
            else {
                i += 1;
            }
        }

        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0], addrs[1]);
    }

    #[test]
    fn verify_x86_escapes_survive() {
        let mut data = synth_code(32_768);
        // Non-qualifying jumps followed by marker-looking bytes.
        for &site in [7000usize, 7100, 7200].iter() {
            data[site] = 0xE8;
            data[site + 1] = 0x00;
            data[site + 2] = 0x01;
            data[site + 3] = 0x02;
            data[site + 4] = 0x33;
        }

        round_trip(&data).expect("still dense enough to transform");
    }

    #[test]
    fn verify_x86_skips_plain_data() {
        let data: Vec<u8> = (0..=255u8).cycle().take(16_384).collect();
        assert!(round_trip(&data).is_none());
    }
}
