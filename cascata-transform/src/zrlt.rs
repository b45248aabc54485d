// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `zrlt` module implements the zero run-length transform, intended for data that has been
//! through a rank or move-to-front stage.
//!
//! A run of `n` zeros is coded as the binary digits of `n + 1` with the most significant bit
//! dropped, one output byte (0 or 1) per digit. Non-zero values shift up by one so the digit
//! bytes stay unambiguous; values `0xFE` and `0xFF` escape to `0xFF` plus the value minus
//! `0xFE` (which lands on a digit byte, read positionally).

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::bits::ilog2_u32;

const MIN_BLOCK_LEN: usize = 16;

#[derive(Default)]
pub struct ZrltCodec;

impl ZrltCodec {
    pub fn new() -> Self {
        ZrltCodec
    }
}

impl ByteTransform for ZrltCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let budget = src.len().min(dst.len());

        let mut src_idx = 0usize;
        let mut dst_idx = 0usize;

        while src_idx < src.len() {
            let v = src[src_idx];

            if v == 0 {
                let mut run = 1u32;
                while src_idx + (run as usize) < src.len()
                    && src[src_idx + run as usize] == 0
                    && run < u32::MAX - 1
                {
                    run += 1;
                }
                src_idx += run as usize;

                // Digits of run + 1 below the dropped most significant bit.
                let m = run + 1;
                let n_digits = ilog2_u32(m);

                if dst_idx + n_digits as usize > budget {
                    return Ok(ForwardStatus::Skipped);
                }

                for k in (0..n_digits).rev() {
                    dst[dst_idx] = ((m >> k) & 1) as u8;
                    dst_idx += 1;
                }
            }
            else {
                let needed = if v >= 0xFE { 2 } else { 1 };

                if dst_idx + needed > budget {
                    return Ok(ForwardStatus::Skipped);
                }

                if v >= 0xFE {
                    dst[dst_idx] = 0xFF;
                    dst[dst_idx + 1] = v - 0xFE;
                }
                else {
                    dst[dst_idx] = v + 1;
                }
                dst_idx += needed;
                src_idx += 1;
            }
        }

        if dst_idx >= src.len() {
            return Ok(ForwardStatus::Skipped);
        }

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: dst_idx }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        let mut src_idx = 0usize;
        let mut dst_idx = 0usize;

        while src_idx < src.len() {
            let b = src[src_idx];

            if b <= 1 {
                // Rebuild the run length digit by digit.
                let mut m = 1u64;
                while src_idx < src.len() && src[src_idx] <= 1 {
                    m = (m << 1) | u64::from(src[src_idx]);
                    src_idx += 1;

                    if m > dst.len() as u64 + 1 {
                        return decode_error("zrlt: zero run overflows the block");
                    }
                }

                let run = (m - 1) as usize;

                if dst_idx + run > dst.len() {
                    return decode_error("zrlt: zero run overflows the block");
                }

                for d in dst[dst_idx..dst_idx + run].iter_mut() {
                    *d = 0;
                }
                dst_idx += run;
            }
            else {
                let v = if b == 0xFF {
                    src_idx += 1;
                    match src.get(src_idx) {
                        Some(&e) if e <= 1 => e + 0xFE,
                        _ => return decode_error("zrlt: bad literal escape"),
                    }
                }
                else {
                    b - 1
                };

                if dst_idx >= dst.len() {
                    return decode_error("zrlt: output overflows the block");
                }

                dst[dst_idx] = v;
                dst_idx += 1;
                src_idx += 1;
            }
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len
    }

    fn name(&self) -> &'static str {
        "ZRLT"
    }
}
