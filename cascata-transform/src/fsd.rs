// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `fsd` module implements the fixed-step delta transform for sampled or interleaved
//! numeric data (audio, images, tables of little-endian integers).
//!
//! The forward pass tries the steps 1, 2, 3, 4, and 8, estimates the first-order entropy of
//! the XOR residuals over a sample window, and keeps the best step only when it beats the raw
//! entropy by the required margin. Residuals are then coded as the zig-zag of the wrapping
//! byte difference, one byte when the magnitude is at most 127; the one unrepresentable
//! difference (-128) takes an `0xFF` escape followed by the raw source byte.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::bits::{unzigzag_u32_to_i32, zigzag_i32_to_u32};
use cascata_core::util::entropy::first_order_entropy_1024;

use log::debug;

const MIN_BLOCK_LEN: usize = 1024;

/// Candidate distances between a byte and its predictor.
const STEPS: [usize; 5] = [1, 2, 3, 4, 8];

/// Escape marking the one delta outside `[-127, 127]`; the raw source byte follows.
const ESCAPE: u8 = 0xFF;

/// Largest sample window used when the full-block scan is off.
const MAX_SAMPLE_LEN: usize = 64 * 1024;

pub struct FsdCodec {
    full_scan: bool,
}

impl FsdCodec {
    pub fn new(full_scan: bool) -> Self {
        FsdCodec { full_scan }
    }

    /// Picks the step with the lowest residual entropy over the window, and the raw entropy to
    /// beat.
    fn choose_step(&self, src: &[u8]) -> (usize, u32, u32) {
        let window = if self.full_scan || src.len() <= MAX_SAMPLE_LEN {
            src
        }
        else {
            let start = (src.len() - MAX_SAMPLE_LEN) / 2;
            &src[start..start + MAX_SAMPLE_LEN]
        };

        let mut raw = [0u32; 256];
        for &b in window.iter() {
            raw[usize::from(b)] += 1;
        }
        let raw_entropy = first_order_entropy_1024(window.len(), &raw);

        let mut best_step = 0usize;
        let mut best_entropy = u32::MAX;

        for &step in STEPS.iter() {
            if window.len() <= step * 4 {
                continue;
            }

            let mut freqs = [0u32; 256];
            for i in step..window.len() {
                freqs[usize::from(window[i] ^ window[i - step])] += 1;
            }

            let e = first_order_entropy_1024(window.len() - step, &freqs);

            if e < best_entropy {
                best_entropy = e;
                best_step = step;
            }
        }

        (best_step, best_entropy, raw_entropy)
    }
}

impl ByteTransform for FsdCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let (step, delta_entropy, raw_entropy) = self.choose_step(src);

        // The residuals must be clearly cheaper than the original distribution.
        if step == 0 || delta_entropy >= (123 * raw_entropy) >> 7 {
            return Ok(ForwardStatus::Skipped);
        }

        debug!("fsd: step {}, residual entropy {} vs raw {}", step, delta_entropy, raw_entropy);

        let budget = self.max_encoded_len(src.len()).min(dst.len());

        if budget < 1 + step {
            return Ok(ForwardStatus::Skipped);
        }

        dst[0] = step as u8;
        dst[1..1 + step].copy_from_slice(&src[..step]);

        let mut dst_idx = 1 + step;

        for i in step..src.len() {
            let d = src[i].wrapping_sub(src[i - step]) as i8;

            if d != i8::MIN {
                if dst_idx >= budget {
                    return Ok(ForwardStatus::Skipped);
                }
                dst[dst_idx] = zigzag_i32_to_u32(i32::from(d)) as u8;
                dst_idx += 1;
            }
            else {
                if dst_idx + 2 > budget {
                    return Ok(ForwardStatus::Skipped);
                }
                dst[dst_idx] = ESCAPE;
                dst[dst_idx + 1] = src[i];
                dst_idx += 2;
            }
        }

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: dst_idx }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        let step = usize::from(src[0]);

        if !STEPS.contains(&step) || src.len() < 1 + step {
            return decode_error("fsd: bad step header");
        }

        if dst.len() < step {
            return decode_error("fsd: output overflows the block");
        }

        dst[..step].copy_from_slice(&src[1..1 + step]);

        let mut src_idx = 1 + step;
        let mut dst_idx = step;

        while src_idx < src.len() {
            if dst_idx >= dst.len() {
                return decode_error("fsd: output overflows the block");
            }

            let b = src[src_idx];

            if b == ESCAPE {
                src_idx += 1;
                match src.get(src_idx) {
                    Some(&raw) => dst[dst_idx] = raw,
                    None => return decode_error("fsd: truncated escape"),
                }
            }
            else {
                let d = unzigzag_u32_to_i32(u32::from(b)) as u8;
                dst[dst_idx] = dst[dst_idx - step].wrapping_add(d);
            }

            src_idx += 1;
            dst_idx += 1;
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len + (len >> 5) + 16
    }

    fn name(&self) -> &'static str {
        "FSD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8], full_scan: bool) -> Option<(usize, Vec<u8>)> {
        let mut t = FsdCodec::new(full_scan);
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => {
                let mut inv = vec![0u8; data.len()];
                let res = t.inverse(&fwd[..out.written], &mut inv).unwrap();
                assert_eq!(res.written, data.len());
                assert_eq!(&inv[..res.written], data);
                Some((out.written, fwd[..out.written].to_vec()))
            }
            ForwardStatus::Skipped => None,
        }
    }

    #[test]
    fn verify_fsd_alternating_bytes_pick_step_one() {
        let data: Vec<u8> = (0..32_768).map(|i| if i % 2 == 0 { 0x00 } else { 0xFF }).collect();

        let (_, fwd) = round_trip(&data, false).expect("alternating data must not skip");

        // Step 1; every wrapping delta is plus or minus one.
        assert_eq!(fwd[0], 1);
        assert!(fwd[2..].iter().all(|&b| b == 1 || b == 2));
    }

    #[test]
    fn verify_fsd_sawtooth_step_four() {
        // Little-endian u32 counters: byte 0 ramps, bytes 1..3 nearly constant.
        let mut data = Vec::with_capacity(64 * 1024);
        for i in 0u32..16 * 1024 {
            data.extend_from_slice(&i.to_le_bytes());
        }

        let (_, fwd) = round_trip(&data, true).expect("counter data must not skip");
        // Both lattice-aligned steps predict the little-endian counter equally well.
        assert!(fwd[0] == 4 || fwd[0] == 8);
    }

    #[test]
    fn verify_fsd_skips_random() {
        use rand::rngs::SmallRng;
        use rand::{RngCore, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(0xf5d);
        let mut data = vec![0u8; 16_384];
        rng.fill_bytes(&mut data);

        assert!(round_trip(&data, false).is_none());
    }

    #[test]
    fn verify_fsd_length_gate_boundary() {
        let wave: Vec<u8> =
            (0..MIN_BLOCK_LEN).map(|i| if i % 2 == 0 { 0x10 } else { 0x20 }).collect();

        // One byte short of the gate: refused regardless of content.
        assert!(round_trip(&wave[..MIN_BLOCK_LEN - 1], false).is_none());
        // At the gate, the same content runs.
        assert!(round_trip(&wave, false).is_some());

        assert!(round_trip(&[1, 2, 3], false).is_none());
    }
}
