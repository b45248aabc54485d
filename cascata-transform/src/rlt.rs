// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `rlt` module implements the escape-based run-length transform.
//!
//! The least frequent byte of the block becomes the escape and is transmitted in a one-byte
//! header. A run of four or more copies of a value is coded as the value, the escape, and the
//! varint of `run - 3`; a bare occurrence of the escape byte is coded as `escape, 0`. The run
//! marker always extends the byte emitted immediately before it, so a zero varint is free to
//! mark the literal escape.

use cascata_core::errors::{decode_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::entropy::histogram;

use crate::pack;

const MIN_BLOCK_LEN: usize = 16;

/// Runs of at least this many bytes are worth a marker.
const RUN_THRESHOLD: usize = 4;

#[derive(Default)]
pub struct RltCodec;

impl RltCodec {
    pub fn new() -> Self {
        RltCodec
    }
}

impl ByteTransform for RltCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let mut freqs = [0u32; 256];
        histogram(src, &mut freqs);

        let escape = freqs
            .iter()
            .enumerate()
            .min_by_key(|&(s, &f)| (f, s))
            .map(|(s, _)| s as u8)
            .unwrap_or(0);

        // Output must shrink; anything else is a skip.
        let budget = src.len().min(dst.len());

        let mut dst_idx = 0usize;
        let mut src_idx = 0usize;
        let mut buf = [0u8; 4];

        dst[dst_idx] = escape;
        dst_idx += 1;

        while src_idx < src.len() {
            let v = src[src_idx];

            let mut run = 1usize;
            while src_idx + run < src.len() && src[src_idx + run] == v {
                run += 1;
            }
            src_idx += run;

            while run > 0 {
                if run >= RUN_THRESHOLD {
                    let seg = run.min(3 + pack::MAX_LENGTH);

                    let head = if v == escape { 2 } else { 1 };
                    let n = pack::encode_length(&mut buf, seg - 3);

                    if dst_idx + head + 1 + n > budget {
                        return Ok(ForwardStatus::Skipped);
                    }

                    dst[dst_idx] = v;
                    dst_idx += 1;
                    if v == escape {
                        dst[dst_idx] = 0;
                        dst_idx += 1;
                    }

                    dst[dst_idx] = escape;
                    dst_idx += 1;
                    dst[dst_idx..dst_idx + n].copy_from_slice(&buf[..n]);
                    dst_idx += n;

                    run -= seg;
                }
                else {
                    let head = if v == escape { 2 * run } else { run };

                    if dst_idx + head > budget {
                        return Ok(ForwardStatus::Skipped);
                    }

                    for _ in 0..run {
                        dst[dst_idx] = v;
                        dst_idx += 1;
                        if v == escape {
                            dst[dst_idx] = 0;
                            dst_idx += 1;
                        }
                    }

                    run = 0;
                }
            }
        }

        if dst_idx >= src.len() {
            return Ok(ForwardStatus::Skipped);
        }

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: dst_idx }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        let escape = src[0];

        let mut src_idx = 1usize;
        let mut dst_idx = 0usize;
        let mut prev: Option<u8> = None;

        while src_idx < src.len() {
            let b = src[src_idx];

            if b == escape {
                src_idx += 1;

                let n = pack::decode_length(src, &mut src_idx)?;

                if n == 0 {
                    // Bare escape byte.
                    if dst_idx >= dst.len() {
                        return decode_error("rlt: output overflows the block");
                    }
                    dst[dst_idx] = escape;
                    dst_idx += 1;
                    prev = Some(escape);
                }
                else {
                    let v = match prev {
                        Some(v) => v,
                        None => return decode_error("rlt: run marker with no preceding byte"),
                    };

                    // The first copy was already emitted; n + 3 is the full run.
                    let extend = n + 2;

                    if dst_idx + extend > dst.len() {
                        return decode_error("rlt: run overflows the block");
                    }

                    for d in dst[dst_idx..dst_idx + extend].iter_mut() {
                        *d = v;
                    }
                    dst_idx += extend;
                }
            }
            else {
                if dst_idx >= dst.len() {
                    return decode_error("rlt: output overflows the block");
                }
                dst[dst_idx] = b;
                dst_idx += 1;
                prev = Some(b);
                src_idx += 1;
            }
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len
    }

    fn name(&self) -> &'static str {
        "RLT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) -> Option<usize> {
        let mut t = RltCodec::new();
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
    fn verify_rlt_runs_shrink() {
        let mut data = Vec::new();
        for i in 0..64 {
            data.extend_from_slice(&vec![i as u8; 100]);
        }

        let n = round_trip(&data).expect("runs must not skip");
        assert!(n < data.len() / 8);
    }

    #[test]
    fn verify_rlt_skips_flat_data() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert!(round_trip(&data).is_none());
    }

    #[test]
    fn verify_rlt_escape_collisions() {
        // Every byte value runs exactly four times, so the escape (0, by the tie rule) itself
        // occurs both as a run and must round-trip through the bare-escape form.
        let mut data = Vec::new();
        for b in 0..=255u8 {
            data.extend_from_slice(&[b; 4]);
        }
        data.push(0);

        round_trip(&data).expect("uniform runs must not skip");
    }

    #[test]
    fn verify_rlt_boundaries() {
        assert_eq!(round_trip(&[]), Some(0));
        assert!(round_trip(&[1]).is_none());
        assert!(round_trip(&[1, 2, 3]).is_none());
    }
}
