// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `block` module combines a transform sequence and an entropy coder into the per-block
//! pipeline a container writer drives.
//!
//! One `BlockCodec` instance serves one worker: it owns its transform scratch and its two
//! ping-pong buffers and reuses them across blocks. The container is expected to record, per
//! block, the skip mask, the transformed length, and the original length from
//! [`BlockSummary`]; decoding takes the same three values back.

use cascata_core::errors::{buffer_too_small_error, decode_error, param_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr};
use cascata_core::params::CodecParams;
use cascata_core::transform::TransformSequence;

use log::debug;

use crate::factory::{new_entropy_decoder, new_entropy_encoder, new_sequence};
use crate::id::{EntropyCodecId, TransformId};

/// Per-block fields the container must persist for the inverse pipeline.
#[derive(Copy, Clone, Debug)]
pub struct BlockSummary {
    /// Bit `i` set means stage `i` was skipped and must be skipped again on inverse.
    pub skip_mask: u8,
    /// Length of the transformed data fed to the entropy coder.
    pub transformed_len: usize,
    /// Bytes of entropy-coded payload appended to the sink.
    pub payload_len: usize,
}

/// A complete compression pipeline for one worker.
pub struct BlockCodec {
    entropy_id: EntropyCodecId,
    params: CodecParams,
    seq: TransformSequence,
    buf_a: Vec<u8>,
    buf_b: Vec<u8>,
}

impl BlockCodec {
    pub fn new(
        transform_ids: &[TransformId],
        entropy_id: EntropyCodecId,
        params: CodecParams,
    ) -> Result<Self> {
        Ok(BlockCodec {
            entropy_id,
            params,
            seq: new_sequence(transform_ids, &params)?,
            buf_a: Vec::new(),
            buf_b: Vec::new(),
        })
    }

    /// Compresses one block, appending the entropy-coded payload to `out`.
    pub fn encode_block(&mut self, src: &[u8], out: &mut Vec<u8>) -> Result<BlockSummary> {
        if src.len() > self.params.block_size() {
            return param_error("block: input longer than the configured block size");
        }

        let cap = self.seq.max_encoded_len(src.len());

        self.buf_a.clear();
        self.buf_a.extend_from_slice(src);
        self.buf_a.resize(cap, 0);
        self.buf_b.resize(cap, 0);

        let fwd = self.seq.forward(&mut self.buf_a, src.len(), &mut self.buf_b)?;
        let skip_mask = self.seq.skip_flags();

        debug!(
            "block: {} -> {} transformed bytes, mask {:#04x}, entropy {}",
            src.len(),
            fwd.written,
            skip_mask,
            self.entropy_id
        );

        let payload_start = out.len();

        let mut bw = BitWriterLtr::new(&mut *out);
        let mut enc = new_entropy_encoder(self.entropy_id, &mut bw, &self.params)?;

        enc.encode(&self.buf_b[..fwd.written])?;
        enc.dispose()?;
        drop(enc);

        bw.close()?;

        Ok(BlockSummary {
            skip_mask,
            transformed_len: fwd.written,
            payload_len: out.len() - payload_start,
        })
    }

    /// Decompresses one block into `dst`, returning the number of bytes produced.
    ///
    /// `skip_mask`, `transformed_len`, and `original_len` come from the container; `dst` must
    /// hold at least `original_len` bytes.
    pub fn decode_block(
        &mut self,
        payload: &[u8],
        skip_mask: u8,
        transformed_len: usize,
        original_len: usize,
        dst: &mut [u8],
    ) -> Result<usize> {
        if original_len > self.params.block_size() {
            return param_error("block: output longer than the configured block size");
        }

        if dst.len() < original_len {
            return buffer_too_small_error(original_len, dst.len());
        }

        let cap = self.seq.max_encoded_len(original_len).max(transformed_len);

        self.buf_a.resize(cap, 0);
        self.buf_b.resize(cap, 0);

        {
            let mut br = BitReaderLtr::new(payload);
            let mut dec = new_entropy_decoder(self.entropy_id, &mut br, &self.params)?;

            dec.decode(&mut self.buf_a[..transformed_len])?;
            dec.dispose()?;
        }

        self.seq.set_skip_flags(skip_mask);

        let inv = self.seq.inverse(&mut self.buf_a, transformed_len, &mut self.buf_b)?;

        if inv.written != original_len {
            return decode_error("block: inverse pipeline length mismatch");
        }

        dst[..original_len].copy_from_slice(&self.buf_b[..original_len]);

        Ok(original_len)
    }

    /// Restores the between-blocks lifecycle state: zeroes every stage's scratch tables.
    pub fn reset(&mut self) {
        self.seq.reset();
    }
}
