// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `transform` module defines the reversible byte transform trait and the skip-capable
//! sequence composing up to eight of them. Implementations live in the `cascata-transform`
//! crate.

use std::mem;

use log::debug;
use smallvec::SmallVec;

use crate::errors::{buffer_too_small_error, Result};

/// Maximum number of stages a [`TransformSequence`] composes.
pub const MAX_STAGES: usize = 8;

/// Byte counts reported by a completed transform call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransformOutput {
    /// Bytes consumed from the source slice.
    pub read: usize,
    /// Bytes produced into the destination slice.
    pub written: usize,
}

/// Outcome of a forward transform call.
///
/// `Skipped` means the stage applies the identity mapping for this block: the input was too
/// short, the output would not have been cheaper to entropy-code, or the destination budget
/// would have been violated. It is a recoverable, recorded outcome, not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ForwardStatus {
    /// The transform ran; the destination holds the transformed bytes.
    Applied(TransformOutput),
    /// The transform refused the block; the caller must treat this stage as identity.
    Skipped,
}

/// A `ByteTransform` is a reversible byte-to-byte mapping with possible expansion.
///
/// State is scratch only: a transform may keep large tables across calls from the same thread,
/// but every call is logically a pure function of the source slice. Inverse never skips; it
/// succeeds or fails fatally.
pub trait ByteTransform {
    /// Applies the forward mapping of `src` into `dst`.
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus>;

    /// Applies the inverse mapping of `src` into `dst`.
    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput>;

    /// The destination length a caller must provide for a source of length `len`.
    fn max_encoded_len(&self, len: usize) -> usize;

    /// Zeroes the internal scratch tables without releasing them.
    fn reset(&mut self) {}

    /// Short display name for logging.
    fn name(&self) -> &'static str;
}

/// A `TransformSequence` composes up to [`MAX_STAGES`] transforms with per-stage skip flags.
///
/// Forward runs the stages in order over a pair of ping-pong buffers; a stage that skips leaves
/// the data where it is and sets its flag bit. Inverse replays the non-skipped stages in
/// reverse order. Bit `i` of the skip mask (value `1 << i`) covers stage `i`; bits past the
/// actual stage count are padded with 1, so a fully-skipped block reads `0xFF`.
pub struct TransformSequence {
    stages: SmallVec<[Box<dyn ByteTransform>; MAX_STAGES]>,
    skip_flags: u8,
}

impl TransformSequence {
    /// Instantiate a sequence over the given stages. At most [`MAX_STAGES`] are accepted.
    pub fn new(stages: SmallVec<[Box<dyn ByteTransform>; MAX_STAGES]>) -> Result<Self> {
        if stages.len() > MAX_STAGES {
            return crate::errors::param_error("transform: sequence longer than 8 stages");
        }
        Ok(TransformSequence { stages, skip_flags: 0xff })
    }

    /// Number of stages in the sequence.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the sequence has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The skip mask recorded by the last forward call.
    pub fn skip_flags(&self) -> u8 {
        self.skip_flags
    }

    /// Installs the skip mask the container recorded for the block about to be inverted.
    pub fn set_skip_flags(&mut self, flags: u8) {
        self.skip_flags = flags;
    }

    /// The destination length a caller must provide for a source of length `len`.
    ///
    /// Folded cumulatively across the stages so one buffer covers every intermediate.
    pub fn max_encoded_len(&self, len: usize) -> usize {
        let mut n = len.max(1);
        for t in self.stages.iter() {
            n = n.max(t.max_encoded_len(n));
        }
        n
    }

    /// Runs the forward pipeline.
    ///
    /// Both `src` and `dst` are working buffers for the ping-pong plumbing; only the first
    /// `src_len` bytes of `src` are input. On return `dst` holds the output and the skip mask
    /// is available from [`TransformSequence::skip_flags`].
    pub fn forward(
        &mut self,
        src: &mut [u8],
        src_len: usize,
        dst: &mut [u8],
    ) -> Result<TransformOutput> {
        let required = self.max_encoded_len(src_len);

        if dst.len() < required {
            return buffer_too_small_error(required, dst.len());
        }

        let mut in_buf: &mut [u8] = src;
        let mut out_buf: &mut [u8] = dst;
        let mut length = src_len;
        let mut flags = 0u8;
        let mut n_applied = 0usize;

        for (i, stage) in self.stages.iter_mut().enumerate() {
            // A stage that cannot fit its worst case in the opposite buffer is skipped rather
            // than risking a mid-stage abort.
            if out_buf.len() < stage.max_encoded_len(length) {
                debug!("sequence: stage {} ({}) skipped, over budget", i, stage.name());
                flags |= 1 << i;
                continue;
            }

            match stage.forward(&in_buf[..length], out_buf)? {
                ForwardStatus::Applied(out) => {
                    length = out.written;
                    n_applied += 1;
                    mem::swap(&mut in_buf, &mut out_buf);
                }
                ForwardStatus::Skipped => {
                    debug!("sequence: stage {} ({}) skipped", i, stage.name());
                    flags |= 1 << i;
                }
            }
        }

        // Pad the flags of absent stages with 1.
        for i in self.stages.len()..MAX_STAGES {
            flags |= 1 << i;
        }

        self.skip_flags = flags;

        // An even number of applications leaves the data in the caller's source buffer.
        if n_applied % 2 == 0 {
            out_buf[..length].copy_from_slice(&in_buf[..length]);
        }

        Ok(TransformOutput { read: src_len, written: length })
    }

    /// Runs the inverse pipeline, replaying non-skipped stages in reverse order.
    ///
    /// The skip mask must have been installed with [`TransformSequence::set_skip_flags`]. A
    /// single stage failure aborts the block.
    pub fn inverse(
        &mut self,
        src: &mut [u8],
        src_len: usize,
        dst: &mut [u8],
    ) -> Result<TransformOutput> {
        if self.skip_flags == 0xff {
            if dst.len() < src_len {
                return buffer_too_small_error(src_len, dst.len());
            }
            dst[..src_len].copy_from_slice(&src[..src_len]);
            return Ok(TransformOutput { read: src_len, written: src_len });
        }

        let mut in_buf: &mut [u8] = src;
        let mut out_buf: &mut [u8] = dst;
        let mut length = src_len;
        let mut n_applied = 0usize;

        for i in (0..self.stages.len()).rev() {
            if self.skip_flags & (1 << i) != 0 {
                continue;
            }

            let out = self.stages[i].inverse(&in_buf[..length], out_buf)?;

            length = out.written;
            n_applied += 1;
            mem::swap(&mut in_buf, &mut out_buf);
        }

        if n_applied % 2 == 0 {
            if out_buf.len() < length {
                return buffer_too_small_error(length, out_buf.len());
            }
            out_buf[..length].copy_from_slice(&in_buf[..length]);
        }

        Ok(TransformOutput { read: src_len, written: length })
    }

    /// Zeroes every stage's scratch tables.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
        self.skip_flags = 0xff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    /// Adds one to every byte. Applies only to inputs of at least `min_len` bytes.
    struct AddOne {
        min_len: usize,
    }

    impl ByteTransform for AddOne {
        fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
            if src.len() < self.min_len {
                return Ok(ForwardStatus::Skipped);
            }
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s.wrapping_add(1);
            }
            Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: src.len() }))
        }

        fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s.wrapping_sub(1);
            }
            Ok(TransformOutput { read: src.len(), written: src.len() })
        }

        fn max_encoded_len(&self, len: usize) -> usize {
            len
        }

        fn name(&self) -> &'static str {
            "ADD1"
        }
    }

    fn run_round_trip(stages: Vec<Box<dyn ByteTransform>>, data: &[u8]) -> (u8, Vec<u8>) {
        let mut seq = TransformSequence::new(SmallVec::from_vec(stages)).unwrap();

        let cap = seq.max_encoded_len(data.len());
        let mut a = data.to_vec();
        a.resize(cap, 0);
        let mut b = vec![0u8; cap];

        let out = seq.forward(&mut a, data.len(), &mut b).unwrap();
        let flags = seq.skip_flags();

        let mut fwd = b[..out.written].to_vec();
        fwd.resize(cap, 0);
        let mut c = vec![0u8; cap];

        let mut seq2 = seq;
        seq2.set_skip_flags(flags);
        let inv = seq2.inverse(&mut fwd, out.written, &mut c).unwrap();

        assert_eq!(&c[..inv.written], data);

        (flags, b)
    }

    #[test]
    fn verify_sequence_round_trip() {
        let data: Vec<u8> = (0..255u8).cycle().take(1000).collect();

        // Two applied stages (even swap count -> copy back into dst).
        let (flags, _) = run_round_trip(
            vec![Box::new(AddOne { min_len: 0 }), Box::new(AddOne { min_len: 0 })],
            &data,
        );
        assert_eq!(flags, 0b1111_1100);

        // One applied, one skipped.
        let (flags, _) = run_round_trip(
            vec![Box::new(AddOne { min_len: 0 }), Box::new(AddOne { min_len: 1 << 20 })],
            &data,
        );
        assert_eq!(flags, 0b1111_1110);
    }

    #[test]
    fn verify_all_skipped_is_identity() {
        let data: Vec<u8> = vec![7u8; 64];

        let mut seq = TransformSequence::new(smallvec![
            Box::new(AddOne { min_len: 1 << 20 }) as Box<dyn ByteTransform>,
        ])
        .unwrap();

        let mut a = data.clone();
        let mut b = vec![0u8; 64];

        let out = seq.forward(&mut a, data.len(), &mut b).unwrap();

        assert_eq!(seq.skip_flags(), 0xff);
        assert_eq!(out.written, data.len());
        assert_eq!(&b[..out.written], &data[..]);
    }

    #[test]
    fn verify_empty_input() {
        let mut seq = TransformSequence::new(smallvec![
            Box::new(AddOne { min_len: 0 }) as Box<dyn ByteTransform>,
        ])
        .unwrap();

        let mut a = vec![0u8; 1];
        let mut b = vec![0u8; 1];

        let out = seq.forward(&mut a, 0, &mut b).unwrap();

        assert_eq!(out, TransformOutput { read: 0, written: 0 });
    }
}
