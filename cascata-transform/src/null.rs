// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `null` module implements the identity transform: a bounds-checked copy.

use cascata_core::errors::{buffer_too_small_error, Result};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};

#[derive(Default)]
pub struct NullTransform;

impl NullTransform {
    pub fn new() -> Self {
        NullTransform
    }

    fn copy(src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if dst.len() < src.len() {
            return buffer_too_small_error(src.len(), dst.len());
        }

        dst[..src.len()].copy_from_slice(src);

        Ok(TransformOutput { read: src.len(), written: src.len() })
    }
}

impl ByteTransform for NullTransform {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        Ok(ForwardStatus::Applied(Self::copy(src, dst)?))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        Self::copy(src, dst)
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len
    }

    fn name(&self) -> &'static str {
        "NONE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_null_copy() {
        let mut t = NullTransform::new();
        let src = [1u8, 2, 3];
        let mut dst = [0u8; 3];

        match t.forward(&src, &mut dst).unwrap() {
            ForwardStatus::Applied(out) => {
                assert_eq!(out, TransformOutput { read: 3, written: 3 });
            }
            ForwardStatus::Skipped => panic!("null transform must not skip"),
        }
        assert_eq!(dst, src);

        let mut small = [0u8; 2];
        assert!(t.forward(&src, &mut small).is_err());
    }
}
