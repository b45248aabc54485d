// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `params` module defines the parameter set recognized by the compression engine.
//!
//! Every parameter is validated at construction time; an out-of-range value is an error, never
//! a silent clamp.

use crate::entropy::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::errors::{param_error, Result};

/// Hard cap on the length of a block, in bytes.
pub const MAX_BLOCK_SIZE: usize = 1 << 27;

/// Default entropy scale for the Range and ANS coders.
pub const DEFAULT_LOG_RANGE: u32 = 13;

/// Parameters recognized by the engine.
///
/// Constructed with [`CodecParams::new`] and refined with the builder-style `with_*` setters,
/// each of which validates its argument.
#[derive(Copy, Clone, Debug)]
pub struct CodecParams {
    block_size: usize,
    chunk_size: usize,
    log_range: u32,
    log_pos_checks: u32,
    extra: bool,
    full_fsd: bool,
}

impl CodecParams {
    /// Default parameter set: 4 MiB blocks, 64 KiB chunks, `log_range` 13, 5 position checks
    /// per ROLZ key.
    pub fn new() -> Self {
        CodecParams {
            block_size: 4 * 1024 * 1024,
            chunk_size: crate::entropy::DEFAULT_CHUNK_SIZE,
            log_range: DEFAULT_LOG_RANGE,
            log_pos_checks: 5,
            extra: false,
            full_fsd: false,
        }
    }

    /// Sets the block size. Must not exceed [`MAX_BLOCK_SIZE`].
    pub fn with_block_size(mut self, block_size: usize) -> Result<Self> {
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return param_error("params: block size out of range");
        }
        self.block_size = block_size;
        Ok(self)
    }

    /// Sets the entropy-coder chunk size. 0 means one chunk per block; otherwise the value
    /// must lie in `[1024, 2^30]`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size != 0 && (chunk_size < MIN_CHUNK_SIZE || chunk_size > MAX_CHUNK_SIZE) {
            return param_error("params: chunk size out of range");
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Sets the frequency scale for the Range and ANS coders, in `[8, 16]`.
    pub fn with_log_range(mut self, log_range: u32) -> Result<Self> {
        if log_range < 8 || log_range > 16 {
            return param_error("params: log range out of range");
        }
        self.log_range = log_range;
        Ok(self)
    }

    /// Sets the log2 of the number of ROLZ positions checked per key, in `[2, 8]`.
    pub fn with_log_pos_checks(mut self, log_pos_checks: u32) -> Result<Self> {
        if log_pos_checks < 2 || log_pos_checks > 8 {
            return param_error("params: log pos checks out of range");
        }
        self.log_pos_checks = log_pos_checks;
        Ok(self)
    }

    /// Selects the wider-search variants (LZX over LZ, ROLZX over ROLZ).
    pub fn with_extra(mut self, extra: bool) -> Self {
        self.extra = extra;
        self
    }

    /// Disables FSD's sampled entropy approximation in favor of a whole-block scan.
    pub fn with_full_fsd(mut self, full_fsd: bool) -> Self {
        self.full_fsd = full_fsd;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn log_range(&self) -> u32 {
        self.log_range
    }

    pub fn log_pos_checks(&self) -> u32 {
        self.log_pos_checks
    }

    pub fn extra(&self) -> bool {
        self.extra
    }

    pub fn full_fsd(&self) -> bool {
        self.full_fsd
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        CodecParams::new()
    }
}
