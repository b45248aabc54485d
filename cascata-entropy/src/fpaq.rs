// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `fpaq` module implements the order-0 FPAQ predictor: one 16-bit probability per
//! partial-byte bit context, nudged toward the observed bit with a 1/64 rate.

use cascata_core::entropy::Predictor;

pub struct FpaqPredictor {
    probs: [u16; 256],
    ctx: usize,
}

impl FpaqPredictor {
    pub fn new() -> Self {
        FpaqPredictor { probs: [32768; 256], ctx: 1 }
    }
}

impl Default for FpaqPredictor {
    fn default() -> Self {
        FpaqPredictor::new()
    }
}

impl Predictor for FpaqPredictor {
    #[inline(always)]
    fn get(&mut self) -> u32 {
        u32::from(self.probs[self.ctx] >> 4)
    }

    #[inline(always)]
    fn update(&mut self, bit: bool) {
        let p = &mut self.probs[self.ctx];

        if bit {
            *p += (65535 - *p) >> 6;
        }
        else {
            *p -= *p >> 6;
        }

        // The context is the bits of the current byte behind a leading 1.
        self.ctx = (self.ctx << 1) | usize::from(bit);
        if self.ctx >= 256 {
            self.ctx = 1;
        }
    }
}
