// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `cm` module implements the context-mixing predictor.
//!
//! Two cascaded counter banks feed a fixed-weight mix: a per-bit-context aggregate counter, an
//! order-1 counter selected by the previous byte, and an order-2 counter selected by the byte
//! before that, blended 13/14/5 out of 32. The mixed estimate then runs through a small
//! interpolated refinement table indexed by its own coarse bucket and a run flag that is set
//! while the last two bytes are equal.

use cascata_core::entropy::Predictor;

/// Counter adaptation rate (shift).
const RATE1: u16 = 4;

/// Refinement table adaptation rate (shift).
const RATE2: u16 = 7;

pub struct CmPredictor {
    /// `[bit context][previous byte]` counters plus an aggregate entry at index 256.
    counter1: Vec<u16>,
    /// Refinement table: `[bit context, run flag][probability bucket]`, 17 buckets.
    counter2: Vec<u16>,
    /// Bits of the current byte behind a leading 1, `1..=255`.
    ctx: usize,
    c1: usize,
    c2: usize,
    run_flag: usize,
    /// Mixed 16-bit probability latched by the last `get`.
    p: u32,
    /// Refinement entry latched by the last `get`.
    idx: usize,
}

impl CmPredictor {
    pub fn new() -> Self {
        let counter1 = vec![32768u16; 256 * 257];

        let mut counter2 = vec![0u16; 512 * 17];
        for row in counter2.chunks_exact_mut(17) {
            // Identity ramp: bucket j starts out predicting its own probability.
            for (j, e) in row.iter_mut().enumerate() {
                *e = (j as u32 * 65535 / 16) as u16;
            }
        }

        CmPredictor {
            counter1,
            counter2,
            ctx: 1,
            c1: 0,
            c2: 0,
            run_flag: 0,
            p: 32768,
            idx: 8,
        }
    }
}

impl Default for CmPredictor {
    fn default() -> Self {
        CmPredictor::new()
    }
}

impl Predictor for CmPredictor {
    fn get(&mut self) -> u32 {
        let base = self.ctx * 257;

        let agg = u32::from(self.counter1[base + 256]);
        let o1 = u32::from(self.counter1[base + self.c1]);
        let o2 = u32::from(self.counter1[base + self.c2]);

        self.p = (13 * agg + 14 * o1 + 5 * o2) >> 5;

        let row = ((self.ctx << 1) | self.run_flag) * 17;
        let bucket = (self.p >> 12) as usize;

        self.idx = row + bucket;

        let x1 = i32::from(self.counter2[self.idx]);
        let x2 = i32::from(self.counter2[self.idx + 1]);
        let refined = (x1 + (((x2 - x1) * (self.p & 4095) as i32) >> 12)).max(0);

        ((self.p + 3 * refined as u32) >> 6).clamp(1, 4095)
    }

    fn update(&mut self, bit: bool) {
        let base = self.ctx * 257;

        for i in [base + 256, base + self.c1, base + self.c2] {
            let c = &mut self.counter1[i];
            if bit {
                *c += (65535 - *c) >> RATE1;
            }
            else {
                *c -= *c >> RATE1;
            }
        }

        for i in [self.idx, self.idx + 1] {
            let c = &mut self.counter2[i];
            if bit {
                *c += (65535 - *c) >> RATE2;
            }
            else {
                *c -= *c >> RATE2;
            }
        }

        self.ctx = (self.ctx << 1) | usize::from(bit);

        if self.ctx >= 256 {
            let byte = self.ctx - 256;
            self.c2 = self.c1;
            self.c1 = byte;
            self.run_flag = usize::from(self.c1 == self.c2);
            self.ctx = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_estimate_stays_inside_scale() {
        let mut p = CmPredictor::new();

        for i in 0..20_000u32 {
            let bit = i.wrapping_mul(2654435761) & 0x8000_0000 != 0;
            p.update(bit);
            let e = p.get();
            assert!(e >= 1 && e < 4096);
        }
    }

    #[test]
    fn verify_constant_bit_converges() {
        let mut p = CmPredictor::new();
        for _ in 0..4096 {
            p.update(true);
        }
        assert!(p.get() > 3900);

        let mut p = CmPredictor::new();
        for _ in 0..4096 {
            p.update(false);
        }
        assert!(p.get() < 200);
    }

    #[test]
    fn verify_repeating_bytes_predict_strongly(){
        // After a run of identical bytes, the model must lean heavily toward repeating bits.
        let mut p = CmPredictor::new();

        for _ in 0..512 {
            for i in (0..8).rev() {
                let bit = (0xe1u8 >> i) & 1 == 1;
                let _ = p.get();
                p.update(bit);
            }
        }

        // First bit of 0xe1 is 1; the estimate before it must be confident.
        assert!(p.get() > 3000);
    }
}
