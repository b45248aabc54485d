// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `tpaq` module implements a hash-indexed context-mixing predictor.
//!
//! Eight contexts (orders 1 to 4 plus two sparse and two masked histories) are hashed into a
//! shared probability table. Their estimates are moved into the logistic domain, mixed with
//! adaptive weights trained by gradient steps on the coding error, and squashed back to the
//! probability domain.

use cascata_core::entropy::Predictor;

use once_cell::sync::Lazy;

/// Number of mixed context models.
const N_MODELS: usize = 8;

/// log2 of the shared probability table size.
const TABLE_LOG: u32 = 20;

const TABLE_MASK: u32 = (1 << TABLE_LOG) - 1;

/// Golden-ratio multiplier for context hashing.
const HASH_MULT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Probability-to-logistic mapping, `stretch(p) = ln(p / (4096 - p)) * 256`, clamped to
/// plus-or-minus 2047.
static STRETCH: Lazy<[i16; 4096]> = Lazy::new(|| {
    let mut table = [0i16; 4096];
    for (p, e) in table.iter_mut().enumerate().skip(1) {
        let x = p as f64 / 4096.0;
        let v = ((x / (1.0 - x)).ln() * 256.0).round();
        *e = v.clamp(-2047.0, 2047.0) as i16;
    }
    table[0] = -2047;
    table
});

/// Logistic-to-probability mapping, inverse of [`STRETCH`], domain `-2047..=2047`.
static SQUASH: Lazy<[u16; 4096]> = Lazy::new(|| {
    let mut table = [0u16; 4096];
    for (i, e) in table.iter_mut().enumerate() {
        let d = i as f64 - 2048.0;
        let v = 4096.0 / (1.0 + (-d / 256.0).exp());
        *e = (v.round() as u16).clamp(1, 4095);
    }
    table
});

#[inline(always)]
fn squash(d: i32) -> u32 {
    u32::from(SQUASH[(d.clamp(-2047, 2047) + 2048) as usize])
}

pub struct TpaqPredictor {
    /// Shared 16-bit probability table, indexed by hashed (context, partial bits).
    probs: Vec<u16>,
    /// Per-byte context hashes, refreshed at byte boundaries.
    hashes: [u32; N_MODELS],
    /// Mixer weights, 16.16-ish fixed point.
    weights: [i32; N_MODELS],
    /// Stretched inputs latched by the last `get`.
    inputs: [i32; N_MODELS],
    /// Table slots latched by the last `get`.
    slots: [usize; N_MODELS],
    /// Bits of the current byte behind a leading 1.
    ctx: u32,
    /// Last eight bytes, most recent in the low byte.
    hist: u64,
    /// Mixed probability latched by the last `get`.
    pr: u32,
}

impl TpaqPredictor {
    pub fn new() -> Self {
        let mut p = TpaqPredictor {
            probs: vec![32768; 1 << TABLE_LOG],
            hashes: [0; N_MODELS],
            weights: [1 << 14; N_MODELS],
            inputs: [0; N_MODELS],
            slots: [0; N_MODELS],
            ctx: 1,
            hist: 0,
            pr: 2048,
        };
        p.refresh_hashes();
        p
    }

    fn refresh_hashes(&mut self) {
        let h = self.hist;

        let orders = [
            h & 0xff,
            h & 0xffff,
            h & 0xff_ffff,
            h & 0xffff_ffff,
            // Sparse contexts skip the closest byte.
            (h >> 8) & 0xffff,
            (h >> 8) & 0xff_ffff,
            // Masked histories capture high-nibble texture.
            h & 0xf0f0_f0f0,
            h & 0x0000_ffff_ffff_ffff,
        ];

        for (m, &o) in orders.iter().enumerate() {
            // Salt each model so identical context values land in distinct table regions.
            let salted = o ^ ((m as u64 + 1) << 60);
            self.hashes[m] = (salted.wrapping_mul(HASH_MULT) >> 32) as u32;
        }
    }

    #[inline(always)]
    fn slot(&self, model: usize) -> usize {
        let h = self.hashes[model] ^ self.ctx.wrapping_mul(0x0100_0193);
        (h & TABLE_MASK) as usize
    }
}

impl Default for TpaqPredictor {
    fn default() -> Self {
        TpaqPredictor::new()
    }
}

impl Predictor for TpaqPredictor {
    fn get(&mut self) -> u32 {
        let mut dot = 0i64;

        for m in 0..N_MODELS {
            let slot = self.slot(m);
            let st = i32::from(STRETCH[usize::from(self.probs[slot] >> 4)]);

            self.slots[m] = slot;
            self.inputs[m] = st;

            dot += i64::from(st) * i64::from(self.weights[m]);
        }

        self.pr = squash((dot >> 16) as i32);
        self.pr
    }

    fn update(&mut self, bit: bool) {
        let err = ((i32::from(bit)) << 12) - self.pr as i32;

        for m in 0..N_MODELS {
            // Gradient step on the mixing weight.
            self.weights[m] += (self.inputs[m] * err) >> 10;

            let c = &mut self.probs[self.slots[m]];
            if bit {
                *c += (65535 - *c) >> 5;
            }
            else {
                *c -= *c >> 5;
            }
        }

        self.ctx = (self.ctx << 1) | u32::from(bit);

        if self.ctx >= 256 {
            let byte = u64::from(self.ctx - 256);
            self.hist = (self.hist << 8) | byte;
            self.ctx = 1;
            self.refresh_hashes();
        }
    }
}
