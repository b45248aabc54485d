// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `expgolomb` module implements a signed order-0 Exp-Golomb byte coder.
//!
//! Bytes are interpreted as two's complement `i8`. Zero is a single 1 bit. A non-zero value of
//! magnitude `m` writes `k = floor(log2(m + 1))` zero bits, the `k + 1` bits of `m + 1`
//! (leading 1 included), then the sign bit last. This codec is used standalone and by the
//! Huffman chunk header to transmit code-length deltas.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder};
use cascata_core::errors::{decode_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};
use cascata_core::util::bits::ilog2_u32;

use once_cell::sync::Lazy;

/// Precomputed `(code, length)` per byte value. The longest code is 16 bits
/// (7 zeros + 8 magnitude bits + sign).
static CODES: Lazy<[(u32, u8); 256]> = Lazy::new(|| {
    let mut table = [(0u32, 0u8); 256];
    for (b, entry) in table.iter_mut().enumerate() {
        let v = b as u8 as i8;

        if v == 0 {
            *entry = (1, 1);
            continue;
        }

        let m = u32::from(v.unsigned_abs());
        let k = ilog2_u32(m + 1);
        let sign = u32::from(v < 0);

        // k zero bits, the k+1 bits of m+1, then the sign.
        let code = ((m + 1) << 1) | sign;
        let len = (k + k + 2) as u8;

        *entry = (code, len);
    }
    table
});

/// Writes one value through the Exp-Golomb code table.
pub fn encode_value<W: WriteBytes>(bw: &mut BitWriterLtr<W>, byte: u8) -> Result<()> {
    let (code, len) = CODES[usize::from(byte)];
    bw.write_bits(u64::from(code), u32::from(len))
}

/// Reads one value.
pub fn decode_value(br: &mut BitReaderLtr<'_>) -> Result<u8> {
    let mut k = 0u32;

    while br.read_bit()? == 0 {
        k += 1;
        if k > 7 {
            return decode_error("expgolomb: prefix too long");
        }
    }

    if k == 0 {
        return Ok(0);
    }

    let rest = br.read_bits(k)? as u32;
    let m = ((1 << k) | rest) - 1;
    let sign = br.read_bit()?;

    let v = if sign != 0 { -(m as i32) } else { m as i32 };

    Ok(v as i8 as u8)
}

/// Exp-Golomb encoder.
pub struct ExpGolombEncoder<'a, W: WriteBytes> {
    bw: &'a mut BitWriterLtr<W>,
}

impl<'a, W: WriteBytes> ExpGolombEncoder<'a, W> {
    pub fn new(bw: &'a mut BitWriterLtr<W>) -> Self {
        ExpGolombEncoder { bw }
    }
}

impl<'a, W: WriteBytes> EntropyEncoder for ExpGolombEncoder<'a, W> {
    fn encode(&mut self, block: &[u8]) -> Result<usize> {
        for &b in block {
            encode_value(self.bw, b)?;
        }
        Ok(block.len())
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Exp-Golomb decoder.
pub struct ExpGolombDecoder<'a, 'b> {
    br: &'a mut BitReaderLtr<'b>,
}

impl<'a, 'b> ExpGolombDecoder<'a, 'b> {
    pub fn new(br: &'a mut BitReaderLtr<'b>) -> Self {
        ExpGolombDecoder { br }
    }
}

impl<'a, 'b> EntropyDecoder for ExpGolombDecoder<'a, 'b> {
    fn decode(&mut self, block: &mut [u8]) -> Result<usize> {
        let len = block.len();
        for b in block.iter_mut() {
            *b = decode_value(self.br)?;
        }
        Ok(len)
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}
