// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `id` module defines the wire identifiers of the transforms and entropy coders, and the
//! 48-bit packing of a transform pipeline.
//!
//! A pipeline identifier holds eight 6-bit transform codes, stage 0 in the most significant
//! group. Code 0 is the identity and is dropped on unpack, so an all-zero identifier selects
//! the empty pipeline.

use std::fmt;

use cascata_core::errors::{unsupported_error, Result};
use cascata_core::transform::MAX_STAGES;

/// Wire identifier of a byte transform (6-bit code).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformId {
    None,
    Lz,
    Lzx,
    Lzp,
    Rolz,
    RolzX,
    Rlt,
    Zrlt,
    Srt,
    Brt,
    Fsd,
    X86,
}

impl TransformId {
    /// All identifiers with a registered implementation.
    pub const ALL: [TransformId; 12] = [
        TransformId::None,
        TransformId::Lz,
        TransformId::Lzx,
        TransformId::Lzp,
        TransformId::Rolz,
        TransformId::RolzX,
        TransformId::Rlt,
        TransformId::Zrlt,
        TransformId::Srt,
        TransformId::Brt,
        TransformId::Fsd,
        TransformId::X86,
    ];

    pub fn code(self) -> u8 {
        match self {
            TransformId::None => 0,
            TransformId::Lz => 1,
            TransformId::Lzx => 2,
            TransformId::Lzp => 3,
            TransformId::Rolz => 4,
            TransformId::RolzX => 5,
            TransformId::Rlt => 6,
            TransformId::Zrlt => 7,
            TransformId::Srt => 8,
            TransformId::Brt => 9,
            TransformId::Fsd => 10,
            TransformId::X86 => 11,
            // Code 12 is reserved for the historical flag-vector RLT bitstream.
        }
    }

    pub fn from_code(code: u8) -> Result<TransformId> {
        match code {
            0 => Ok(TransformId::None),
            1 => Ok(TransformId::Lz),
            2 => Ok(TransformId::Lzx),
            3 => Ok(TransformId::Lzp),
            4 => Ok(TransformId::Rolz),
            5 => Ok(TransformId::RolzX),
            6 => Ok(TransformId::Rlt),
            7 => Ok(TransformId::Zrlt),
            8 => Ok(TransformId::Srt),
            9 => Ok(TransformId::Brt),
            10 => Ok(TransformId::Fsd),
            11 => Ok(TransformId::X86),
            _ => unsupported_error("id: unknown transform code"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TransformId::None => "NONE",
            TransformId::Lz => "LZ",
            TransformId::Lzx => "LZX",
            TransformId::Lzp => "LZP",
            TransformId::Rolz => "ROLZ",
            TransformId::RolzX => "ROLZX",
            TransformId::Rlt => "RLT",
            TransformId::Zrlt => "ZRLT",
            TransformId::Srt => "SRT",
            TransformId::Brt => "BRT",
            TransformId::Fsd => "FSD",
            TransformId::X86 => "X86",
        }
    }

    pub fn from_name(name: &str) -> Result<TransformId> {
        match Self::ALL.iter().copied().find(|id| id.name() == name) {
            Some(id) => Ok(id),
            None => unsupported_error("id: unknown transform name"),
        }
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire identifier of an entropy coder (5-bit code).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntropyCodecId {
    None,
    Huffman,
    ExpGolomb,
    Range,
    Ans,
    Fpaq,
    Cm,
    Tpaq,
}

impl EntropyCodecId {
    /// All identifiers with a registered implementation.
    pub const ALL: [EntropyCodecId; 8] = [
        EntropyCodecId::None,
        EntropyCodecId::Huffman,
        EntropyCodecId::ExpGolomb,
        EntropyCodecId::Range,
        EntropyCodecId::Ans,
        EntropyCodecId::Fpaq,
        EntropyCodecId::Cm,
        EntropyCodecId::Tpaq,
    ];

    pub fn code(self) -> u8 {
        match self {
            EntropyCodecId::None => 0,
            EntropyCodecId::Huffman => 1,
            EntropyCodecId::ExpGolomb => 2,
            EntropyCodecId::Range => 3,
            EntropyCodecId::Ans => 4,
            EntropyCodecId::Fpaq => 5,
            EntropyCodecId::Cm => 6,
            EntropyCodecId::Tpaq => 7,
        }
    }

    pub fn from_code(code: u8) -> Result<EntropyCodecId> {
        match code {
            0 => Ok(EntropyCodecId::None),
            1 => Ok(EntropyCodecId::Huffman),
            2 => Ok(EntropyCodecId::ExpGolomb),
            3 => Ok(EntropyCodecId::Range),
            4 => Ok(EntropyCodecId::Ans),
            5 => Ok(EntropyCodecId::Fpaq),
            6 => Ok(EntropyCodecId::Cm),
            7 => Ok(EntropyCodecId::Tpaq),
            _ => unsupported_error("id: unknown entropy code"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntropyCodecId::None => "NONE",
            EntropyCodecId::Huffman => "HUFFMAN",
            EntropyCodecId::ExpGolomb => "EXPGOLOMB",
            EntropyCodecId::Range => "RANGE",
            EntropyCodecId::Ans => "ANS",
            EntropyCodecId::Fpaq => "FPAQ",
            EntropyCodecId::Cm => "CM",
            EntropyCodecId::Tpaq => "TPAQ",
        }
    }

    pub fn from_name(name: &str) -> Result<EntropyCodecId> {
        match Self::ALL.iter().copied().find(|id| id.name() == name) {
            Some(id) => Ok(id),
            None => unsupported_error("id: unknown entropy name"),
        }
    }
}

impl fmt::Display for EntropyCodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Packs up to eight transform codes into the 48-bit pipeline identifier.
pub fn pack_transform_ids(ids: &[TransformId]) -> Result<u64> {
    if ids.len() > MAX_STAGES {
        return cascata_core::errors::param_error("id: more than 8 transforms");
    }

    let mut packed = 0u64;

    for (i, id) in ids.iter().enumerate() {
        packed |= u64::from(id.code()) << (6 * (MAX_STAGES - 1 - i) as u32);
    }

    Ok(packed)
}

/// Unpacks a 48-bit pipeline identifier, dropping identity stages.
pub fn unpack_transform_ids(packed: u64) -> Result<Vec<TransformId>> {
    let mut ids = Vec::new();

    for i in 0..MAX_STAGES {
        let code = ((packed >> (6 * (MAX_STAGES - 1 - i) as u32)) & 0x3F) as u8;

        if code != 0 {
            ids.push(TransformId::from_code(code)?);
        }
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_codes_round_trip() {
        for id in TransformId::ALL {
            assert_eq!(TransformId::from_code(id.code()).unwrap(), id);
            assert_eq!(TransformId::from_name(id.name()).unwrap(), id);
            assert!(id.code() < 64);
        }
        for id in EntropyCodecId::ALL {
            assert_eq!(EntropyCodecId::from_code(id.code()).unwrap(), id);
            assert_eq!(EntropyCodecId::from_name(id.name()).unwrap(), id);
            assert!(id.code() < 32);
        }

        // The reserved flag-vector RLT code is rejected, not mapped.
        assert!(TransformId::from_code(12).is_err());
    }

    #[test]
    fn verify_pipeline_packing() {
        let ids = [TransformId::X86, TransformId::Lzx, TransformId::Zrlt];
        let packed = pack_transform_ids(&ids).unwrap();

        // Stage 0 sits in the most significant 6-bit group.
        assert_eq!(packed >> 42, u64::from(TransformId::X86.code()));
        assert!(packed < 1 << 48);

        assert_eq!(unpack_transform_ids(packed).unwrap(), ids);

        // The all-zero identifier is the empty pipeline.
        assert!(unpack_transform_ids(0).unwrap().is_empty());
    }
}
