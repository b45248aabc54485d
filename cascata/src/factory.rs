// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `factory` module instantiates codecs from their wire identifiers.
//!
//! The registry is a closed sum of variants rather than a dynamic table: a `match` per
//! identifier, so an unknown code is rejected in exactly one place.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder};
use cascata_core::errors::Result;
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};
use cascata_core::params::CodecParams;
use cascata_core::transform::{ByteTransform, TransformSequence};

use cascata_entropy::{
    AnsDecoder, AnsEncoder, BinaryEntropyDecoder, BinaryEntropyEncoder, CmPredictor,
    ExpGolombDecoder, ExpGolombEncoder, FpaqPredictor, HuffmanDecoder, HuffmanEncoder,
    NullDecoder, NullEncoder, RangeDecoder, RangeEncoder, TpaqPredictor,
};
use cascata_transform::{
    BrtCodec, FsdCodec, LzCodec, LzpCodec, NullTransform, RltCodec, RolzCodec, RolzXCodec,
    SrtCodec, X86Codec, ZrltCodec,
};

use smallvec::SmallVec;

use crate::id::{EntropyCodecId, TransformId};

/// Instantiates a transform from its identifier.
pub fn new_transform(id: TransformId, params: &CodecParams) -> Result<Box<dyn ByteTransform>> {
    let t: Box<dyn ByteTransform> = match id {
        TransformId::None => Box::new(NullTransform::new()),
        TransformId::Lz => Box::new(LzCodec::new(false)),
        TransformId::Lzx => Box::new(LzCodec::new(true)),
        TransformId::Lzp => Box::new(LzpCodec::new()),
        TransformId::Rolz => Box::new(RolzCodec::new(params.log_pos_checks())),
        TransformId::RolzX => Box::new(RolzXCodec::new(params.log_pos_checks())),
        TransformId::Rlt => Box::new(RltCodec::new()),
        TransformId::Zrlt => Box::new(ZrltCodec::new()),
        TransformId::Srt => Box::new(SrtCodec::new()),
        TransformId::Brt => Box::new(BrtCodec::new()),
        TransformId::Fsd => Box::new(FsdCodec::new(params.full_fsd())),
        TransformId::X86 => Box::new(X86Codec::new()),
    };
    Ok(t)
}

/// Builds a transform sequence from a list of identifiers.
pub fn new_sequence(ids: &[TransformId], params: &CodecParams) -> Result<TransformSequence> {
    let mut stages = SmallVec::new();

    for &id in ids {
        stages.push(new_transform(id, params)?);
    }

    TransformSequence::new(stages)
}

/// The dictionary-transform pair the `extra` parameter selects.
pub fn preferred_lz(params: &CodecParams) -> TransformId {
    if params.extra() {
        TransformId::Lzx
    }
    else {
        TransformId::Lz
    }
}

/// The reduced-offset pair the `extra` parameter selects.
pub fn preferred_rolz(params: &CodecParams) -> TransformId {
    if params.extra() {
        TransformId::RolzX
    }
    else {
        TransformId::Rolz
    }
}

/// Instantiates an entropy encoder over the borrowed bit writer.
pub fn new_entropy_encoder<'a, W: WriteBytes>(
    id: EntropyCodecId,
    bw: &'a mut BitWriterLtr<W>,
    params: &CodecParams,
) -> Result<Box<dyn EntropyEncoder + 'a>> {
    let chunk_size = params.chunk_size();
    let log_range = params.log_range();

    let enc: Box<dyn EntropyEncoder + 'a> = match id {
        EntropyCodecId::None => Box::new(NullEncoder::new(bw)),
        EntropyCodecId::Huffman => Box::new(HuffmanEncoder::new(bw, chunk_size)),
        EntropyCodecId::ExpGolomb => Box::new(ExpGolombEncoder::new(bw)),
        EntropyCodecId::Range => Box::new(RangeEncoder::new(bw, chunk_size, log_range)),
        EntropyCodecId::Ans => Box::new(AnsEncoder::new(bw, chunk_size, log_range)),
        EntropyCodecId::Fpaq => {
            Box::new(BinaryEntropyEncoder::new(bw, FpaqPredictor::new()))
        }
        EntropyCodecId::Cm => Box::new(BinaryEntropyEncoder::new(bw, CmPredictor::new())),
        EntropyCodecId::Tpaq => Box::new(BinaryEntropyEncoder::new(bw, TpaqPredictor::new())),
    };
    Ok(enc)
}

/// Instantiates an entropy decoder over the borrowed bit reader.
pub fn new_entropy_decoder<'a, 'b: 'a>(
    id: EntropyCodecId,
    br: &'a mut BitReaderLtr<'b>,
    params: &CodecParams,
) -> Result<Box<dyn EntropyDecoder + 'a>> {
    let chunk_size = params.chunk_size();

    let dec: Box<dyn EntropyDecoder + 'a> = match id {
        EntropyCodecId::None => Box::new(NullDecoder::new(br)),
        EntropyCodecId::Huffman => Box::new(HuffmanDecoder::new(br, chunk_size)),
        EntropyCodecId::ExpGolomb => Box::new(ExpGolombDecoder::new(br)),
        EntropyCodecId::Range => Box::new(RangeDecoder::new(br, chunk_size)),
        EntropyCodecId::Ans => Box::new(AnsDecoder::new(br, chunk_size)),
        EntropyCodecId::Fpaq => {
            Box::new(BinaryEntropyDecoder::new(br, FpaqPredictor::new()))
        }
        EntropyCodecId::Cm => Box::new(BinaryEntropyDecoder::new(br, CmPredictor::new())),
        EntropyCodecId::Tpaq => Box::new(BinaryEntropyDecoder::new(br, TpaqPredictor::new())),
    };
    Ok(dec)
}
