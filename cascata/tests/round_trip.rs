// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Universal invariants of the engine: every transform and entropy coder round-trips, the
//! skip machinery is idempotent, expansion is bounded, and output is deterministic.

use cascata::{factory, BlockCodec, EntropyCodecId, TransformId};
use cascata_core::io::{BitReaderLtr, BitWriterLtr};
use cascata_core::params::CodecParams;
use cascata_core::transform::ForwardStatus;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// A spread of data shapes: runs, text repeats, ramps, noise, and noise with structure.
fn test_corpora(len: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = SmallRng::seed_from_u64(seed);

    let zeros = vec![0u8; len];

    let mut text = Vec::with_capacity(len);
    while text.len() < len {
        text.extend_from_slice(b"it was the best of times, it was the worst of times. ");
    }
    text.truncate(len);

    let ramp: Vec<u8> = (0..len).map(|i| (i / 7) as u8).collect();

    let mut noise = vec![0u8; len];
    rng.fill_bytes(&mut noise);

    let mut mixed = Vec::with_capacity(len);
    while mixed.len() < len {
        mixed.extend_from_slice(b"key=value;");
        let mut gap = vec![0u8; 11];
        rng.fill_bytes(&mut gap);
        mixed.extend_from_slice(&gap);
    }
    mixed.truncate(len);

    vec![zeros, text, ramp, noise, mixed]
}

#[test]
fn verify_every_transform_round_trips() {
    let params = CodecParams::new();

    for id in TransformId::ALL {
        for len in [0usize, 1, 2, 3, 4, 100, 1024, 65536] {
            for (c, data) in test_corpora(len, 0xc0de + len as u64).into_iter().enumerate() {
                let mut t = factory::new_transform(id, &params).unwrap();
                let max = t.max_encoded_len(data.len());
                let mut fwd = vec![0u8; max];

                match t.forward(&data, &mut fwd).unwrap() {
                    ForwardStatus::Applied(out) => {
                        // Bounded expansion.
                        assert!(
                            out.written <= max,
                            "{} expanded past its bound on corpus {}",
                            id,
                            c
                        );

                        let mut inv = vec![0u8; max.max(data.len())];
                        let res = t.inverse(&fwd[..out.written], &mut inv).unwrap();

                        assert_eq!(res.written, data.len(), "{} len, corpus {}", id, c);
                        assert_eq!(&inv[..res.written], &data[..], "{} data, corpus {}", id, c);
                    }
                    ForwardStatus::Skipped => {
                        // A skip is a legal outcome; the caller applies identity instead.
                    }
                }
            }
        }
    }
}

#[test]
fn verify_every_entropy_coder_round_trips() {
    let params = CodecParams::new().with_chunk_size(16 * 1024).unwrap();

    for id in EntropyCodecId::ALL {
        for len in [0usize, 1, 2, 3, 255, 4096, 100_000] {
            for (c, data) in test_corpora(len, 0xdeed + len as u64).into_iter().enumerate() {
                let mut sink = Vec::new();

                {
                    let mut bw = BitWriterLtr::new(&mut sink);
                    let mut enc = factory::new_entropy_encoder(id, &mut bw, &params).unwrap();
                    assert_eq!(enc.encode(&data).unwrap(), data.len());
                    enc.dispose().unwrap();
                    drop(enc);
                    bw.close().unwrap();
                }

                let mut out = vec![0u8; data.len()];

                {
                    let mut br = BitReaderLtr::new(&sink);
                    let mut dec = factory::new_entropy_decoder(id, &mut br, &params).unwrap();
                    assert_eq!(dec.decode(&mut out).unwrap(), data.len());
                    dec.dispose().unwrap();
                }

                assert_eq!(out, data, "{} corpus {} len {}", id, c, len);
            }
        }
    }
}

#[test]
fn verify_entropy_chunk_boundaries() {
    // A chunk size that does not divide the block forces a short trailing chunk.
    let params = CodecParams::new().with_chunk_size(1024).unwrap();
    let data = test_corpora(10_000, 0x05eed).remove(1);

    for id in [EntropyCodecId::Huffman, EntropyCodecId::Range, EntropyCodecId::Ans] {
        let mut sink = Vec::new();

        {
            let mut bw = BitWriterLtr::new(&mut sink);
            let mut enc = factory::new_entropy_encoder(id, &mut bw, &params).unwrap();
            enc.encode(&data).unwrap();
            enc.dispose().unwrap();
            drop(enc);
            bw.close().unwrap();
        }

        let mut out = vec![0u8; data.len()];
        let mut br = BitReaderLtr::new(&sink);
        let mut dec = factory::new_entropy_decoder(id, &mut br, &params).unwrap();
        dec.decode(&mut out).unwrap();

        assert_eq!(out, data, "{}", id);
    }
}

fn block_round_trip(
    pipeline: &[TransformId],
    entropy: EntropyCodecId,
    params: CodecParams,
    data: &[u8],
) -> (u8, Vec<u8>) {
    let mut codec = BlockCodec::new(pipeline, entropy, params).unwrap();

    let mut payload = Vec::new();
    let summary = codec.encode_block(data, &mut payload).unwrap();

    assert_eq!(summary.payload_len, payload.len());

    let mut out = vec![0u8; data.len()];
    let n = codec
        .decode_block(&payload, summary.skip_mask, summary.transformed_len, data.len(), &mut out)
        .unwrap();

    assert_eq!(n, data.len());
    assert_eq!(out, data);

    (summary.skip_mask, payload)
}

#[test]
fn verify_sequence_round_trips() {
    let params = CodecParams::new();

    let pipelines: [&[TransformId]; 6] = [
        &[TransformId::Lz],
        &[TransformId::Rlt, TransformId::Zrlt],
        &[TransformId::Srt, TransformId::Zrlt],
        &[TransformId::Fsd, TransformId::Lz, TransformId::Zrlt],
        &[TransformId::X86, TransformId::Lzx],
        &[
            TransformId::Rlt,
            TransformId::Fsd,
            TransformId::Lz,
            TransformId::Brt,
            TransformId::Zrlt,
            TransformId::Lzp,
            TransformId::Rolz,
            TransformId::X86,
        ],
    ];

    for entropy in [EntropyCodecId::Huffman, EntropyCodecId::Ans, EntropyCodecId::Fpaq] {
        for pipeline in pipelines {
            for data in test_corpora(20_000, 0xabc) {
                block_round_trip(pipeline, entropy, params, &data);
            }
        }
    }
}

#[test]
fn verify_skip_mask_idempotence() {
    // Cryptographic-grade noise defeats every transform, so the mask must read all-ones and
    // the entropy stage sees the block untouched.
    let mut rng = SmallRng::seed_from_u64(0xffff_aaaa);
    let mut data = vec![0u8; 16 * 1024];
    rng.fill_bytes(&mut data);

    let pipeline =
        [TransformId::Lz, TransformId::Rlt, TransformId::Zrlt, TransformId::Fsd, TransformId::X86];

    let mut codec = BlockCodec::new(&pipeline, EntropyCodecId::None, CodecParams::new()).unwrap();

    let mut payload = Vec::new();
    let summary = codec.encode_block(&data, &mut payload).unwrap();

    assert_eq!(summary.skip_mask, 0xFF);
    assert_eq!(summary.transformed_len, data.len());

    // The null coder emits the block plus only byte-alignment padding.
    assert!(payload.len() <= data.len() + 8);

    let mut out = vec![0u8; data.len()];
    codec
        .decode_block(&payload, summary.skip_mask, summary.transformed_len, data.len(), &mut out)
        .unwrap();
    assert_eq!(out, data);
}

#[test]
fn verify_determinism() {
    let data = test_corpora(50_000, 0x1234).remove(4);

    let pipeline = [TransformId::Lz, TransformId::Zrlt];

    let mut first: Option<(u8, Vec<u8>)> = None;

    for _ in 0..3 {
        let got = block_round_trip(&pipeline, EntropyCodecId::Range, CodecParams::new(), &data);

        match &first {
            None => first = Some(got),
            Some(prev) => {
                assert_eq!(prev.0, got.0);
                assert_eq!(prev.1, got.1, "bitstream must be byte-identical across runs");
            }
        }
    }
}

#[test]
fn verify_predictors_approach_observed_bit() {
    use cascata_core::entropy::Predictor;

    fn drive<P: Predictor>(mut p: P, bit: bool) -> (u32, u32) {
        let before = p.get();
        for _ in 0..4096 {
            let _ = p.get();
            p.update(bit);
        }
        (before, p.get())
    }

    let (before, after) = drive(cascata_entropy::FpaqPredictor::new(), true);
    assert!(after > before && after > 3900);

    let (before, after) = drive(cascata_entropy::FpaqPredictor::new(), false);
    assert!(after < before && after < 100);

    let (_, after) = drive(cascata_entropy::CmPredictor::new(), true);
    assert!(after > 3800);

    let (_, after) = drive(cascata_entropy::TpaqPredictor::new(), false);
    assert!(after < 300);
}

#[test]
fn verify_block_codec_reset_isolation() {
    // A failed or odd block must not poison the next one.
    let params = CodecParams::new();
    let mut codec =
        BlockCodec::new(&[TransformId::Lzp], EntropyCodecId::Huffman, params).unwrap();

    let mut rng = SmallRng::seed_from_u64(0x777);
    let mut noisy = vec![0u8; 8192];
    rng.fill_bytes(&mut noisy);

    let repeats: Vec<u8> = b"abcdefgh".iter().copied().cycle().take(8192).collect();

    for data in [&noisy, &repeats, &noisy, &repeats] {
        let mut payload = Vec::new();
        let summary = codec.encode_block(data, &mut payload).unwrap();

        let mut out = vec![0u8; data.len()];
        codec
            .decode_block(&payload, summary.skip_mask, summary.transformed_len, data.len(), &mut out)
            .unwrap();
        assert_eq!(&out, data);

        codec.reset();
    }
}
