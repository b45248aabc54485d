// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end scenarios over concrete pipelines: characteristic inputs through the full
//! transform-plus-entropy stack, with ratio expectations.

use cascata::{BlockCodec, BlockSummary, EntropyCodecId, TransformId};
use cascata_core::params::CodecParams;

use rand::rngs::SmallRng;
use rand::{seq::SliceRandom, RngCore, SeedableRng};

fn run(
    pipeline: &[TransformId],
    entropy: EntropyCodecId,
    params: CodecParams,
    data: &[u8],
) -> (BlockSummary, Vec<u8>) {
    let mut codec = BlockCodec::new(pipeline, entropy, params).unwrap();

    let mut payload = Vec::new();
    let summary = codec.encode_block(data, &mut payload).unwrap();

    let mut out = vec![0u8; data.len()];
    let n = codec
        .decode_block(&payload, summary.skip_mask, summary.transformed_len, data.len(), &mut out)
        .unwrap();

    assert_eq!(n, data.len());
    assert_eq!(out, data, "inverse must be exact");

    (summary, payload)
}

#[test]
fn scenario_zero_block_through_zrlt_ans() {
    let data = vec![0u8; 4096];

    let (_, payload) =
        run(&[TransformId::Zrlt], EntropyCodecId::Ans, CodecParams::new(), &data);

    assert!(payload.len() <= 32, "4 KiB of zeros took {} bytes", payload.len());
}

#[test]
fn scenario_periodic_text_through_lzx_huffman() {
    let mut data = Vec::new();
    while data.len() < 1 << 20 {
        data.extend_from_slice(b"abc");
    }
    data.truncate(1 << 20);

    let (_, payload) =
        run(&[TransformId::Lzx], EntropyCodecId::Huffman, CodecParams::new(), &data);

    assert!(
        payload.len() <= data.len() / 100,
        "periodic text took {} bytes for {}",
        payload.len(),
        data.len()
    );
}

#[test]
fn scenario_skewed_alphabet_through_range() {
    // An eight-symbol alphabet with frequency i+1 per symbol i, shuffled; small enough that
    // the chunk header takes the delta route for the alphabet.
    let mut data = Vec::new();
    for i in 0..8u8 {
        data.extend_from_slice(&vec![i; 100 * (usize::from(i) + 1)]);
    }
    let mut rng = SmallRng::seed_from_u64(0x5ca1e);
    data.shuffle(&mut rng);

    let (summary, payload) = run(&[], EntropyCodecId::Range, CodecParams::new(), &data);

    assert_eq!(summary.skip_mask, 0xFF);
    // 8 symbols, skewed: strictly below 3 bits per symbol plus the header.
    assert!(payload.len() < data.len() * 3 / 8 + 64);
}

#[test]
fn scenario_random_block_skips_everything() {
    let mut rng = SmallRng::seed_from_u64(0xc11a0);
    let mut data = vec![0u8; 16 * 1024];
    rng.fill_bytes(&mut data);

    let pipeline = [
        TransformId::Lz,
        TransformId::Lzp,
        TransformId::Rlt,
        TransformId::Zrlt,
        TransformId::Fsd,
        TransformId::X86,
    ];

    let (summary, payload) = run(&pipeline, EntropyCodecId::None, CodecParams::new(), &data);

    assert_eq!(summary.skip_mask, 0xFF);
    assert_eq!(summary.transformed_len, data.len());
    assert!(payload.len() <= data.len() + 8, "overhead must be a small constant");
}

#[test]
fn scenario_x86_stage_improves_code_ratio() {
    // Call-heavy synthetic code: E8/E9 with small displacements to shared targets.
    let len = 64 * 1024;
    let mut rng = SmallRng::seed_from_u64(0xe8e9);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);

    // Lower the noise so the literals stay compressible.
    for b in data.iter_mut() {
        *b &= 0x0F;
    }

    let targets = [512i64, 4096, 16384, 40000];
    let mut i = 32usize;
    let mut k = 0usize;
    let mut jumps = 0usize;
    while i + 16 < len {
        let disp = targets[k % targets.len()] - i as i64;
        data[i] = if k % 2 == 0 { 0xE8 } else { 0xE9 };
        data[i + 1..i + 5].copy_from_slice(&(disp as i32).to_le_bytes());
        i += 96;
        k += 1;
        jumps += 1;
    }
    assert!(jumps >= 512);

    let params = CodecParams::new();

    let (_, with_x86) = run(
        &[TransformId::X86, TransformId::Lzx],
        EntropyCodecId::Range,
        params,
        &data,
    );
    let (_, without_x86) =
        run(&[TransformId::Lzx], EntropyCodecId::Range, params, &data);

    assert!(
        with_x86.len() < without_x86.len(),
        "x86 stage must improve the ratio: {} vs {}",
        with_x86.len(),
        without_x86.len()
    );
}

#[test]
fn scenario_alternating_bytes_through_fsd_ans() {
    let data: Vec<u8> =
        (0..32 * 1024).map(|i| if i % 2 == 0 { 0x00 } else { 0xFF }).collect();

    let (summary, payload) =
        run(&[TransformId::Fsd], EntropyCodecId::Ans, CodecParams::new(), &data);

    // FSD must run (mask bit 0 clear); the delta stream is two symbols, so the order-0 coder
    // gets close to one bit per byte.
    assert_eq!(summary.skip_mask & 1, 0);
    assert!(
        payload.len() < data.len() / 4,
        "alternating block took {} bytes",
        payload.len()
    );
}
