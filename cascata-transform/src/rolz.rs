// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `rolz` module implements reduced-offset Lempel-Ziv.
//!
//! Match candidates are restricted to a ring of recent positions sharing the same two-byte
//! key, so a match transmits only a tiny ring index instead of a distance. The decoder
//! maintains the identical ring over its own output, which is why the index must address the
//! raw ring slot: the encoder's content-hash filter is a private pruning device, never part of
//! the wire format. Blocks are processed in 16 MiB sub-chunks so ring entries fit a 24-bit
//! position next to the 8-bit hash filter.
//!
//! Two codecs share the matcher. [`RolzCodec`] entropy-codes its mode, literal, length, and
//! index streams with the ANS coder; [`RolzXCodec`] routes every bit through the binary
//! arithmetic coder under a small banked predictor.

use cascata_core::entropy::{EntropyDecoder, EntropyEncoder, Predictor};
use cascata_core::errors::{decode_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr};
use cascata_core::transform::{ByteTransform, ForwardStatus, TransformOutput};
use cascata_core::util::bits::{read_be_u32, write_be_u32};

use cascata_entropy::{AnsDecoder, AnsEncoder, BinaryEntropyDecoder, BinaryEntropyEncoder};

use log::debug;

use crate::pack;

const MIN_BLOCK_LEN: usize = 512;

const MIN_MATCH: usize = 4;

/// Length field ceiling; longer repeats split into consecutive matches.
const MAX_MATCH: usize = MIN_MATCH + 0xFFFF;

/// Sub-chunk size; ring entries hold positions relative to the chunk start.
const CHUNK_SIZE: usize = 1 << 24;

/// Two-byte keys.
const KEY_COUNT: usize = 1 << 16;

/// Scale used by the embedded ANS coder.
const ANS_LOG_RANGE: u32 = 12;

#[inline(always)]
fn key_at(buf: &[u8], idx: usize) -> usize {
    (usize::from(buf[idx - 2]) << 8) | usize::from(buf[idx - 1])
}

#[inline(always)]
fn hash8(buf: &[u8], idx: usize) -> u32 {
    let v = u32::from(buf[idx])
        | (u32::from(buf[idx + 1]) << 8)
        | (u32::from(buf[idx + 2]) << 16)
        | (u32::from(buf[idx + 3]) << 24);
    v.wrapping_mul(0x9E37_79B9) >> 24
}

/// The per-key ring of recent positions shared by both ROLZ codecs.
struct RolzMatcher {
    log_pos_checks: u32,
    counters: Vec<u32>,
    rings: Vec<u32>,
}

impl RolzMatcher {
    fn new(log_pos_checks: u32) -> Self {
        RolzMatcher { log_pos_checks, counters: Vec::new(), rings: Vec::new() }
    }

    fn reset_chunk(&mut self) {
        if self.counters.is_empty() {
            self.counters.resize(KEY_COUNT, 0);
            self.rings.resize(KEY_COUNT << self.log_pos_checks, 0);
        }
        else {
            self.counters.fill(0);
        }
    }

    #[inline(always)]
    fn mask(&self) -> u32 {
        (1 << self.log_pos_checks) - 1
    }

    /// Records `idx` under its key. The stored filter hash is only read by `find`, so the
    /// decoder may insert with a dummy fingerprint.
    #[inline]
    fn insert(&mut self, buf: &[u8], idx: usize, with_hash: bool) {
        if idx + 4 > buf.len() {
            return;
        }

        let key = key_at(buf, idx);
        let h = if with_hash { hash8(buf, idx) } else { 0 };
        let slot = (key << self.log_pos_checks) + (self.counters[key] & self.mask()) as usize;

        self.rings[slot] = (h << 24) | (idx as u32 & 0x00FF_FFFF);
        self.counters[key] += 1;
    }

    /// Returns the best `(length, ring index)` at `idx`, or None.
    fn find(&self, buf: &[u8], idx: usize) -> Option<(usize, usize)> {
        if idx + MIN_MATCH > buf.len() {
            return None;
        }

        let key = key_at(buf, idx);
        let counter = self.counters[key];
        let checks = counter.min(self.mask() + 1);
        let h = hash8(buf, idx);

        let mut best: Option<(usize, usize)> = None;

        for k in 0..checks {
            let slot =
                (key << self.log_pos_checks) + ((counter - 1 - k) & self.mask()) as usize;
            let entry = self.rings[slot];

            if entry >> 24 != h {
                continue;
            }

            let pos = (entry & 0x00FF_FFFF) as usize;

            let limit = (buf.len() - idx).min(MAX_MATCH);
            let mut len = 0usize;
            while len < limit && buf[pos + len] == buf[idx + len] {
                len += 1;
            }

            if len >= MIN_MATCH && best.map_or(true, |(blen, _)| len > blen) {
                best = Some((len, k as usize));
            }
        }

        best
    }

    /// Resolves a transmitted ring index back to a position.
    fn resolve(&self, buf: &[u8], idx: usize, ring_idx: usize) -> Result<usize> {
        let key = key_at(buf, idx);
        let counter = self.counters[key];
        let checks = counter.min(self.mask() + 1);

        if ring_idx as u32 >= checks {
            return decode_error("rolz: ring index out of range");
        }

        let slot = (key << self.log_pos_checks)
            + ((counter - 1 - ring_idx as u32) & self.mask()) as usize;
        let pos = (self.rings[slot] & 0x00FF_FFFF) as usize;

        if pos >= idx {
            return decode_error("rolz: ring position out of range");
        }

        Ok(pos)
    }
}

/// One decided step of the forward pass.
enum Step {
    Literal(u8),
    Match { len: usize, ring_idx: usize },
}

/// Runs the shared matching loop over one chunk, handing each decision to `emit`.
fn forward_chunk<F>(matcher: &mut RolzMatcher, chunk: &[u8], mut emit: F)
where
    F: FnMut(Step),
{
    matcher.reset_chunk();

    let mut idx = 2usize;

    while idx < chunk.len() {
        let found = matcher.find(chunk, idx);

        match found {
            Some((len, ring_idx)) => {
                for j in idx..idx + len {
                    matcher.insert(chunk, j, true);
                }
                emit(Step::Match { len, ring_idx });
                idx += len;
            }
            None => {
                matcher.insert(chunk, idx, true);
                emit(Step::Literal(chunk[idx]));
                idx += 1;
            }
        }
    }
}

/// ROLZ with ANS-coded streams.
pub struct RolzCodec {
    matcher: RolzMatcher,
    modes: Vec<u8>,
    lits: Vec<u8>,
    lens: Vec<u8>,
    idxs: Vec<u8>,
}

impl RolzCodec {
    pub fn new(log_pos_checks: u32) -> Self {
        RolzCodec {
            matcher: RolzMatcher::new(log_pos_checks),
            modes: Vec::new(),
            lits: Vec::new(),
            lens: Vec::new(),
            idxs: Vec::new(),
        }
    }

    fn encode_stream(out: &mut Vec<u8>, stream: &[u8]) -> Result<()> {
        let mut enc_bytes = Vec::new();

        if !stream.is_empty() {
            let mut bw = BitWriterLtr::new(&mut enc_bytes);
            let mut enc = AnsEncoder::new(&mut bw, 0, ANS_LOG_RANGE);
            enc.encode(stream)?;
            enc.dispose()?;
            bw.close()?;
        }

        let mut head = [0u8; 8];
        write_be_u32(&mut head[0..], stream.len() as u32);
        write_be_u32(&mut head[4..], enc_bytes.len() as u32);

        out.extend_from_slice(&head);
        out.extend_from_slice(&enc_bytes);

        Ok(())
    }

    fn decode_stream(src: &[u8], pos: &mut usize) -> Result<Vec<u8>> {
        if *pos + 8 > src.len() {
            return decode_error("rolz: truncated stream header");
        }

        let raw_len = read_be_u32(&src[*pos..]) as usize;
        let enc_len = read_be_u32(&src[*pos + 4..]) as usize;
        *pos += 8;

        if *pos + enc_len > src.len() {
            return decode_error("rolz: truncated stream");
        }

        let mut out = vec![0u8; raw_len];

        if raw_len > 0 {
            let mut br = BitReaderLtr::new(&src[*pos..*pos + enc_len]);
            let mut dec = AnsDecoder::new(&mut br, 0);
            dec.decode(&mut out)?;
        }

        *pos += enc_len;

        Ok(out)
    }
}

impl ByteTransform for RolzCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let mut out = Vec::new();

        for chunk in src.chunks(CHUNK_SIZE) {
            let mut head = [0u8; 4];
            write_be_u32(&mut head, chunk.len() as u32);
            out.extend_from_slice(&head);
            out.extend_from_slice(&chunk[..chunk.len().min(2)]);

            self.modes.clear();
            self.lits.clear();
            self.lens.clear();
            self.idxs.clear();

            let modes = &mut self.modes;
            let lits = &mut self.lits;
            let lens = &mut self.lens;
            let idxs = &mut self.idxs;

            forward_chunk(&mut self.matcher, chunk, |step| match step {
                Step::Literal(b) => {
                    modes.push(0);
                    lits.push(b);
                }
                Step::Match { len, ring_idx } => {
                    modes.push(1);
                    pack::emit_length(lens, len - MIN_MATCH);
                    idxs.push(ring_idx as u8);
                }
            });

            Self::encode_stream(&mut out, &self.modes)?;
            Self::encode_stream(&mut out, &self.lits)?;
            Self::encode_stream(&mut out, &self.lens)?;
            Self::encode_stream(&mut out, &self.idxs)?;

            if out.len() >= src.len() {
                debug!("rolz: no gain ({} -> {}+)", src.len(), out.len());
                return Ok(ForwardStatus::Skipped);
            }
        }

        if out.len() > dst.len() {
            return Ok(ForwardStatus::Skipped);
        }

        dst[..out.len()].copy_from_slice(&out);

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: out.len() }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        let mut src_idx = 0usize;
        let mut dst_idx = 0usize;

        while src_idx < src.len() {
            if src_idx + 4 > src.len() {
                return decode_error("rolz: truncated chunk header");
            }

            let raw_len = read_be_u32(&src[src_idx..]) as usize;
            src_idx += 4;

            if raw_len > CHUNK_SIZE || dst_idx + raw_len > dst.len() {
                return decode_error("rolz: chunk overflows the block");
            }

            let lead = raw_len.min(2);
            if src_idx + lead > src.len() {
                return decode_error("rolz: truncated chunk");
            }

            let chunk = &mut dst[dst_idx..dst_idx + raw_len];
            chunk[..lead].copy_from_slice(&src[src_idx..src_idx + lead]);
            src_idx += lead;

            let modes = Self::decode_stream(src, &mut src_idx)?;
            let lits = Self::decode_stream(src, &mut src_idx)?;
            let lens = Self::decode_stream(src, &mut src_idx)?;
            let idxs = Self::decode_stream(src, &mut src_idx)?;

            self.matcher.reset_chunk();

            let mut idx = lead;
            let mut l_idx = 0usize;
            let mut e_idx = 0usize;
            let mut i_idx = 0usize;

            for &mode in modes.iter() {
                if idx >= raw_len {
                    return decode_error("rolz: steps overflow the chunk");
                }

                if mode == 0 {
                    let b = match lits.get(l_idx) {
                        Some(&b) => b,
                        None => return decode_error("rolz: missing literal"),
                    };
                    l_idx += 1;

                    chunk[idx] = b;
                    self.matcher.insert(chunk, idx, false);
                    idx += 1;
                }
                else {
                    let len = MIN_MATCH + pack::decode_length(&lens, &mut e_idx)?;
                    let ring_idx = match idxs.get(i_idx) {
                        Some(&k) => usize::from(k),
                        None => return decode_error("rolz: missing ring index"),
                    };
                    i_idx += 1;

                    if idx + len > raw_len {
                        return decode_error("rolz: match overflows the chunk");
                    }

                    let pos = self.matcher.resolve(chunk, idx, ring_idx)?;

                    for k in 0..len {
                        chunk[idx + k] = chunk[pos + k];
                    }
                    for j in idx..idx + len {
                        self.matcher.insert(chunk, j, false);
                    }

                    idx += len;
                }
            }

            if idx != raw_len {
                return decode_error("rolz: chunk shorter than its header claims");
            }

            dst_idx += raw_len;
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len.max(64)
    }

    fn reset(&mut self) {
        self.matcher.reset_chunk();
        self.modes.clear();
        self.lits.clear();
        self.lens.clear();
        self.idxs.clear();
    }

    fn name(&self) -> &'static str {
        "ROLZ"
    }
}

/// Predictor banks for the bit-coded ROLZ variant.
mod bank {
    pub const MODE: usize = 0;
    pub const LIT: usize = 1;
    pub const LEN: usize = 2;
    pub const LEN_HI: usize = 3;
    pub const LEN_LO: usize = 4;
    pub const IDX: usize = 5;
    pub const COUNT: usize = 6;
}

/// Short adaptive model for [`RolzXCodec`]: one probability tree per field bank.
pub struct RolzPredictor {
    probs: Vec<u16>,
    bank: usize,
    ctx: usize,
}

impl RolzPredictor {
    fn new() -> Self {
        RolzPredictor { probs: vec![32768; bank::COUNT * 256], bank: 0, ctx: 1 }
    }

    fn set_bank(&mut self, bank: usize) {
        self.bank = bank;
        self.ctx = 1;
    }
}

impl Predictor for RolzPredictor {
    #[inline(always)]
    fn get(&mut self) -> u32 {
        u32::from(self.probs[(self.bank << 8) + self.ctx] >> 4)
    }

    #[inline(always)]
    fn update(&mut self, bit: bool) {
        let p = &mut self.probs[(self.bank << 8) + self.ctx];

        if bit {
            *p += (65535 - *p) >> 5;
        }
        else {
            *p -= *p >> 5;
        }

        self.ctx = (self.ctx << 1) | usize::from(bit);
        if self.ctx >= 256 {
            self.ctx = 1;
        }
    }
}

/// ROLZ with a binary arithmetic coder over every field.
pub struct RolzXCodec {
    matcher: RolzMatcher,
}

impl RolzXCodec {
    pub fn new(log_pos_checks: u32) -> Self {
        RolzXCodec { matcher: RolzMatcher::new(log_pos_checks) }
    }
}

impl ByteTransform for RolzXCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<ForwardStatus> {
        if src.is_empty() {
            return Ok(ForwardStatus::Applied(TransformOutput { read: 0, written: 0 }));
        }

        if src.len() < MIN_BLOCK_LEN {
            return Ok(ForwardStatus::Skipped);
        }

        let log_pos_checks = self.matcher.log_pos_checks;
        let mut out = Vec::new();

        for chunk in src.chunks(CHUNK_SIZE) {
            let mut head = [0u8; 4];
            write_be_u32(&mut head, chunk.len() as u32);
            out.extend_from_slice(&head);
            out.extend_from_slice(&chunk[..chunk.len().min(2)]);

            let mut payload = Vec::new();
            {
                let mut bw = BitWriterLtr::new(&mut payload);
                let mut enc = BinaryEntropyEncoder::new(&mut bw, RolzPredictor::new());
                let mut failed = None;

                forward_chunk(&mut self.matcher, chunk, |step| {
                    let r = encode_step(&mut enc, step, log_pos_checks);
                    if failed.is_none() {
                        failed = r.err();
                    }
                });

                if let Some(e) = failed {
                    return Err(e);
                }

                enc.dispose()?;
                bw.close()?;
            }

            let mut head = [0u8; 4];
            write_be_u32(&mut head, payload.len() as u32);
            out.extend_from_slice(&head);
            out.extend_from_slice(&payload);

            if out.len() >= src.len() {
                debug!("rolzx: no gain ({} -> {}+)", src.len(), out.len());
                return Ok(ForwardStatus::Skipped);
            }
        }

        if out.len() > dst.len() {
            return Ok(ForwardStatus::Skipped);
        }

        dst[..out.len()].copy_from_slice(&out);

        Ok(ForwardStatus::Applied(TransformOutput { read: src.len(), written: out.len() }))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformOutput> {
        if src.is_empty() {
            return Ok(TransformOutput { read: 0, written: 0 });
        }

        let log_pos_checks = self.matcher.log_pos_checks;

        let mut src_idx = 0usize;
        let mut dst_idx = 0usize;

        while src_idx < src.len() {
            if src_idx + 4 > src.len() {
                return decode_error("rolzx: truncated chunk header");
            }

            let raw_len = read_be_u32(&src[src_idx..]) as usize;
            src_idx += 4;

            if raw_len > CHUNK_SIZE || dst_idx + raw_len > dst.len() {
                return decode_error("rolzx: chunk overflows the block");
            }

            let lead = raw_len.min(2);
            if src_idx + lead > src.len() {
                return decode_error("rolzx: truncated chunk");
            }

            let chunk = &mut dst[dst_idx..dst_idx + raw_len];
            chunk[..lead].copy_from_slice(&src[src_idx..src_idx + lead]);
            src_idx += lead;

            if src_idx + 4 > src.len() {
                return decode_error("rolzx: truncated payload header");
            }
            let payload_len = read_be_u32(&src[src_idx..]) as usize;
            src_idx += 4;

            if src_idx + payload_len > src.len() {
                return decode_error("rolzx: truncated payload");
            }

            let mut br = BitReaderLtr::new(&src[src_idx..src_idx + payload_len]);
            let mut dec = BinaryEntropyDecoder::new(&mut br, RolzPredictor::new());

            self.matcher.reset_chunk();

            let mut idx = lead;

            while idx < raw_len {
                dec.predictor_mut().set_bank(bank::MODE);

                if dec.decode_bit()? {
                    let mut len = decode_bits(&mut dec, bank::LEN, 8)? as usize;
                    if len == 255 {
                        let hi = decode_bits(&mut dec, bank::LEN_HI, 8)? as usize;
                        let lo = decode_bits(&mut dec, bank::LEN_LO, 8)? as usize;
                        len = (hi << 8) | lo;
                    }
                    len += MIN_MATCH;

                    let ring_idx = decode_bits(&mut dec, bank::IDX, log_pos_checks)? as usize;

                    if idx + len > raw_len {
                        return decode_error("rolzx: match overflows the chunk");
                    }

                    let pos = self.matcher.resolve(chunk, idx, ring_idx)?;

                    for k in 0..len {
                        chunk[idx + k] = chunk[pos + k];
                    }
                    for j in idx..idx + len {
                        self.matcher.insert(chunk, j, false);
                    }

                    idx += len;
                }
                else {
                    let b = decode_bits(&mut dec, bank::LIT, 8)? as u8;

                    chunk[idx] = b;
                    self.matcher.insert(chunk, idx, false);
                    idx += 1;
                }
            }

            src_idx += payload_len;
            dst_idx += raw_len;
        }

        Ok(TransformOutput { read: src.len(), written: dst_idx })
    }

    fn max_encoded_len(&self, len: usize) -> usize {
        len.max(64)
    }

    fn reset(&mut self) {
        self.matcher.reset_chunk();
    }

    fn name(&self) -> &'static str {
        "ROLZX"
    }
}

fn encode_bits<W: cascata_core::io::WriteBytes>(
    enc: &mut BinaryEntropyEncoder<'_, W, RolzPredictor>,
    bank: usize,
    value: u32,
    width: u32,
) -> Result<()> {
    enc.predictor_mut().set_bank(bank);
    for i in (0..width).rev() {
        enc.encode_bit((value >> i) & 1 == 1)?;
    }
    Ok(())
}

fn decode_bits(
    dec: &mut BinaryEntropyDecoder<'_, '_, RolzPredictor>,
    bank: usize,
    width: u32,
) -> Result<u32> {
    dec.predictor_mut().set_bank(bank);
    let mut v = 0u32;
    for _ in 0..width {
        v = (v << 1) | u32::from(dec.decode_bit()?);
    }
    Ok(v)
}

fn encode_step<W: cascata_core::io::WriteBytes>(
    enc: &mut BinaryEntropyEncoder<'_, W, RolzPredictor>,
    step: Step,
    log_pos_checks: u32,
) -> Result<()> {
    match step {
        Step::Literal(b) => {
            enc.predictor_mut().set_bank(bank::MODE);
            enc.encode_bit(false)?;
            encode_bits(enc, bank::LIT, u32::from(b), 8)?;
        }
        Step::Match { len, ring_idx } => {
            enc.predictor_mut().set_bank(bank::MODE);
            enc.encode_bit(true)?;

            let l = (len - MIN_MATCH) as u32;
            if l < 255 {
                encode_bits(enc, bank::LEN, l, 8)?;
            }
            else {
                encode_bits(enc, bank::LEN, 255, 8)?;
                encode_bits(enc, bank::LEN_HI, l >> 8, 8)?;
                encode_bits(enc, bank::LEN_LO, l & 0xFF, 8)?;
            }

            encode_bits(enc, bank::IDX, ring_idx as u32, log_pos_checks)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};

    fn repetitive(len: usize) -> Vec<u8> {
        let phrase = b"a rose is a rose is a rose. ";
        let mut data = Vec::new();
        while data.len() < len {
            data.extend_from_slice(phrase);
        }
        data.truncate(len);
        data
    }

    fn round_trip_rolz(data: &[u8], lpc: u32) -> Option<usize> {
        let mut t = RolzCodec::new(lpc);
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => {
                let mut inv = vec![0u8; data.len()];
                let mut t2 = RolzCodec::new(lpc);
                let res = t2.inverse(&fwd[..out.written], &mut inv).unwrap();
                assert_eq!(res.written, data.len());
                assert_eq!(&inv[..res.written], data);
                Some(out.written)
            }
            ForwardStatus::Skipped => None,
        }
    }

    fn round_trip_rolzx(data: &[u8], lpc: u32) -> Option<usize> {
        let mut t = RolzXCodec::new(lpc);
        let mut fwd = vec![0u8; t.max_encoded_len(data.len())];

        match t.forward(data, &mut fwd).unwrap() {
            ForwardStatus::Applied(out) => {
                let mut inv = vec![0u8; data.len()];
                let mut t2 = RolzXCodec::new(lpc);
                let res = t2.inverse(&fwd[..out.written], &mut inv).unwrap();
                assert_eq!(res.written, data.len());
                assert_eq!(&inv[..res.written], data);
                Some(out.written)
            }
            ForwardStatus::Skipped => None,
        }
    }

    #[test]
    fn verify_rolz_repetitive_round_trip() {
        let data = repetitive(200_000);

        let n = round_trip_rolz(&data, 5).expect("repetitive data must not skip");
        assert!(n < data.len() / 4);
    }

    #[test]
    fn verify_rolzx_repetitive_round_trip() {
        let data = repetitive(200_000);

        let n = round_trip_rolzx(&data, 6).expect("repetitive data must not skip");
        assert!(n < data.len() / 4);
    }

    #[test]
    fn verify_rolz_mixed_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0x0122);
        let mut data = Vec::new();

        for _ in 0..100usize {
            data.extend_from_slice(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n");
            let mut noise = vec![0u8; 24];
            rng.fill_bytes(&mut noise);
            data.extend_from_slice(&noise);
        }

        round_trip_rolz(&data, 2).expect("structured data must not skip");
        round_trip_rolzx(&data, 8).expect("structured data must not skip");
    }

    #[test]
    fn verify_rolz_skips_random_and_short() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut data = vec![0u8; 32_768];
        rng.fill_bytes(&mut data);

        assert!(round_trip_rolz(&data, 5).is_none());
        assert!(round_trip_rolzx(&data, 5).is_none());
        assert!(round_trip_rolz(&data[..MIN_BLOCK_LEN - 1], 5).is_none());
    }
}
