// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `alphabet` module implements the shared alphabet and frequency-table coding used by the
//! chunk headers of the Huffman, Range, and ANS coders.
//!
//! An alphabet is a sorted subset of `0..=255`. Four encodings are available and the cheapest
//! is chosen per header:
//!
//! 1. full 256-symbol alphabet: marker bits `1,0`;
//! 2. identity alphabet `0..=127`: marker bits `1,1`;
//! 3. presence bitmask: `0,0` then 256 bits as four 64-bit words;
//! 4. delta list: `0,1` then a 5-bit count, a present/absent bit, a 3-bit delta width, and the
//!    symbol deltas (the first delta is the first symbol's value).

use cascata_core::errors::{decode_error, Result};
use cascata_core::io::{BitReaderLtr, BitWriterLtr, WriteBytes};
use cascata_core::util::bits::ilog2_u32;

use log::debug;

/// Largest symbol set the delta mode will list explicitly (present or absent).
const MAX_LISTED: usize = 32;

/// Encodes the sorted alphabet `symbols` into the bitstream.
pub fn encode_alphabet<W: WriteBytes>(
    bw: &mut BitWriterLtr<W>,
    symbols: &[u8],
) -> Result<()> {
    debug_assert!(!symbols.is_empty());
    debug_assert!(symbols.windows(2).all(|w| w[0] < w[1]));

    let count = symbols.len();

    if count == 256 {
        bw.write_bits(0b10, 2)?;
        return Ok(());
    }

    if count == 128 && symbols.iter().enumerate().all(|(i, &s)| i == usize::from(s)) {
        bw.write_bits(0b11, 2)?;
        return Ok(());
    }

    // List the smaller of the present and absent sets when it is small enough for delta mode.
    if count <= MAX_LISTED || 256 - count <= MAX_LISTED {
        let present = count <= MAX_LISTED;

        let mut listed = [0u8; MAX_LISTED];
        let n_listed = if present {
            listed[..count].copy_from_slice(symbols);
            count
        }
        else {
            let mut n = 0;
            let mut it = symbols.iter().peekable();
            for s in 0..=255u8 {
                if it.peek() == Some(&&s) {
                    it.next();
                }
                else {
                    listed[n] = s;
                    n += 1;
                }
            }
            n
        };

        // Deltas between consecutive listed symbols; the first is the symbol itself.
        let mut max_delta = u32::from(listed[0]);
        for w in listed[..n_listed].windows(2) {
            max_delta = max_delta.max(u32::from(w[1] - w[0]));
        }

        let delta_bits = if max_delta == 0 { 1 } else { ilog2_u32(max_delta) + 1 };

        debug!("alphabet: delta mode, {} listed, {} bits", n_listed, delta_bits);

        bw.write_bits(0b01, 2)?;
        bw.write_bits(n_listed as u64 - 1, 5)?;
        bw.write_bit(u32::from(present))?;
        bw.write_bits(u64::from(delta_bits - 1), 3)?;

        let mut prev = 0u32;
        for (i, &s) in listed[..n_listed].iter().enumerate() {
            let delta = if i == 0 { u32::from(s) } else { u32::from(s) - prev };
            bw.write_bits(u64::from(delta), delta_bits)?;
            prev = u32::from(s);
        }

        return Ok(());
    }

    // Presence bitmask, four 64-bit words, symbol 64*j+k at bit 63-k of word j.
    bw.write_bits(0b00, 2)?;

    let mut words = [0u64; 4];
    for &s in symbols {
        words[usize::from(s) >> 6] |= 1u64 << (63 - (usize::from(s) & 63));
    }
    for &w in words.iter() {
        bw.write_bits(w, 64)?;
    }

    Ok(())
}

/// Decodes an alphabet into `symbols`, returning the number of symbols present.
pub fn decode_alphabet(br: &mut BitReaderLtr<'_>, symbols: &mut [u8; 256]) -> Result<usize> {
    match br.read_bits(2)? {
        0b10 => {
            for (i, s) in symbols.iter_mut().enumerate() {
                *s = i as u8;
            }
            Ok(256)
        }
        0b11 => {
            for (i, s) in symbols.iter_mut().enumerate().take(128) {
                *s = i as u8;
            }
            Ok(128)
        }
        0b01 => {
            let n_listed = br.read_bits(5)? as usize + 1;
            let present = br.read_bit()? != 0;
            let delta_bits = br.read_bits(3)? as u32 + 1;

            let mut listed = [false; 256];
            let mut value = 0u32;

            for i in 0..n_listed {
                let delta = br.read_bits(delta_bits)? as u32;

                value = if i == 0 { delta } else { value + delta };

                if value > 255 || (i > 0 && delta == 0) {
                    return decode_error("alphabet: delta symbol out of range");
                }

                listed[value as usize] = true;
            }

            let mut count = 0;
            for s in 0..256 {
                if listed[s] == present {
                    symbols[count] = s as u8;
                    count += 1;
                }
            }
            Ok(count)
        }
        _ => {
            let mut count = 0;
            for j in 0..4usize {
                let word = br.read_bits(64)?;
                for k in 0..64usize {
                    if word & (1u64 << (63 - k)) != 0 {
                        symbols[count] = ((j << 6) | k) as u8;
                        count += 1;
                    }
                }
            }
            if count == 0 {
                return decode_error("alphabet: empty bitmask");
            }
            Ok(count)
        }
    }
}

/// Clamps the configured Range/ANS scale to the chunk: a tiny chunk gets a smaller scale, and
/// the 3-bit wire field caps the stored value at 15.
pub fn effective_log_range(log_range: u32, chunk_len: usize) -> u32 {
    let mut lr = log_range.min(15);
    while lr > 8 && (1u64 << lr) > 4 * chunk_len as u64 {
        lr -= 1;
    }
    lr
}

/// Scales the raw frequencies `freqs` (summing to `total`) so they sum exactly to `scale`,
/// with every present symbol keeping a frequency of at least 1.
///
/// Returns the present symbols in sorted order.
pub fn normalize_frequencies(
    freqs: &[u32; 256],
    total: usize,
    scale: u32,
    scaled: &mut [u32; 256],
) -> Result<Vec<u8>> {
    debug_assert!(total > 0);
    debug_assert!(scale >= 256 && scale <= 1 << 16);

    let mut alphabet = Vec::with_capacity(256);
    let mut sum = 0u64;
    let mut largest = 0usize;

    for s in 0..256usize {
        scaled[s] = 0;

        if freqs[s] == 0 {
            continue;
        }

        let sf = ((u64::from(freqs[s]) * u64::from(scale)) / total as u64).max(1) as u32;

        scaled[s] = sf;
        sum += u64::from(sf);

        if freqs[s] > freqs[largest] || scaled[largest] == 0 {
            largest = s;
        }

        alphabet.push(s as u8);
    }

    // Attribute the rounding drift to the most frequent symbol. When the drift is negative and
    // bigger than that symbol can absorb, walk the rest of the alphabet.
    let mut drift = i64::from(scale) - sum as i64;

    if drift > 0 {
        scaled[largest] += drift as u32;
    }
    else {
        while drift < 0 {
            let take = (-drift as u32).min(scaled[largest] - 1);

            if take > 0 {
                scaled[largest] -= take;
                drift += i64::from(take);
            }

            if drift < 0 {
                let mut adjusted = false;
                for &s in alphabet.iter() {
                    if drift == 0 {
                        break;
                    }
                    if scaled[usize::from(s)] > 1 {
                        scaled[usize::from(s)] -= 1;
                        drift += 1;
                        adjusted = true;
                    }
                }
                if !adjusted {
                    // Cannot happen while scale >= alphabet size, but do not loop forever.
                    return decode_error("alphabet: cannot normalize frequencies");
                }
            }
        }
    }

    Ok(alphabet)
}

/// Writes the scaled frequencies of the (already encoded) alphabet.
///
/// Frequencies are stored minus one in a fixed width chosen per header and written as a 5-bit
/// field.
pub fn encode_frequencies<W: WriteBytes>(
    bw: &mut BitWriterLtr<W>,
    scaled: &[u32; 256],
    alphabet: &[u8],
) -> Result<()> {
    let max_freq = alphabet.iter().map(|&s| scaled[usize::from(s)]).max().unwrap_or(1);

    let freq_bits = if max_freq <= 1 { 0 } else { ilog2_u32(max_freq - 1) + 1 };

    bw.write_bits(u64::from(freq_bits), 5)?;

    if freq_bits > 0 {
        for &s in alphabet {
            bw.write_bits(u64::from(scaled[usize::from(s)] - 1), freq_bits)?;
        }
    }

    Ok(())
}

/// Reads the scaled frequencies of the (already decoded) alphabet and validates that they sum
/// to `scale`.
pub fn decode_frequencies(
    br: &mut BitReaderLtr<'_>,
    scale: u32,
    alphabet: &[u8],
    scaled: &mut [u32; 256],
) -> Result<()> {
    let freq_bits = br.read_bits(5)? as u32;

    if freq_bits > 17 {
        return decode_error("alphabet: frequency width out of range");
    }

    scaled.fill(0);

    let mut sum = 0u64;

    for &s in alphabet {
        let f = if freq_bits == 0 { 1 } else { br.read_bits(freq_bits)? as u32 + 1 };

        scaled[usize::from(s)] = f;
        sum += u64::from(f);
    }

    if sum != u64::from(scale) {
        return decode_error("alphabet: frequencies do not sum to the scale");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(symbols: &[u8]) -> (usize, [u8; 256], u64) {
        let mut sink = Vec::new();
        let mut bw = BitWriterLtr::new(&mut sink);

        encode_alphabet(&mut bw, symbols).unwrap();
        let bits = bw.written();
        bw.close().unwrap();

        let mut br = BitReaderLtr::new(&sink);
        let mut decoded = [0u8; 256];
        let count = decode_alphabet(&mut br, &mut decoded).unwrap();

        (count, decoded, bits)
    }

    #[test]
    fn verify_full_alphabets() {
        let all: Vec<u8> = (0..=255).collect();
        let (count, decoded, bits) = round_trip(&all);
        assert_eq!(count, 256);
        assert_eq!(&decoded[..256], &all[..]);
        assert_eq!(bits, 2);

        let half: Vec<u8> = (0..=127).collect();
        let (count, decoded, bits) = round_trip(&half);
        assert_eq!(count, 128);
        assert_eq!(&decoded[..128], &half[..]);
        assert_eq!(bits, 2);
    }

    #[test]
    fn verify_delta_mode() {
        // Sparse alphabet -> present list.
        let sparse = [3u8, 7, 9, 200];
        let (count, decoded, bits) = round_trip(&sparse);
        assert_eq!(count, 4);
        assert_eq!(&decoded[..4], &sparse[..]);
        // Far below the 258-bit bitmask encoding.
        assert!(bits < 64);

        // Dense alphabet -> absent list.
        let dense: Vec<u8> = (0..=255).filter(|&s| s != 17 && s != 101).collect();
        let (count, decoded, _) = round_trip(&dense);
        assert_eq!(count, 254);
        assert_eq!(&decoded[..254], &dense[..]);
    }

    #[test]
    fn verify_bitmask_mode() {
        let mid: Vec<u8> = (0..=255).filter(|&s| s % 3 == 0).collect();
        let (count, decoded, bits) = round_trip(&mid);
        assert_eq!(count, mid.len());
        assert_eq!(&decoded[..count], &mid[..]);
        assert_eq!(bits, 2 + 256);
    }

    #[test]
    fn verify_frequency_round_trip() {
        let mut freqs = [0u32; 256];
        for i in 0..256usize {
            freqs[i] = i as u32 + 1;
        }
        let total: usize = freqs.iter().map(|&f| f as usize).sum();

        let mut scaled = [0u32; 256];
        let alphabet = normalize_frequencies(&freqs, total, 1 << 13, &mut scaled).unwrap();

        assert_eq!(alphabet.len(), 256);
        assert_eq!(scaled.iter().map(|&f| u64::from(f)).sum::<u64>(), 1 << 13);
        assert!(scaled.iter().all(|&f| f >= 1));

        let mut sink = Vec::new();
        let mut bw = BitWriterLtr::new(&mut sink);
        encode_alphabet(&mut bw, &alphabet).unwrap();
        encode_frequencies(&mut bw, &scaled, &alphabet).unwrap();
        bw.close().unwrap();

        let mut br = BitReaderLtr::new(&sink);
        let mut decoded_alpha = [0u8; 256];
        let count = decode_alphabet(&mut br, &mut decoded_alpha).unwrap();
        let mut decoded = [0u32; 256];
        decode_frequencies(&mut br, 1 << 13, &decoded_alpha[..count], &mut decoded).unwrap();

        assert_eq!(decoded, scaled);
    }
}
