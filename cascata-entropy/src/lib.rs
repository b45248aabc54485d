// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Entropy coders for Project Cascata.
//!
//! Every coder operates on a borrowed [`cascata_core::io::BitWriterLtr`] or
//! [`cascata_core::io::BitReaderLtr`] and implements the
//! [`cascata_core::entropy::EntropyEncoder`]/[`cascata_core::entropy::EntropyDecoder`] traits.
//! The chunked coders (Huffman, Range, ANS) transmit per-chunk statistics through the shared
//! [`alphabet`] subroutine; the [`binary`] coder is generic over the
//! [`cascata_core::entropy::Predictor`] capability with the [`fpaq`], [`cm`], and [`tpaq`]
//! models provided.

pub mod alphabet;
pub mod ans;
pub mod binary;
pub mod cm;
pub mod expgolomb;
pub mod fpaq;
pub mod huffman;
pub mod null;
pub mod range;
pub mod tpaq;

pub use ans::{AnsDecoder, AnsEncoder};
pub use binary::{BinaryEntropyDecoder, BinaryEntropyEncoder};
pub use cm::CmPredictor;
pub use expgolomb::{ExpGolombDecoder, ExpGolombEncoder};
pub use fpaq::FpaqPredictor;
pub use huffman::{HuffmanDecoder, HuffmanEncoder};
pub use null::{NullDecoder, NullEncoder};
pub use range::{RangeDecoder, RangeEncoder};
pub use tpaq::TpaqPredictor;
