// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Cascata
//!
//! Cascata is a 100% pure Rust block-structured lossless compression engine. A block flows
//! through a configurable sequence of up to eight reversible byte transforms, each free to
//! skip when it cannot improve the data, and then through an entropy coder into a bitstream.
//! Decompression replays the stages in reverse, consulting the skip mask recorded during
//! compression.
//!
//! The workspace splits along those seams:
//!
//! * [`cascata_core`]: bitstream, error type, traits, transform sequence, parameters;
//! * [`cascata_entropy`]: Huffman, Range, ANS, Exp-Golomb, and binary arithmetic coding with
//!   the FPAQ, CM, and TPAQ predictors;
//! * [`cascata_transform`]: LZ, LZP, ROLZ, run-length, rank, delta, and x86 transforms;
//! * this crate: wire identifiers, factories, and the [`BlockCodec`] pipeline.
//!
//! # Usage
//!
//! 1. Build a [`cascata_core::params::CodecParams`], which validates every knob up front.
//! 2. Pick a pipeline (a list of [`TransformId`]) and an [`EntropyCodecId`], or unpack them
//!    from a container's 48-bit and 5-bit identifier fields.
//! 3. Drive [`BlockCodec::encode_block`] / [`BlockCodec::decode_block`] per block, persisting
//!    each block's [`BlockSummary`] fields in the container.
//!
//! Instances are single-threaded; spawn one `BlockCodec` per worker for parallelism.

pub mod block;
pub mod factory;
pub mod id;

pub use block::{BlockCodec, BlockSummary};
pub use id::{pack_transform_ids, unpack_transform_ids, EntropyCodecId, TransformId};
