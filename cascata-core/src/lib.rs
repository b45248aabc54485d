// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Shared structs, traits, and features for Project Cascata.
//!
//! This crate provides the plumbing every other Cascata crate is built on: the MSB-first
//! bitstream reader and writer, the common error type, the [`transform::ByteTransform`] and
//! [`entropy::EntropyEncoder`]/[`entropy::EntropyDecoder`] traits, the skip-capable
//! [`transform::TransformSequence`], and the validated [`params::CodecParams`] parameter set.
//!
//! Codec implementations live in `cascata-entropy` and `cascata-transform`; the `cascata`
//! facade crate combines them into a block pipeline.

pub mod entropy;
pub mod errors;
pub mod io;
pub mod params;
pub mod transform;
pub mod util;
