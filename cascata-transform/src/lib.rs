// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Reversible byte transforms for Project Cascata.
//!
//! Every transform implements [`cascata_core::transform::ByteTransform`]: forward may refuse a
//! block (skip) when it cannot improve it, inverse reconstructs the exact input or fails. The
//! ROLZ transforms entropy-code their streams with `cascata-entropy`.

pub mod brt;
pub mod fsd;
pub mod lz;
pub mod lzp;
pub mod null;
pub mod pack;
pub mod rlt;
pub mod rolz;
pub mod srt;
pub mod x86;
pub mod zrlt;

pub use brt::BrtCodec;
pub use fsd::FsdCodec;
pub use lz::LzCodec;
pub use lzp::LzpCodec;
pub use null::NullTransform;
pub use rlt::RltCodec;
pub use rolz::{RolzCodec, RolzXCodec};
pub use srt::SrtCodec;
pub use x86::X86Codec;
pub use zrlt::ZrltCodec;
