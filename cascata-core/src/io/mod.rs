// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements the bit-level reader and writer every entropy coder is built on,
//! and the byte sink abstraction underneath the writer.

mod bit;

pub use bit::{BitReaderLtr, BitWriterLtr};

use crate::errors::Result;

/// `WriteBytes` is the byte sink a [`BitWriterLtr`] dispatches whole bytes to.
///
/// The bit writer borrows the sink for the duration of a block; the caller retains ultimate
/// ownership.
pub trait WriteBytes {
    /// Writes a single byte to the sink.
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Writes the entire buffer to the sink.
    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        for &byte in buf {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

impl WriteBytes for Vec<u8> {
    #[inline(always)]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.push(byte);
        Ok(())
    }

    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

impl<W: WriteBytes + ?Sized> WriteBytes for &mut W {
    #[inline(always)]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_buf(buf)
    }
}
