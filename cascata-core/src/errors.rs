// Cascata
// Copyright (c) 2023-2026 The Project Cascata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Cascata.
#[derive(Debug)]
pub enum Error {
    /// The destination buffer cannot hold the output the operation is contracted to produce.
    BufferTooSmall {
        /// The minimum length the destination buffer must have.
        needed: usize,
        /// The length of the buffer that was provided.
        len: usize,
    },
    /// The encoded data is malformed: a length, distance, escape, or code was out of range.
    InvalidData(&'static str),
    /// A read was attempted past the end of the bitstream, or a write after it was closed.
    EndOfBitstream,
    /// A codec parameter was outside its legal range at construction time.
    InvalidParameter(&'static str),
    /// An identifier or feature is not supported by this build.
    Unsupported(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::BufferTooSmall { needed, len } => {
                write!(f, "destination buffer too small: needed {}, got {}", needed, len)
            }
            Error::InvalidData(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::EndOfBitstream => {
                write!(f, "unexpected end of bitstream")
            }
            Error::InvalidParameter(msg) => {
                write!(f, "invalid parameter: {}", msg)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a malformed-stream error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidData(desc))
}

/// Convenience function to create an end-of-bitstream error.
pub fn end_of_bitstream_error<T>() -> Result<T> {
    Err(Error::EndOfBitstream)
}

/// Convenience function to create an invalid-parameter error.
pub fn param_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidParameter(desc))
}

/// Convenience function to create an unsupported-feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a buffer-too-small error.
pub fn buffer_too_small_error<T>(needed: usize, len: usize) -> Result<T> {
    Err(Error::BufferTooSmall { needed, len })
}
