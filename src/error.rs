// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Error types for the telematics and ticket card decoders.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use thiserror::Error;

/// Every reason a decode step can fail before its result is collapsed to a
/// default at the public boundary.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("gzip decompression failed: {0}")]
    Decompress(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload is neither JSON nor tuple text")]
    Unrecognized,

    #[error("fetching {url:?} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("card file {file} is missing")]
    MissingFile { file: u8 },

    #[error("card file {file} is too short: need {needed} bytes, got {actual}")]
    ShortFile {
        file: u8,
        needed: usize,
        actual: usize,
    },

    #[error("raw timestamp {raw:#010x} is outside the plausible window")]
    ImplausibleTimestamp { raw: u32 },

    #[error("invalid hex string {input:?}: {source}")]
    InvalidHex {
        input: String,
        source: hex::FromHexError,
    },

    #[error("malformed dump row {row}: {reason}")]
    MalformedDump { row: u64, reason: String },

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),
}
