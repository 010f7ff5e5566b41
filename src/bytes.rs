// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/bytes.rs - Byte-level helpers shared by the card decoders.
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

use crate::error::DecodeError;

/// Returns the byte at `offset`, or `None` if the slice is too short.
pub fn byte_at(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

/// Reads an unsigned little-endian 32-bit integer at `offset`.
pub fn le_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Extracts `width` bits of `value` starting at bit `shift` (LSB = bit 0).
pub fn bit_field(value: u8, shift: u32, width: u32) -> u8 {
    if shift >= 8 || width == 0 {
        return 0;
    }
    let mask = if width >= 8 { 0xFF } else { (1u8 << width) - 1 };
    (value >> shift) & mask
}

/// Formats bytes as contiguous uppercase hex.
pub fn to_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Splits a digit string into space-separated blocks of `size` characters.
///
/// The final block may be shorter than `size`.
pub fn group_digits(digits: &str, size: usize) -> String {
    if size == 0 {
        return digits.to_string();
    }
    digits
        .chars()
        .collect::<Vec<_>>()
        .chunks(size)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a hex string into bytes. Whitespace, `:` and `-` separators and an
/// optional `0x` prefix are ignored.
pub fn from_hex(s: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(&digits).map_err(|source| DecodeError::InvalidHex {
        input: s.to_string(),
        source,
    })
}
