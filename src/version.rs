// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/version.rs - Decoder for DESFire GetVersion responses.
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

/*!
 * # `version` Module
 *
 * Interprets the 28-byte block returned by the DESFire GetVersion command.
 * Readers often return less, so each field is decoded only if the bytes it
 * needs are present:
 *
 * | Bytes | Contents                                                   | Needs |
 * |-------|------------------------------------------------------------|-------|
 * | 0-6   | hardware vendor, type, subtype, major, minor, storage, protocol | 7 |
 * | 7-13  | software vendor, type, subtype, major, minor, storage, protocol | 14 |
 * | 14-20 | UID                                                        | 21    |
 * | 21-25 | batch number                                               | 26    |
 * | 26-27 | production week, production year                           | 28    |
 */

use serde::Serialize;

use crate::bytes::{bit_field, to_hex};

pub const UNKNOWN: &str = "Unknown";

const HW_LEN: usize = 7;
const SW_LEN: usize = 14;
const UID_LEN: usize = 21;
const BATCH_LEN: usize = 26;
const FULL_LEN: usize = 28;

const VENDOR_NXP: u8 = 0x04;

/// Best-effort description of a card's hardware.
///
/// Labels that cannot be decoded read [UNKNOWN]; optional fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardVersionInfo {
    pub card_type: String,
    pub manufacturer: String,
    pub capacity: String,
    pub production_date: Option<String>,
    pub hardware_version: Option<String>,
    pub software_version: Option<String>,
    pub uid: Option<String>,
    pub batch: Option<String>,
}

impl Default for CardVersionInfo {
    fn default() -> Self {
        Self {
            card_type: UNKNOWN.to_string(),
            manufacturer: UNKNOWN.to_string(),
            capacity: UNKNOWN.to_string(),
            production_date: None,
            hardware_version: None,
            software_version: None,
            uid: None,
            batch: None,
        }
    }
}

impl CardVersionInfo {
    /// Decodes a GetVersion response of any length. Never fails.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut info = Self::default();

        if data.len() >= HW_LEN {
            info.manufacturer = manufacturer(data[0]).to_string();
            info.card_type = card_type(data[1], data[2], data[3], data[4]);
            info.capacity = capacity(data[5]);
            info.hardware_version = Some(format!("{}.{}", data[3], data[4]));
        }

        if data.len() >= SW_LEN {
            info.software_version = Some(format!("{}.{}", data[10], data[11]));
        }

        if data.len() >= UID_LEN {
            info.uid = Some(to_hex(&data[14..UID_LEN]));
        }

        if data.len() >= BATCH_LEN {
            info.batch = Some(to_hex(&data[UID_LEN..BATCH_LEN]));
        }

        if data.len() >= FULL_LEN {
            info.production_date = production_date(data[26], data[27]);
        }

        info
    }
}

pub fn manufacturer(vendor: u8) -> &'static str {
    match vendor {
        VENDOR_NXP => "NXP Semiconductors",
        _ => UNKNOWN,
    }
}

fn family(hw_type: u8) -> Option<&'static str> {
    match hw_type {
        0x01 | 0x81 => Some("MIFARE DESFire"),
        0x08 => Some("MIFARE DESFire Light"),
        _ => None,
    }
}

/// Names the card from its hardware type and subtype. Subtypes 1-3 are the
/// EV1-EV3 generations; anything else is labelled with its version number.
pub fn card_type(hw_type: u8, subtype: u8, major: u8, minor: u8) -> String {
    let family = match family(hw_type) {
        Some(name) => name.to_string(),
        None => format!("{} (type {:#04x})", UNKNOWN, hw_type),
    };
    match subtype {
        1..=3 => format!("{} EV{}", family, subtype),
        _ => format!("{} ({}.{})", family, major, minor),
    }
}

/// Storage size in bytes: the upper seven bits are a power-of-two exponent.
pub fn capacity_bytes(storage: u8) -> Option<u64> {
    1u64.checked_shl(u32::from(bit_field(storage, 1, 7)))
}

pub fn capacity(storage: u8) -> String {
    match capacity_bytes(storage) {
        Some(size) if size >= 1024 => format!("{} KB", size / 1024),
        Some(size) => format!("{} bytes", size),
        None => UNKNOWN.to_string(),
    }
}

/// Formats the production week and two-digit year, or `None` if the week is
/// not a valid ISO week.
pub fn production_date(week: u8, year: u8) -> Option<String> {
    if !(1..=53).contains(&week) {
        return None;
    }
    let full_year = if year < 50 {
        2000 + u16::from(year)
    } else {
        1900 + u16::from(year)
    };
    Some(format!("Week {}, {}", week, full_year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_block() -> Vec<u8> {
        let mut data = vec![
            0x04, 0x01, 0x01, 0x01, 0x00, 0x1A, 0x05, // hardware
            0x04, 0x01, 0x01, 0x01, 0x04, 0x1A, 0x05, // software
            0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, // UID
            0xBA, 0x7C, 0x00, 0x00, 0x01, // batch
        ];
        data.extend_from_slice(&[10, 23]);
        data
    }

    #[test]
    fn test_full_block() {
        let info = CardVersionInfo::from_bytes(&full_block());
        assert_eq!(info.manufacturer, "NXP Semiconductors");
        assert_eq!(info.card_type, "MIFARE DESFire EV1");
        assert_eq!(info.capacity, "8 KB");
        assert_eq!(info.hardware_version.as_deref(), Some("1.0"));
        assert_eq!(info.software_version.as_deref(), Some("1.4"));
        assert_eq!(info.uid.as_deref(), Some("04112233445566"));
        assert_eq!(info.batch.as_deref(), Some("BA7C000001"));
        assert_eq!(info.production_date.as_deref(), Some("Week 10, 2023"));
    }

    #[test]
    fn test_truncated_blocks() {
        let block = full_block();

        let info = CardVersionInfo::from_bytes(&block[..26]);
        assert_eq!(info.batch.as_deref(), Some("BA7C000001"));
        assert_eq!(info.production_date, None);

        let info = CardVersionInfo::from_bytes(&block[..21]);
        assert!(info.uid.is_some());
        assert_eq!(info.batch, None);

        let info = CardVersionInfo::from_bytes(&block[..14]);
        assert!(info.software_version.is_some());
        assert_eq!(info.uid, None);

        let info = CardVersionInfo::from_bytes(&block[..7]);
        assert_eq!(info.manufacturer, "NXP Semiconductors");
        assert_eq!(info.software_version, None);

        let info = CardVersionInfo::from_bytes(&block[..6]);
        assert_eq!(info, CardVersionInfo::default());
        assert_eq!(CardVersionInfo::from_bytes(&[]), CardVersionInfo::default());
    }

    #[test]
    fn test_manufacturer() {
        assert_eq!(manufacturer(0x04), "NXP Semiconductors");
        assert_eq!(manufacturer(0x05), UNKNOWN);
    }

    #[test]
    fn test_card_type() {
        assert_eq!(card_type(0x01, 0x02, 0x12, 0x00), "MIFARE DESFire EV2");
        assert_eq!(card_type(0x01, 0x03, 0x30, 0x00), "MIFARE DESFire EV3");
        assert_eq!(card_type(0x01, 0x00, 0x00, 0x06), "MIFARE DESFire (0.6)");
        assert_eq!(card_type(0x42, 0x01, 0x00, 0x00), "Unknown (type 0x42) EV1");
    }

    #[test]
    fn test_capacity() {
        assert_eq!(capacity(0x08), "16 bytes");
        assert_eq!(capacity(0x0A), "32 bytes");
        assert_eq!(capacity(0x14), "1 KB");
        assert_eq!(capacity(0x18), "4 KB");
        assert_eq!(capacity(0x00), "1 bytes");
        assert_eq!(capacity_bytes(0xFF), None);
    }

    #[test]
    fn test_production_date() {
        assert_eq!(production_date(10, 23).as_deref(), Some("Week 10, 2023"));
        assert_eq!(production_date(53, 99).as_deref(), Some("Week 53, 1999"));
        assert_eq!(production_date(1, 49).as_deref(), Some("Week 1, 2049"));
        assert_eq!(production_date(0, 23), None);
        assert_eq!(production_date(54, 23), None);
    }

    #[test]
    fn test_production_date_suppressed_for_bad_week() {
        let mut block = full_block();
        block[26] = 0;
        assert_eq!(CardVersionInfo::from_bytes(&block).production_date, None);
    }
}
