// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/dump.rs - Loader for captured card reads stored as CSV.
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
 * # `dump` Module
 *
 * Reads a [CardRead] back from a CSV capture, so that dumps taken with a
 * phone can be replayed through [crate::ticket::TicketInfo::decode].
 *
 * Each row is `kind,id,value`:
 *
 * ```text
 * # captured 2026-10-19
 * version,,0401010100 1A05 0401010104 1A05 04112233445566 BA7C000001 0A17
 * uid,,04112233445566
 * aid,,0x000001
 * auth,,false
 * file,2,00000000000000000010000012345678
 * file,16,01320000...
 * ```
 *
 * Byte values are hex; spaces and colons inside them are ignored.
 */

use std::fs::File;
use std::io::{BufReader, Read};

use crate::bytes::from_hex;
use crate::error::DecodeError;
use crate::ticket::CardRead;

fn malformed(row: u64, reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedDump {
        row,
        reason: reason.into(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// A card read loaded from a CSV capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDump {
    pub read: CardRead,
}

impl CardDump {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut read = CardRead::default();

        for result in reader.records() {
            let record = result?;
            let row = record.position().map_or(0, |p| p.line());
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < 3 {
                return Err(malformed(row, "expected kind,id,value"));
            }

            let (kind, id, value) = (&record[0], &record[1], &record[2]);
            match kind {
                "version" => read.version = from_hex(value)?,
                "uid" => read.uid = from_hex(value)?,
                "aid" => read.application_id = value.to_string(),
                "auth" => {
                    read.auth_required =
                        parse_bool(value).ok_or_else(|| malformed(row, "auth is not a boolean"))?;
                }
                "file" => {
                    let file = id
                        .parse::<u8>()
                        .map_err(|_| malformed(row, format!("bad file number {:?}", id)))?;
                    read.files.insert(file, from_hex(value)?);
                }
                other => return Err(malformed(row, format!("unknown kind {:?}", other))),
            }
        }

        Ok(Self { read })
    }

    pub fn from_filename(filename: &str) -> Result<Self, DecodeError> {
        let file = File::open(filename)?;
        Self::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader() {
        let csv = "\
# sample
version,,04 01 01 01 00 1A 05
uid,,04:11:22:33:44:55:66
aid,,0x000001
auth,,false
file,12,0F000000
file,16,FF00
";
        let dump = CardDump::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dump.read.version.len(), 7);
        assert_eq!(dump.read.uid, vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(dump.read.application_id, "0x000001");
        assert!(!dump.read.auth_required);
        assert_eq!(dump.read.files[&12], vec![0x0F, 0, 0, 0]);
        assert_eq!(dump.read.files[&16], vec![0xFF, 0x00]);
    }

    #[test]
    fn test_malformed_rows() {
        assert!(matches!(
            CardDump::from_reader("colour,,red\n".as_bytes()),
            Err(DecodeError::MalformedDump { row: 1, .. })
        ));
        assert!(matches!(
            CardDump::from_reader("file,300,00\n".as_bytes()),
            Err(DecodeError::MalformedDump { .. })
        ));
        assert!(matches!(
            CardDump::from_reader("uid,,0g\n".as_bytes()),
            Err(DecodeError::InvalidHex { .. })
        ));
        assert!(matches!(
            CardDump::from_reader("auth\n".as_bytes()),
            Err(DecodeError::MalformedDump { .. })
        ));
    }
}
