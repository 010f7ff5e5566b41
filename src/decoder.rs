// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/decoder.rs - Decoder for telematics service response bodies.
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
 * # `decoder` Module
 *
 * Turns a raw response body into a [Payload]. Bodies may or may not be
 * gzip-compressed, and the decompressed text may be JSON, tuple text (see
 * [crate::parser]), or one of a handful of "no data" sentinels.
 *
 * [Payload::from_bytes] keeps the distinction between empty and malformed
 * bodies; [decode_records] is the lenient entry point that never fails.
 *
 * ## Usage Example
 *
 * ```
 * use telematica::decoder::{decode_records, Payload};
 *
 * let payload = Payload::from_bytes(b"null").unwrap();
 * assert_eq!(payload, Payload::Empty);
 *
 * let records = decode_records(br#"(1, "a", None)"#);
 * assert_eq!(records.len(), 1);
 * ```
 */

use std::io::prelude::*;

use flate2::read::MultiGzDecoder;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::parser::{Row, parse_tuples};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Bodies that mean "no data" rather than "bad data".
const EMPTY_SENTINELS: [&str; 3] = ["null", "[]", "()"];

fn decompress(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut buffer = Vec::new();
    decoder
        .read_to_end(&mut buffer)
        .map_err(DecodeError::Decompress)?;
    Ok(buffer)
}

/// Returns the body as text, gunzipping it first if it carries the gzip magic.
/// Every member of a multi-member gzip stream is read.
///
/// A body that claims to be gzip but fails to decompress is read as plain
/// UTF-8 instead.
pub fn body_text(data: &[u8]) -> String {
    if data.starts_with(&GZIP_MAGIC) {
        match decompress(data) {
            Ok(plain) => return String::from_utf8_lossy(&plain).into_owned(),
            Err(error) => warn!(%error, "gzip body failed to decompress, reading as text"),
        }
    }
    String::from_utf8_lossy(data).into_owned()
}

/// The logical content of one response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A legitimate "no data" response.
    Empty,
    /// A JSON body, exactly as parsed.
    Json(Value),
    /// Rows recovered from tuple text.
    Rows(Vec<Row>),
}

impl Payload {
    /// Decodes a raw, possibly compressed, response body.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        Self::from_text(&body_text(data))
    }

    /// Decodes already-decompressed response text.
    ///
    /// # Returns
    ///
    /// [Payload::Empty] for blank or sentinel bodies, [Payload::Json] when the
    /// text parses as JSON, [Payload::Rows] when it holds at least one tuple,
    /// and [DecodeError::Unrecognized] otherwise.
    pub fn from_text(text: &str) -> Result<Self, DecodeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || EMPTY_SENTINELS.contains(&trimmed) {
            return Ok(Self::Empty);
        }

        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => return Ok(Self::Json(value)),
                Err(error) => debug!(%error, "body looked like JSON, trying tuple text"),
            }
        }

        let rows = parse_tuples(text);
        if rows.is_empty() {
            return Err(DecodeError::Unrecognized);
        }
        Ok(Self::Rows(rows))
    }

    /// Flattens the payload into the records the interpreter consumes.
    ///
    /// A JSON array yields one record per element, a non-empty JSON object
    /// yields a single named record, and tuple rows map one-to-one.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Empty => Vec::new(),
            Self::Rows(rows) => rows.into_iter().map(Record::Row).collect(),
            Self::Json(Value::Array(items)) => items.into_iter().map(Record::from_json).collect(),
            Self::Json(Value::Object(map)) if map.is_empty() => Vec::new(),
            Self::Json(value) => vec![Record::from_json(value)],
        }
    }
}

/// One normalized record: either a positional row or a named JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Row(Row),
    Object(Map<String, Value>),
}

impl Record {
    fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(map),
            Value::Array(items) => Self::Row(Row::new(items.iter().map(json_field).collect())),
            scalar => Self::Row(Row::new(vec![json_field(&scalar)])),
        }
    }

    /// Reads a field by position from a row, or by name from an object.
    ///
    /// Empty strings count as absent.
    pub fn field(&self, index: usize, name: &str) -> Option<String> {
        let value = match self {
            Self::Row(row) => row.get(index).map(str::to_string),
            Self::Object(map) => map.get(name).map(json_field),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Renders a JSON value as a row field. `null` becomes an empty string, like
/// `None` in tuple text.
fn json_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decodes a response body into records, collapsing every failure to an empty
/// list.
pub fn decode_records(data: &[u8]) -> Vec<Record> {
    match Payload::from_bytes(data) {
        Ok(payload) => payload.into_records(),
        Err(error) => {
            warn!(%error, "discarding undecodable response body");
            Vec::new()
        }
    }
}
