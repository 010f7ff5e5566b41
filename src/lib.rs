// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - Decoders for transit telematics responses and ticket cards.
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
 * # `telematica` Crate
 *
 * A library for decoding the two undocumented data formats a transit app has
 * to deal with: responses from the bus telematics service, and the data files
 * of ATH.ENA contactless ticket cards.
 *
 * Telematics responses go through a three-stage pipeline:
 *
 * 1. [decoder]: Gunzips the body and sniffs whether it is JSON, tuple text, or
 *    an empty response.
 * 2. [parser]: Splits tuple text into rows of string fields.
 * 3. [interpreter]: Maps rows and JSON objects to typed entities.
 *
 * [client] wires the stages to a caller-supplied [client::Fetch]
 * implementation, one method per endpoint.
 *
 * Ticket cards are handled by [version] (the GetVersion block) and [ticket]
 * (the data files). [dump] loads captured card reads from CSV.
 *
 * Every decoder is pure: the same input always produces the same output, and
 * no decoder ever returns an error to the outermost caller. Failures are
 * logged with `tracing` and collapse to an empty list or a default value.
 *
 * ## Usage Example
 *
 * ```no_run
 * use telematica::client::{ClientConfig, TransitClient};
 * use telematica::error::DecodeError;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let config = ClientConfig::from_env().ok_or("TELEMATICA_BASE_URL is not set")?;
 *     let client = TransitClient::new(config, |url: &str| {
 *         std::fs::read(url.replace('/', "_")).map_err(DecodeError::from)
 *     });
 *
 *     for stop in client.nearest_stops(37.9755, 23.7348) {
 *         println!("{} {} km", stop.description, stop.distance.unwrap_or_default());
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

pub mod bytes;
pub mod client;
pub mod decoder;
pub mod dump;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod ticket;
pub mod version;
