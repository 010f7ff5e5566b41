// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  decode_response.rs - Decoder demo for saved telematics responses.
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

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use telematica::decoder::*;
use telematica::interpreter::*;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Raw,
    Stops,
    Lines,
    Routes,
    Points,
    Arrivals,
    Locations,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The response body to read, compressed or not.
    file: String,

    /// How to interpret the records.
    #[arg(short, long, value_enum, default_value = "raw")]
    kind: Kind,

    /// Route code to attach to bus locations.
    #[arg(long, default_value = "")]
    route: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let body = match std::fs::read(&args.file) {
        Ok(body) => body,
        Err(error) => {
            eprintln!("Error opening file {:?}: {:?}", &args.file, error);
            return;
        }
    };

    let payload = match Payload::from_bytes(&body) {
        Ok(payload) => payload,
        Err(error) => {
            eprintln!("Error decoding file {:?}: {}", &args.file, error);
            return;
        }
    };

    let records = payload.clone().into_records();
    let json = match args.kind {
        Kind::Raw => {
            println!("{:?}", payload);
            return;
        }
        Kind::Stops => serde_json::to_string_pretty(
            &records.iter().filter_map(Stop::from_record).collect::<Vec<_>>(),
        ),
        Kind::Lines => serde_json::to_string_pretty(
            &records.iter().filter_map(Line::from_record).collect::<Vec<_>>(),
        ),
        Kind::Routes => serde_json::to_string_pretty(
            &records.iter().filter_map(Route::from_record).collect::<Vec<_>>(),
        ),
        Kind::Points => serde_json::to_string_pretty(&route_points(&records)),
        Kind::Arrivals => serde_json::to_string_pretty(
            &records
                .iter()
                .filter_map(StopArrival::from_record)
                .collect::<Vec<_>>(),
        ),
        Kind::Locations => serde_json::to_string_pretty(
            &records
                .iter()
                .filter_map(|r| BusLocation::from_record(r, &args.route))
                .collect::<Vec<_>>(),
        ),
    };

    match json {
        Ok(json) => println!("{}", json),
        Err(error) => eprintln!("Error serializing records: {}", error),
    }
}
