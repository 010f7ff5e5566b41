// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  read_card.rs - Ticket decoder demo for captured card reads.
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

use clap::Parser;
use tracing_subscriber::EnvFilter;

use telematica::dump::CardDump;
use telematica::ticket::TicketInfo;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The CSV card dump to read.
    file: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let dump = match CardDump::from_filename(&args.file) {
        Ok(dump) => dump,
        Err(error) => {
            eprintln!("Error reading dump {:?}: {}", &args.file, error);
            return;
        }
    };

    let ticket = TicketInfo::decode_now(&dump.read);

    match serde_json::to_string_pretty(&ticket) {
        Ok(json) => println!("{}", json),
        Err(error) => eprintln!("Error serializing ticket: {}", error),
    }
}
