// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/interpreter.rs - Interpreter for decoded telematics records.
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
 * # `interpreter` Module
 *
 * This module maps decoded [Record]s into typed transit entities.
 *
 * Tuple rows carry no field names, so each entity has a fixed positional
 * layout; JSON objects use the service's field names. A record without the
 * entity's key field is not an entity, and `from_record` returns `None` for
 * it. Any other missing field falls back to a per-field default (`""` or
 * `"0"`), and English descriptions fall back to the native description. Stop
 * coordinates default to `""` so that [nearest_stops] can tell a stop at `0,0`
 * from one without a position.
 *
 * | Entity        | Positional layout                                  | Key          |
 * |---------------|----------------------------------------------------|--------------|
 * | [Stop]        | code, id, descr, descr_eng, street, lat, lng       | code         |
 * | [Line]        | code, id, descr, descr_eng                         | code         |
 * | [Route]       | code, line_code, descr, descr_eng, type, distance  | code         |
 * | [RoutePoint]  | x, y                                               | x or y       |
 * | [BusLocation] | vehicle, timestamp, lat, lng                       | vehicle      |
 * | [StopArrival] | minutes, route_code, vehicle_code                  | route_code   |
 *
 * ## Usage Example
 *
 * ```
 * use telematica::decoder::decode_records;
 * use telematica::interpreter::{Stop, nearest_stops};
 *
 * let records = decode_records(br#"("010001", 1, "A", None, None, "37.98", "23.72")"#);
 * let stops: Vec<Stop> = records.iter().filter_map(Stop::from_record).collect();
 * let nearest = nearest_stops(&stops, 37.98, 23.72, 30);
 * assert_eq!(nearest[0].distance.as_deref(), Some("0.00"));
 * ```
 */

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::debug;

use crate::decoder::Record;

/// Stop heading is not provided by the service.
pub const HEADING_PLACEHOLDER: &str = "-1";

/// Mean Earth radius used by [haversine_km].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance given to stops whose coordinates parse but are not on the globe.
pub const SENTINEL_DISTANCE_KM: f64 = 99_999.0;

fn text(record: &Record, index: usize, name: &str) -> String {
    record.field(index, name).unwrap_or_default()
}

fn number(record: &Record, index: usize, name: &str) -> String {
    record.field(index, name).unwrap_or_else(|| "0".to_string())
}

fn english(record: &Record, index: usize, name: &str, native: &str) -> String {
    record
        .field(index, name)
        .unwrap_or_else(|| native.to_string())
}

/// A bus stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub code: String,
    pub id: String,
    pub description: String,
    pub description_en: String,
    pub street: Option<String>,
    pub heading: String,
    /// Latitude in decimal degrees.
    pub lat: String,
    /// Longitude in decimal degrees.
    pub lng: String,
    /// Kilometres from the reference point, only set by [nearest_stops].
    pub distance: Option<String>,
}

impl Stop {
    /// Returns `None` if the record has no stop code.
    pub fn from_record(record: &Record) -> Option<Self> {
        let code = record.field(0, "StopCode")?;
        let description = text(record, 2, "StopDescr");
        Some(Self {
            code,
            id: number(record, 1, "StopID"),
            description_en: english(record, 3, "StopDescrEng", &description),
            description,
            street: record.field(4, "StopStreet"),
            heading: HEADING_PLACEHOLDER.to_string(),
            lat: text(record, 5, "StopLat"),
            lng: text(record, 6, "StopLng"),
            distance: None,
        })
    }
}

/// A bus line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub code: String,
    /// The human-facing line number, e.g. "040".
    pub id: String,
    pub description: String,
    pub description_en: String,
}

impl Line {
    /// Returns `None` if the record has no line code.
    pub fn from_record(record: &Record) -> Option<Self> {
        let code = record.field(0, "LineCode")?;
        let description = text(record, 2, "LineDescr");
        Some(Self {
            code,
            id: text(record, 1, "LineID"),
            description_en: english(record, 3, "LineDescrEng", &description),
            description,
        })
    }
}

/// One direction of a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub code: String,
    pub line_code: String,
    pub description: String,
    pub description_en: String,
    pub route_type: String,
    pub distance: String,
}

impl Route {
    /// Returns `None` if the record has no route code.
    pub fn from_record(record: &Record) -> Option<Self> {
        let code = record.field(0, "RouteCode")?;
        let description = text(record, 2, "RouteDescr");
        Some(Self {
            code,
            line_code: text(record, 1, "LineCode"),
            description_en: english(record, 3, "RouteDescrEng", &description),
            description,
            route_type: number(record, 4, "RouteType"),
            distance: number(record, 5, "RouteDistance"),
        })
    }
}

/// A vertex of a route's polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePoint {
    /// Longitude.
    pub x: String,
    /// Latitude.
    pub y: String,
    /// Zero-based position in the response.
    pub order: usize,
}

impl RoutePoint {
    /// Returns `None` if the record carries neither coordinate.
    pub fn from_record(record: &Record, order: usize) -> Option<Self> {
        let x = record.field(0, "routed_x");
        let y = record.field(1, "routed_y");
        if x.is_none() && y.is_none() {
            return None;
        }
        Some(Self {
            x: x.unwrap_or_else(|| "0".to_string()),
            y: y.unwrap_or_else(|| "0".to_string()),
            order,
        })
    }
}

/// Maps a route detail response to polyline vertices, numbered by position
/// among the records that carry coordinates.
pub fn route_points(records: &[Record]) -> Vec<RoutePoint> {
    records
        .iter()
        .filter_map(|record| RoutePoint::from_record(record, 0))
        .enumerate()
        .map(|(order, point)| RoutePoint { order, ..point })
        .collect()
}

/// The last reported position of a vehicle on a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusLocation {
    pub vehicle: String,
    pub timestamp: String,
    pub lat: String,
    pub lng: String,
    /// The route that was queried; the service does not echo it back.
    pub route_code: String,
}

impl BusLocation {
    /// Returns `None` if the record has no vehicle number.
    pub fn from_record(record: &Record, route_code: &str) -> Option<Self> {
        let vehicle = record.field(0, "VEH_NO")?;
        Some(Self {
            vehicle,
            timestamp: text(record, 1, "CS_DATE"),
            lat: number(record, 2, "CS_LAT"),
            lng: number(record, 3, "CS_LNG"),
            route_code: route_code.to_string(),
        })
    }
}

/// A predicted arrival of a vehicle at a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopArrival {
    pub route_code: String,
    pub vehicle_code: String,
    /// Minutes until arrival.
    pub minutes: String,
}

impl StopArrival {
    /// Objects use `route_code`, `veh_code` and `btime2`; rows are
    /// `[btime2, route_code, veh_code]`. Returns `None` if the record has no
    /// route code.
    pub fn from_record(record: &Record) -> Option<Self> {
        let route_code = record.field(1, "route_code")?;
        Some(Self {
            route_code,
            vehicle_code: text(record, 2, "veh_code"),
            minutes: number(record, 0, "btime2"),
        })
    }
}

/// A route and line synthesized from live arrivals at a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteAtStop {
    pub route: Route,
    pub line: Line,
}

impl RouteAtStop {
    /// Builds placeholder metadata for a route code seen at a stop.
    ///
    /// The display id is the last two characters of the route code. This is a
    /// best-effort label, not the service's real line number.
    pub fn from_route_code(route_code: &str) -> Self {
        let chars: Vec<char> = route_code.chars().collect();
        let short_id: String = chars[chars.len().saturating_sub(2)..].iter().collect();
        let description = format!("Route {route_code}");
        Self {
            route: Route {
                code: route_code.to_string(),
                line_code: route_code.to_string(),
                description: description.clone(),
                description_en: description,
                route_type: "0".to_string(),
                distance: "0".to_string(),
            },
            line: Line {
                code: route_code.to_string(),
                id: short_id.clone(),
                description: format!("Line {short_id}"),
                description_en: format!("Line {short_id}"),
            },
        }
    }
}

/// Collects the distinct route codes in a stop's arrivals, in first-seen
/// order, and synthesizes route/line records for them.
pub fn routes_at_stop(arrivals: &[StopArrival]) -> Vec<RouteAtStop> {
    let mut seen = HashSet::new();
    arrivals
        .iter()
        .map(|a| a.route_code.as_str())
        .filter(|code| !code.is_empty() && seen.insert(*code))
        .map(RouteAtStop::from_route_code)
        .collect()
}

/// Great-circle distance in kilometres between two points in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

fn parse_coordinate(s: &str) -> Option<f64> {
    let s = s.trim().replace(',', ".");
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()?
        .to_f64()
}

/// Returns up to `limit` stops sorted by distance from `(lat, lng)`, with
/// [Stop::distance] filled in.
///
/// Stops whose coordinates are missing or not numeric are left out. Stops
/// whose coordinates are numeric but off the globe are kept at
/// [SENTINEL_DISTANCE_KM] so they sort last.
pub fn nearest_stops(stops: &[Stop], lat: f64, lng: f64, limit: usize) -> Vec<Stop> {
    let mut measured: Vec<(f64, Stop)> = stops
        .iter()
        .filter_map(|stop| {
            let (Some(stop_lat), Some(stop_lng)) =
                (parse_coordinate(&stop.lat), parse_coordinate(&stop.lng))
            else {
                debug!(code = %stop.code, "skipping stop without usable coordinates");
                return None;
            };
            let distance = if stop_lat.abs() > 90.0 || stop_lng.abs() > 180.0 {
                SENTINEL_DISTANCE_KM
            } else {
                haversine_km(lat, lng, stop_lat, stop_lng)
            };
            Some((distance, stop.clone()))
        })
        .collect();

    measured.sort_by(|a, b| a.0.total_cmp(&b.0));
    measured.truncate(limit);

    measured
        .into_iter()
        .map(|(distance, mut stop)| {
            stop.distance = Some(format!("{:.2}", distance));
            stop
        })
        .collect()
}
