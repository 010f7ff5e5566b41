// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/client.rs - Endpoint catalogue and fetch-decode-map client.
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
 * # `client` Module
 *
 * Ties the pipeline together for each telematics endpoint. The crate does no
 * network I/O itself: the caller supplies a [Fetch] implementation that
 * returns a complete response body, and [TransitClient] decodes and maps it.
 *
 * Every [TransitClient] method returns a plain `Vec`. Fetch and decode
 * failures are logged and reported as an empty result.
 */

use tracing::{debug, warn};

use crate::decoder::{Payload, Record};
use crate::error::DecodeError;
use crate::interpreter::{
    BusLocation, Line, Route, RouteAtStop, RoutePoint, Stop, StopArrival, nearest_stops,
    route_points, routes_at_stop,
};

pub const DEFAULT_QUERY_MARKER: &str = "?a=1";
pub const DEFAULT_NEAREST_LIMIT: usize = 30;

const BASE_URL_VAR: &str = "TELEMATICA_BASE_URL";
const NEAREST_LIMIT_VAR: &str = "TELEMATICA_NEAREST_LIMIT";

/// The telematics endpoints this crate knows how to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Stops,
    Lines,
    Routes,
    RouteDetail { route_code: String },
    StopArrivals { stop_code: String },
    BusLocation { route_code: String },
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stops => "getStopsB",
            Self::Lines => "getLines",
            Self::Routes => "getRoutes",
            Self::RouteDetail { .. } => "getRouteDetailPerRoute",
            Self::StopArrivals { .. } => "getStopArrivals",
            Self::BusLocation { .. } => "getBusLocation",
        }
    }

    fn parameter(&self) -> Option<&str> {
        match self {
            Self::Stops | Self::Lines | Self::Routes => None,
            Self::RouteDetail { route_code } | Self::BusLocation { route_code } => {
                Some(route_code.as_str())
            }
            Self::StopArrivals { stop_code } => Some(stop_code.as_str()),
        }
    }

    /// The endpoint path, e.g. `getStopArrivals/010001`.
    pub fn path(&self) -> String {
        match self.parameter() {
            Some(param) => format!("{}/{}", self.name(), param),
            None => self.name().to_string(),
        }
    }
}

/// Where and how to reach the telematics service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub query_marker: String,
    /// Maximum number of stops returned by [TransitClient::nearest_stops].
    pub nearest_limit: usize,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            query_marker: DEFAULT_QUERY_MARKER.to_string(),
            nearest_limit: DEFAULT_NEAREST_LIMIT,
        }
    }

    /// Reads `TELEMATICA_BASE_URL` and, optionally, `TELEMATICA_NEAREST_LIMIT`.
    ///
    /// Returns `None` if the base URL is not set.
    pub fn from_env() -> Option<Self> {
        let mut config = Self::new(std::env::var(BASE_URL_VAR).ok()?);
        if let Some(limit) = std::env::var(NEAREST_LIMIT_VAR)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.nearest_limit = limit;
        }
        Some(config)
    }

    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!(
            "{}/{}{}",
            self.base_url.trim_end_matches('/'),
            endpoint.path(),
            self.query_marker
        )
    }
}

/// Retrieves a complete response body.
///
/// Implementations must return only once the whole body has been read; a
/// partially read body must be reported as an error, never decoded.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DecodeError>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<Vec<u8>, DecodeError>,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DecodeError> {
        self(url)
    }
}

/// Fetches, decodes and interprets telematics responses.
#[derive(Debug, Clone)]
pub struct TransitClient<F> {
    config: ClientConfig,
    fetcher: F,
}

impl<F: Fetch> TransitClient<F> {
    pub fn new(config: ClientConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches and decodes one endpoint, keeping the failure cause.
    pub fn payload(&self, endpoint: &Endpoint) -> Result<Payload, DecodeError> {
        let url = self.config.url(endpoint);
        debug!(%url, "fetching");
        let body = self.fetcher.fetch(&url)?;
        Payload::from_bytes(&body)
    }

    /// Fetches and decodes one endpoint into records, or none on failure.
    pub fn records(&self, endpoint: &Endpoint) -> Vec<Record> {
        match self.payload(endpoint) {
            Ok(payload) => payload.into_records(),
            Err(error) => {
                warn!(endpoint = %endpoint.path(), %error, "no data from endpoint");
                Vec::new()
            }
        }
    }

    pub fn stops(&self) -> Vec<Stop> {
        self.records(&Endpoint::Stops)
            .iter()
            .filter_map(Stop::from_record)
            .collect()
    }

    pub fn lines(&self) -> Vec<Line> {
        self.records(&Endpoint::Lines)
            .iter()
            .filter_map(Line::from_record)
            .collect()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.records(&Endpoint::Routes)
            .iter()
            .filter_map(Route::from_record)
            .collect()
    }

    pub fn route_points(&self, route_code: &str) -> Vec<RoutePoint> {
        route_points(&self.records(&Endpoint::RouteDetail {
            route_code: route_code.to_string(),
        }))
    }

    pub fn arrivals(&self, stop_code: &str) -> Vec<StopArrival> {
        self.records(&Endpoint::StopArrivals {
            stop_code: stop_code.to_string(),
        })
        .iter()
        .filter_map(StopArrival::from_record)
        .collect()
    }

    pub fn bus_locations(&self, route_code: &str) -> Vec<BusLocation> {
        self.records(&Endpoint::BusLocation {
            route_code: route_code.to_string(),
        })
        .iter()
        .filter_map(|record| BusLocation::from_record(record, route_code))
        .collect()
    }

    /// The stops closest to `(lat, lng)`, nearest first.
    pub fn nearest_stops(&self, lat: f64, lng: f64) -> Vec<Stop> {
        nearest_stops(&self.stops(), lat, lng, self.config.nearest_limit)
    }

    /// Routes currently serving a stop, as observed in its live arrivals.
    pub fn routes_for_stop(&self, stop_code: &str) -> Vec<RouteAtStop> {
        routes_at_stop(&self.arrivals(stop_code))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct FakeService(HashMap<String, Vec<u8>>);

    impl Fetch for FakeService {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, DecodeError> {
            self.0.get(url).cloned().ok_or_else(|| DecodeError::Fetch {
                url: url.to_string(),
                reason: "not found".to_string(),
            })
        }
    }

    fn client(responses: &[(&str, &str)]) -> TransitClient<FakeService> {
        let map = responses
            .iter()
            .map(|(path, body)| {
                (
                    format!("http://svc/api/{path}?a=1"),
                    body.as_bytes().to_vec(),
                )
            })
            .collect();
        TransitClient::new(ClientConfig::new("http://svc/api/"), FakeService(map))
    }

    #[test]
    fn test_urls() {
        let config = ClientConfig::new("http://svc/api");
        assert_eq!(config.url(&Endpoint::Lines), "http://svc/api/getLines?a=1");
        assert_eq!(
            config.url(&Endpoint::StopArrivals {
                stop_code: "010001".into()
            }),
            "http://svc/api/getStopArrivals/010001?a=1"
        );
        assert_eq!(
            Endpoint::RouteDetail {
                route_code: "2045".into()
            }
            .path(),
            "getRouteDetailPerRoute/2045"
        );
    }

    #[test]
    fn test_fetch_failure_is_empty() {
        let client = client(&[]);
        assert!(matches!(
            client.payload(&Endpoint::Lines),
            Err(DecodeError::Fetch { .. })
        ));
        assert!(client.lines().is_empty());
        assert!(client.nearest_stops(0.0, 0.0).is_empty());
    }

    #[test]
    fn test_bus_locations_take_route_code() {
        let client = client(&[(
            "getBusLocation/2045",
            r#"[{"VEH_NO": "20017", "CS_DATE": "Oct 19 2026 10:00:00", "CS_LAT": "37.9", "CS_LNG": "23.7"}]"#,
        )]);
        let locations = client.bus_locations("2045");
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].route_code, "2045");
        assert_eq!(locations[0].vehicle, "20017");
    }

    #[test]
    fn test_routes_for_stop() {
        let client = client(&[(
            "getStopArrivals/010001",
            r#"("3", "2045", "1"), ("8", "1804", "2"), ("11", "2045", "5")"#,
        )]);
        let routes = client.routes_for_stop("010001");
        let codes: Vec<&str> = routes.iter().map(|r| r.route.code.as_str()).collect();
        assert_eq!(codes, ["2045", "1804"]);
    }

    #[test]
    fn test_object_bodies_are_not_entities() {
        for body in ["{}", r#"{"error": "Service unavailable"}"#] {
            let client = client(&[
                ("getStopsB", body),
                ("getLines", body),
                ("getRoutes", body),
                ("getStopArrivals/010001", body),
                ("getBusLocation/2045", body),
                ("getRouteDetailPerRoute/2045", body),
            ]);
            assert!(client.stops().is_empty(), "{body}");
            assert!(client.lines().is_empty(), "{body}");
            assert!(client.routes().is_empty(), "{body}");
            assert!(client.arrivals("010001").is_empty(), "{body}");
            assert!(client.bus_locations("2045").is_empty(), "{body}");
            assert!(client.route_points("2045").is_empty(), "{body}");
            assert!(client.nearest_stops(37.98, 23.73).is_empty(), "{body}");
            assert!(client.routes_for_stop("010001").is_empty(), "{body}");
        }
    }

    #[test]
    fn test_closure_fetcher() {
        let client = TransitClient::new(ClientConfig::new("http://svc"), |_url: &str| {
            Ok::<_, DecodeError>(br#"[["23.7", "37.9"], ["23.8", "38.0"]]"#.to_vec())
        });
        let points = client.route_points("2045");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].order, 1);
    }

    #[test]
    fn test_nearest_limit_from_config() {
        let body = (0..40)
            .map(|i| format!(r#"("{i}", {i}, "S", None, None, "0.{i:02}", "0")"#))
            .collect::<Vec<_>>()
            .join(", ");
        let mut client = client(&[("getStopsB", body.as_str())]);
        client.config.nearest_limit = 5;
        let nearest = client.nearest_stops(0.0, 0.0);
        assert_eq!(nearest.len(), 5);
        assert_eq!(nearest[0].code, "0");
    }
}
