use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use proptest::prelude::*;
use serde_json::json;

use telematica::decoder::{Payload, Record, decode_records};
use telematica::interpreter::{Stop, StopArrival, nearest_stops};
use telematica::parser::{Row, parse_tuples};

const FIXTURES: [&str; 6] = [
    r#"(1, "a", None), (2, "b", 3)"#,
    r#"{"route_code": "2045", "veh_code": "10123", "btime2": "4"}"#,
    r#"{(1, "a"), (2, "b")"#,
    r#"[["23.7", "37.9"], ["23.8", "38.0"]]"#,
    "null",
    "()",
];

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn stop(code: &str, lat: &str, lng: &str) -> Stop {
    let row = Row::new(
        [code, "1", "S", "", "", lat, lng]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    Stop::from_record(&Record::Row(row)).unwrap()
}

#[test]
fn tuple_text_fixture() {
    let rows: Vec<Vec<String>> = parse_tuples(r#"(1, "a", None), (2, "b", 3)"#)
        .into_iter()
        .map(Row::into_fields)
        .collect();
    assert_eq!(rows, vec![vec!["1", "a", ""], vec!["2", "b", "3"]]);
}

#[test]
fn empty_bodies_decode_to_nothing() {
    for text in ["()", "", "null", "[]"] {
        assert!(decode_records(text.as_bytes()).is_empty(), "{text:?}");
        assert!(decode_records(&gzip(text)).is_empty(), "{text:?}");
    }
}

#[test]
fn valid_json_object_is_returned_unchanged() {
    let payload = Payload::from_bytes(FIXTURES[1].as_bytes()).unwrap();
    assert_eq!(
        payload,
        Payload::Json(json!({"route_code": "2045", "veh_code": "10123", "btime2": "4"}))
    );
}

#[test]
fn invalid_json_object_is_read_as_tuples() {
    let text = FIXTURES[2];
    assert_eq!(
        Payload::from_bytes(text.as_bytes()).unwrap(),
        Payload::Rows(parse_tuples(text))
    );
}

#[test]
fn compression_does_not_change_the_result() {
    for text in FIXTURES {
        assert_eq!(
            Payload::from_bytes(&gzip(text)).unwrap(),
            Payload::from_bytes(text.as_bytes()).unwrap(),
            "{text:?}"
        );
    }
}

#[test]
fn arrivals_from_json_and_tuples_agree() {
    let from_json: Vec<StopArrival> = decode_records(FIXTURES[1].as_bytes())
        .iter()
        .filter_map(StopArrival::from_record)
        .collect();
    let from_tuples: Vec<StopArrival> = decode_records(br#"("4", "2045", "10123")"#)
        .iter()
        .filter_map(StopArrival::from_record)
        .collect();
    assert_eq!(from_json, from_tuples);
}

#[test]
fn object_bodies_map_to_no_entities() {
    for body in ["{}", r#"{"error": "Service unavailable"}"#] {
        let records = decode_records(body.as_bytes());
        assert_eq!(records.iter().filter_map(Stop::from_record).count(), 0, "{body}");
        assert_eq!(
            records.iter().filter_map(StopArrival::from_record).count(),
            0,
            "{body}"
        );
    }
}

#[test]
fn nearest_stop_at_reference_point_comes_first() {
    let stops = vec![
        stop("far", "0.5", "0.5"),
        stop("broken", "north", "0"),
        stop("here", "0", "0"),
    ];
    let nearest = nearest_stops(&stops, 0.0, 0.0, 30);
    assert_eq!(nearest.len(), 2);
    assert_eq!(nearest[0].code, "here");
    assert_eq!(nearest[0].distance.as_deref(), Some("0.00"));
    assert!(nearest.iter().all(|s| s.code != "broken"));
}

proptest! {
    #[test]
    fn parser_never_panics(text in ".*") {
        let _ = parse_tuples(&text);
    }

    #[test]
    fn decoder_never_panics_on_random_bytes(body in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_records(&body);
    }

    #[test]
    fn decoder_is_idempotent(text in r#"[\[\]{}(),"a-z0-9 .:-]{0,64}"#) {
        prop_assert_eq!(
            Payload::from_bytes(text.as_bytes()).ok(),
            Payload::from_bytes(text.as_bytes()).ok()
        );
    }

    #[test]
    fn quoted_fields_round_trip(fields in proptest::collection::vec("[a-zA-Z0-9 ]{0,8}", 1..6)) {
        let text = format!(
            "({})",
            fields.iter().map(|f| format!("\"{}\"", f)).collect::<Vec<_>>().join(", ")
        );
        let rows = parse_tuples(&text);
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows[0].fields(), fields.as_slice());
    }

    #[test]
    fn nearest_stops_never_exceed_limit(
        coords in proptest::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 0..80),
        lat in -90.0f64..90.0,
        lng in -180.0f64..180.0,
    ) {
        let stops: Vec<Stop> = coords
            .iter()
            .enumerate()
            .map(|(i, (a, b))| stop(&i.to_string(), &format!("{:.5}", a), &format!("{:.5}", b)))
            .collect();
        let nearest = nearest_stops(&stops, lat, lng, 30);
        prop_assert!(nearest.len() <= 30);
        prop_assert_eq!(nearest.len(), stops.len().min(30));
        let distances: Vec<f64> = nearest
            .iter()
            .map(|s| s.distance.as_deref().unwrap().parse::<f64>().unwrap())
            .collect();
        prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }
}
