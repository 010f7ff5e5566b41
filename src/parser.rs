// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/parser.rs - Parser for the telematics service's tuple text format.
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
 * # `parser` Module
 *
 * This module parses the parenthesized tuple text that some telematics
 * endpoints return instead of JSON, e.g.:
 *
 * ```text
 * (1, "a", None), (2, "b", 3)
 * ```
 *
 * Each top-level `(...)` group becomes one [Row]. Inside a group, only three
 * kinds of token are recognized:
 *
 * - a double-quoted string (quotes stripped, no escape processing),
 * - a decimal number, optionally negative (kept verbatim),
 * - the literal `None` or `null` (becomes an empty string).
 *
 * Everything else between tokens is a separator. Groups do not nest: the first
 * `)` after a `(` always closes the group.
 *
 * ## Usage Example
 *
 * ```
 * use telematica::parser::parse_tuples;
 *
 * let rows = parse_tuples(r#"(1, "a", None), (2, "b", 3)"#);
 * assert_eq!(rows[0].fields(), ["1", "a", ""]);
 * assert_eq!(rows[1].fields(), ["2", "b", "3"]);
 * ```
 */

use std::sync::LazyLock;

use regex::Regex;

static GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|(-?\d+(?:\.\d+)?)|(None|null)"#).unwrap());

/// One parenthesized group of the tuple format, as ordered string fields.
///
/// Fields are addressed by position only. Rows are not validated against any
/// schema, so callers must tolerate short rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    /// The field at `index`, if the row is long enough.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_fields(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

/// Extracts the tokens of a single group's inner text, in order.
fn parse_group(inner: &str) -> Row {
    let fields = TOKEN
        .captures_iter(inner)
        .map(|caps| {
            if let Some(quoted) = caps.get(1) {
                quoted.as_str().to_string()
            } else if let Some(number) = caps.get(2) {
                number.as_str().to_string()
            } else {
                // None / null
                String::new()
            }
        })
        .collect();
    Row(fields)
}

/// Parses tuple text into rows, left to right.
///
/// Groups without any recognizable token are dropped rather than emitted as
/// empty rows.
pub fn parse_tuples(text: &str) -> Vec<Row> {
    GROUP
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|inner| parse_group(inner.as_str()))
        .filter(|row| !row.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(rows: &[Row]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.fields().iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_basic_tuples() {
        let rows = parse_tuples(r#"(1, "a", None), (2, "b", 3)"#);
        assert_eq!(fields(&rows), vec![vec!["1", "a", ""], vec!["2", "b", "3"]]);
    }

    #[test]
    fn test_signed_and_decimal_numbers() {
        let rows = parse_tuples(r#"("x", -12, 37.9752, null)"#);
        assert_eq!(fields(&rows), vec![vec!["x", "-12", "37.9752", ""]]);
    }

    #[test]
    fn test_empty_groups_dropped() {
        let rows = parse_tuples(r#"(), ( , ), (1)"#);
        assert_eq!(fields(&rows), vec![vec!["1"]]);
    }

    #[test]
    fn test_quoted_text_is_not_unescaped() {
        let rows = parse_tuples(r#"("a\nb", "None")"#);
        assert_eq!(fields(&rows), vec![vec![r"a\nb", "None"]]);
    }

    #[test]
    fn test_first_close_paren_ends_group() {
        let rows = parse_tuples(r#"("a(b", 1) 2)"#);
        assert_eq!(fields(&rows), vec![vec!["a(b", "1"]]);

        // A close paren inside quotes still ends the group, which leaves an
        // unterminated quote and no tokens.
        assert!(parse_tuples(r#"("a)b", 1)"#).is_empty());
    }

    #[test]
    fn test_text_without_groups() {
        assert!(parse_tuples("").is_empty());
        assert!(parse_tuples("no tuples here 1 2 3").is_empty());
    }

    #[test]
    fn test_row_access() {
        let row = Row::new(vec!["a".into(), "b".into()]);
        assert_eq!(row.get(1), Some("b"));
        assert_eq!(row.get(2), None);
        assert_eq!(row.len(), 2);
    }
}
