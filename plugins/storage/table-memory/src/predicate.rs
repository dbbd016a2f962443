use std::cmp::Ordering;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use tablemap_api::query::{PARTITION_KEY, ROW_KEY, TIMESTAMP};
use tablemap_api::{FilterPredicate, TableRow, ValueCell};
use uuid::Uuid;

/// Whether `row` satisfies `predicate`.
///
/// The literal is read as a value of the stored cell's kind. Rows without the
/// column, and literals that do not parse as that kind, never match.
pub(crate) fn matches(row: &TableRow, predicate: &FilterPredicate) -> bool {
    let literal = unquote(&predicate.value);
    let ordering = match predicate.property.as_str() {
        PARTITION_KEY => Some(row.partition_key.as_str().cmp(literal.as_str())),
        ROW_KEY => Some(row.row_key.as_str().cmp(literal.as_str())),
        TIMESTAMP => parse_datetime(&literal).map(|at| row.timestamp.cmp(&at)),
        column => row
            .columns
            .get(column)
            .and_then(|cell| compare(cell, &literal)),
    };
    ordering.is_some_and(|o| predicate.operator.holds(o))
}

/// `stored.cmp(literal)` with the literal parsed as the cell's kind.
fn compare(cell: &ValueCell, literal: &str) -> Option<Ordering> {
    match cell {
        ValueCell::String(s) => Some(s.as_str().cmp(literal)),
        ValueCell::Int32(v) => literal.parse::<i64>().ok().map(|l| i64::from(*v).cmp(&l)),
        ValueCell::Int64(v) => literal.parse::<i64>().ok().map(|l| v.cmp(&l)),
        ValueCell::Double(v) => literal.parse::<f64>().ok().and_then(|l| v.partial_cmp(&l)),
        ValueCell::Boolean(v) => parse_bool(literal).map(|l| v.cmp(&l)),
        ValueCell::DateTime(v) => parse_datetime(literal).map(|l| v.cmp(&l)),
        ValueCell::Guid(v) => Uuid::parse_str(literal).ok().map(|l| v.cmp(&l)),
        ValueCell::Binary(v) => STANDARD.decode(literal).ok().map(|l| v.as_slice().cmp(&l)),
    }
}

/// Strip one pair of surrounding single quotes, undoubling inner ones.
fn unquote(literal: &str) -> String {
    match literal.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => literal.to_string(),
    }
}

fn parse_bool(literal: &str) -> Option<bool> {
    if literal.eq_ignore_ascii_case("true") {
        Some(true)
    } else if literal.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_datetime(literal: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(literal)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tablemap_api::Operator;

    use super::*;

    fn row() -> TableRow {
        TableRow::new("users", "42")
            .with_column("Name", ValueCell::String("Bob".into()))
            .with_column("Age", ValueCell::Int32(30))
            .with_column("Score", ValueCell::Double(2.5))
            .with_column("Active", ValueCell::Boolean(true))
            .with_column(
                "Joined",
                ValueCell::DateTime(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            )
    }

    fn check(property: &str, operator: Operator, value: &str) -> bool {
        matches(&row(), &FilterPredicate::new(property, operator, value))
    }

    #[test]
    fn literal_follows_the_cell_kind() {
        assert!(check("Age", Operator::GreaterThanOrEqual, "30"));
        assert!(check("Age", Operator::LessThan, "100"));
        // Numeric, not lexical: "9" < "30" as text, 30 > 9 as number.
        assert!(check("Age", Operator::GreaterThan, "9"));
        assert!(check("Score", Operator::Equal, "2.5"));
        assert!(check("Active", Operator::Equal, "TRUE"));
        assert!(check("Joined", Operator::LessThan, "2021-01-01T00:00:00Z"));
    }

    #[test]
    fn text_literals_may_be_quoted() {
        assert!(check("Name", Operator::Equal, "Bob"));
        assert!(check("Name", Operator::Equal, "'Bob'"));
        assert!(!check("Name", Operator::Equal, "bob"));
    }

    #[test]
    fn system_properties() {
        assert!(check(PARTITION_KEY, Operator::Equal, "users"));
        assert!(check(ROW_KEY, Operator::NotEqual, "7"));
        assert!(check(TIMESTAMP, Operator::GreaterThan, "2000-01-01T00:00:00Z"));
    }

    #[test]
    fn missing_column_or_bad_literal_never_matches() {
        assert!(!check("Missing", Operator::NotEqual, "x"));
        assert!(!check("Age", Operator::NotEqual, "thirty"));
    }
}
