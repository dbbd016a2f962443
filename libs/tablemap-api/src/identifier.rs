use uuid::Uuid;

use crate::error::MapError;
use crate::value::ValueCell;

/// Where a row key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// Value of the named identifier field.
    Field(String),
    /// The named identifier field was absent (empty); a UUID was synthesized.
    Filled(String),
    /// No field qualifies as identifier; a UUID was synthesized.
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub row_key: String,
    pub source: IdSource,
}

/// Whether a field name marks the row identifier: `id`, or any name whose
/// last two characters are `id`, ignoring case.
///
/// The suffix rule is literal, so `Grid` and `Valid` qualify as well as
/// `UserId`. Names shorter than two characters cannot be evaluated.
pub fn is_identifier(name: &str) -> Result<bool, MapError> {
    if name.eq_ignore_ascii_case("id") {
        return Ok(true);
    }
    let mut tail = name.chars().rev().flat_map(char::to_lowercase);
    match (tail.next(), tail.next()) {
        (Some('d'), Some('i')) => Ok(true),
        (Some(_), Some(_)) => Ok(false),
        _ => Err(MapError::InvalidFieldName(name.to_string())),
    }
}

/// Pick the row key from `(column, value)` pairs in declaration order.
///
/// A field named `id` (any case) wins over every other field. Without one,
/// the first field whose name ends in `id` is used. Every name scanned before
/// the exact `id` match (or all of them, when there is none) is evaluated, so a
/// short name among them fails with `InvalidFieldName`.
///
/// The chosen value's string form is the row key unless it is empty, in which
/// case (as when no field qualifies) a random UUID is synthesized.
pub fn resolve_id<'a, I>(fields: I) -> Result<ResolvedId, MapError>
where
    I: IntoIterator<Item = (&'a str, &'a ValueCell)>,
{
    let mut suffix_match: Option<(&str, &ValueCell)> = None;
    for (name, value) in fields {
        if name.eq_ignore_ascii_case("id") {
            return Ok(resolved(name, value));
        }
        if is_identifier(name)? && suffix_match.is_none() {
            suffix_match = Some((name, value));
        }
    }
    Ok(match suffix_match {
        Some((name, value)) => resolved(name, value),
        None => ResolvedId {
            row_key: synthesize(),
            source: IdSource::Synthesized,
        },
    })
}

fn resolved(name: &str, value: &ValueCell) -> ResolvedId {
    let row_key = value.to_string();
    if row_key.is_empty() {
        ResolvedId {
            row_key: synthesize(),
            source: IdSource::Filled(name.to_string()),
        }
    } else {
        ResolvedId {
            row_key,
            source: IdSource::Field(name.to_string()),
        }
    }
}

fn synthesize() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
