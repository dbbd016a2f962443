/// Errors raised while mapping records to rows and back, or while parsing filters.
///
/// None of these are retried: they describe bad input (a record type whose
/// field names cannot be evaluated, a row holding cells the target type cannot
/// accept, a malformed operator), not transient conditions.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Identifier suffix rule applied to a field name shorter than two characters.
    #[error("field name '{0}' is too short to evaluate as an identifier")]
    InvalidFieldName(String),

    /// A cell's kind tag is not one the target field (or the wire layer) supports.
    #[error("column '{column}': unsupported cell type {kind}")]
    UnsupportedCellType { column: String, kind: String },

    /// A well-shaped `property operator value` filter with an unknown operator.
    #[error("invalid filter operator '{0}'")]
    InvalidOperator(String),

    /// A cell of an accepted kind whose value could not be converted.
    #[error("column '{column}': {message}")]
    Cell { column: String, message: String },

    /// Embedded text (complex field) could not be produced or parsed.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MapError {
    pub(crate) fn unsupported(column: &str, kind: impl std::fmt::Display) -> Self {
        MapError::UnsupportedCellType {
            column: column.to_string(),
            kind: kind.to_string(),
        }
    }

    pub(crate) fn cell(column: &str, message: impl std::fmt::Display) -> Self {
        MapError::Cell {
            column: column.to_string(),
            message: message.to_string(),
        }
    }

    /// Add the column name to errors that do not carry one yet.
    ///
    /// Produces: `"column 'tags': <original message>"` for `Serialization`.
    pub fn with_column(self, column: &str) -> Self {
        match self {
            MapError::Serialization(e) => MapError::cell(column, e),
            other => other,
        }
    }
}
