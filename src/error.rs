use thiserror::Error;

/// A precondition on pipeline input was violated.
///
/// Raised at the boundaries where loosely-typed input (date-range strings,
/// dimension names, raw table cells) becomes typed. Empty selections and
/// empty views are never reported through this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("invalid {field} date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("unknown filter dimension '{0}' (expected segment, region, category or channel)")]
    UnknownDimension(String),

    #[error("row {row}, column {column}: {reason}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        reason: String,
    },
}
