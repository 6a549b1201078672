//! Route table error types

use thiserror::Error;

/// Errors raised while building a route table or addressing routes by name
///
/// An unmatched path is not an error: [`RouteTable::resolve`] reports it as
/// [`Resolution::NotFound`].
///
/// [`RouteTable::resolve`]: super::RouteTable::resolve
/// [`Resolution::NotFound`]: super::Resolution::NotFound
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Pattern text could not be parsed
    #[error("Invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two entries share a name
    #[error("Duplicate route name: {0}")]
    DuplicateName(String),

    /// Two entries share a path pattern
    #[error("Duplicate route path: {0}")]
    DuplicatePath(String),

    /// Two distinct patterns can match the same concrete URL
    #[error("Ambiguous routes {first:?} and {second:?} can match the same path")]
    Ambiguous { first: String, second: String },

    /// No route carries this name
    #[error("Unknown route name: {0}")]
    UnknownName(String),

    /// A parameter required to build a path was not supplied
    #[error("Missing parameter {param:?} for route pattern {pattern:?}")]
    MissingParam { pattern: String, param: String },

    /// A parameter value violates its pattern constraint
    #[error("Parameter {param:?} value {value:?} does not satisfy ({constraint})")]
    InvalidParam {
        param: String,
        value: String,
        constraint: String,
    },

    /// Application base prefix is malformed
    #[error("Invalid base path {0:?}: must start with '/'")]
    InvalidBase(String),
}

/// Result type alias for route table operations
pub type RouteResult<T> = Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteError::UnknownName("settings".to_string());
        assert_eq!(err.to_string(), "Unknown route name: settings");

        let err = RouteError::Ambiguous {
            first: "/service/:id".to_string(),
            second: "/service/build_from_raw".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous routes \"/service/:id\" and \"/service/build_from_raw\" can match the same path"
        );
    }
}
