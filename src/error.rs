//! Error types for oscompose

use thiserror::Error;

/// Result type for oscompose operations
pub type Result<T> = std::result::Result<T, OsComposeError>;

/// oscompose error types
#[derive(Error, Debug)]
pub enum OsComposeError {
    #[error("{service:?} belongs with {joins:?}, but {existing:?} also contains some overlapping elements")]
    Conflict {
        service: String,
        joins: Vec<String>,
        existing: Vec<String>,
    },

    #[error("build path outside of the permitted base directories: {0}")]
    PathResolution(String),

    #[error("Recipe error: {0}")]
    Recipe(String),

    #[error("could not find an input image for {0:?}")]
    ImageResolution(String),

    #[error("Reduction error: {0}")]
    Reduction(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("{}", join_errors(.0))]
    Aggregate(Vec<OsComposeError>),

    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("Dockerfile parse error at line {line}: {message}")]
    DockerfileParse { line: usize, message: String },

    #[error("Invalid image reference: {0}")]
    InvalidImageReference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),
}

impl OsComposeError {
    /// Collapse a list of collected errors into a single error, if any.
    pub fn aggregate(mut errors: Vec<OsComposeError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(OsComposeError::Aggregate(errors)),
        }
    }

    /// Errors contained in this error, flattening aggregates
    pub fn errors(&self) -> Vec<&OsComposeError> {
        match self {
            OsComposeError::Aggregate(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[OsComposeError]) -> String {
    if errors.len() == 1 {
        return errors[0].to_string();
    }
    let lines: Vec<String> = errors.iter().map(|e| format!("* {}", e)).collect();
    format!("[{}]", lines.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_of_one_is_the_error() {
        let err = OsComposeError::aggregate(vec![OsComposeError::ImageResolution("web".into())]).unwrap();
        assert!(matches!(err, OsComposeError::ImageResolution(_)));
        assert_eq!(err.to_string(), "could not find an input image for \"web\"");
    }

    #[test]
    fn test_aggregate_lists_every_error() {
        let err = OsComposeError::aggregate(vec![
            OsComposeError::PathResolution("/elsewhere".into()),
            OsComposeError::Recipe("unable to locate a Dockerfile in ./api".into()),
        ])
        .unwrap();

        let msg = err.to_string();
        assert!(msg.contains("/elsewhere"));
        assert!(msg.contains("./api"));
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn test_aggregate_of_nothing() {
        assert!(OsComposeError::aggregate(Vec::new()).is_none());
    }
}
