use std::path::PathBuf;

/// Errors raised by the graph store.
///
/// Zero totals while normalizing weights are not errors: such sources and
/// intermediate nodes simply contribute nothing.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed graph document {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed graph document: {0}")]
    MalformedDocument(String),

    #[error("malformed count for relation `{relation}` ({source_key} -> {target_key}): {value}")]
    MalformedInput {
        relation: String,
        source_key: String,
        target_key: String,
        value: f64,
    },

    #[error("weights for relation `{relation}` overflow at {source_key} -> {target_key}")]
    WeightOverflow {
        relation: String,
        source_key: String,
        target_key: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
