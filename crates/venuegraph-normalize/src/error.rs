use std::path::PathBuf;

/// Errors raised while loading or writing an abbreviation cache.
///
/// Cache misses and failed abbreviation validation are not errors; they are
/// reported through [`crate::VenueToken`].
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("abbreviation cache is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
