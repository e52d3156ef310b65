use std::path::PathBuf;

/// Errors surfaced by fetching and loading.
///
/// Underlying I/O, HTTP and archive failures are wrapped transparently so the
/// caller sees them unmodified.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("reading {}: {source}", path.display())]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error("invalid .npy header in {}: {reason}", path.display())]
    BadNpyHeader { path: PathBuf, reason: String },

    #[error("checksum mismatch for {file}: expected md5:{expected}, got md5:{actual}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("subject {0} is not part of the dataset")]
    UnknownSubject(usize),

    #[error("no subjects requested")]
    NoSubjects,

    #[error("no metadata file was collected for the requested subjects")]
    MissingMetadata,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
