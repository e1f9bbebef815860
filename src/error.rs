use std::path::PathBuf;

/// All errors produced by covdiff.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No git metadata directory was found at the given path or any of its
    /// ancestors. The most common cause is the host plugin running outside
    /// a checkout, so the searched path is part of the message.
    #[error("git repository not found at or above {path}")]
    RepositoryNotFound {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// The repository has no working tree to diff against.
    #[error("bare repository (no working tree): {path}")]
    BareRepository { path: PathBuf },

    /// The reference string did not resolve to an existing tree.
    #[error("reference not found: {reference}")]
    ReferenceNotFound {
        reference: String,
        #[source]
        source: git2::Error,
    },

    /// Historical data that resolved but could not be parsed (corrupt
    /// object, failed peel, odb read failure).
    #[error("malformed repository data: {message}")]
    MalformedRepository {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl Error {
    pub fn repository_not_found(path: impl Into<PathBuf>, source: git2::Error) -> Self {
        Self::RepositoryNotFound {
            path: path.into(),
            source,
        }
    }

    pub fn reference_not_found(reference: impl Into<String>, source: git2::Error) -> Self {
        Self::ReferenceNotFound {
            reference: reference.into(),
            source,
        }
    }

    pub fn malformed(message: impl Into<String>, source: git2::Error) -> Self {
        Self::MalformedRepository {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn malformed_msg(message: impl Into<String>) -> Self {
        Self::MalformedRepository {
            message: message.into(),
            source: None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.into().display(), err),
        ))
    }
}
