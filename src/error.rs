use thiserror::Error;

/// Result alias for `reposim`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the similarity pipeline and its clustering primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Fewer repositories than clustering needs.
    #[error("insufficient data: need at least {required} repositories, got {found}")]
    InsufficientData {
        /// Minimum number of repositories.
        required: usize,
        /// Number supplied.
        found: usize,
    },

    /// Algorithm hint outside `{auto, knn, dbscan, kmeans}`.
    #[error("unknown clustering algorithm '{0}' (expected one of: auto, knn, dbscan, kmeans)")]
    UnknownAlgorithm(String),

    /// A clustering strategy failed on this input.
    #[error("{algorithm} failed: {reason}")]
    AlgorithmExecution {
        /// Strategy name.
        algorithm: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// The selected repository is not part of the supplied list.
    #[error("repository '{0}' not found in dataset")]
    RepositoryNotFound(String),

    /// Requested neighbor count outside `0 < n < repository_count`.
    #[error("invalid neighbor count {n}: must be between 1 and {max}")]
    InvalidNeighborCount {
        /// Requested count.
        n: usize,
        /// Largest accepted count (`repository_count - 1`).
        max: usize,
    },

    /// The metric collaborator could not answer.
    #[error("metric lookup failed: {0}")]
    MetricLookup(String),

    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Row length mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a primitive failure as a strategy execution error.
    pub(crate) fn in_algorithm(self, algorithm: &'static str) -> Self {
        match self {
            e @ Error::AlgorithmExecution { .. } => e,
            other => Error::AlgorithmExecution {
                algorithm,
                reason: other.to_string(),
            },
        }
    }

    /// Whether this error is a caller contract violation that must not be
    /// hidden behind the fallback path.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::UnknownAlgorithm(_) | Error::RepositoryNotFound(_)
        )
    }
}
