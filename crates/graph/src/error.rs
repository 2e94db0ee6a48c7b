use crate::code::Segment;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// A source record that cannot be turned into exactly one entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("record has no PSGC code")]
    MissingCode,

    #[error("record {0} has no name")]
    MissingName(String),

    #[error("PSGC code {0:?} is not a 10-digit numeric code")]
    MalformedCode(String),

    #[error("{segment} segment {value:?} must be {width} digits")]
    SegmentWidth {
        segment: Segment,
        value: String,
        width: usize,
    },

    #[error("{segment} segment {value:?} is not numeric")]
    NonNumericSegment { segment: Segment, value: String },

    #[error("{segment} segment {value:?} disagrees with code {code}")]
    SegmentMismatch {
        segment: Segment,
        value: String,
        code: String,
    },

    #[error("unsupported geographic level {0:?}")]
    UnsupportedLevel(String),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No entity with code {0}")]
    NotFound(String),

    #[error("No region reaches {0}; the stored hierarchy is inconsistent")]
    Unreachable(String),

    #[error(transparent)]
    Store(#[from] GraphError),
}

impl ResolveError {
    /// Stable machine-readable code used in response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::NotFound(_) => "not_found",
            ResolveError::Unreachable(_) => "unreachable",
            ResolveError::Store(GraphError::StoreUnavailable(_)) => "store_unavailable",
            ResolveError::Store(_) => "internal",
        }
    }
}
