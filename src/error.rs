use geo::Coord;
use thiserror::Error;

/// Why an assembled AU geometry was rejected or flagged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultDefect {
    Empty,
    Invalid,
}

impl std::fmt::Display for ResultDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultDefect::Empty => write!(f, "empty"),
            ResultDefect::Invalid => write!(f, "not valid"),
        }
    }
}

/// Recoverable failures raised while matching one AU.
///
/// None of these abort a run: they are logged at ring or AU granularity and
/// counted in the run summary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchingError {
    #[error(transparent)]
    Index(#[from] segindex::IndexError),

    #[error("path not found from ({}, {}) to ({}, {})", .from.x, .from.y, .to.x, .to.y)]
    PathNotFound { from: Coord<f64>, to: Coord<f64> },

    #[error("touching point not projected: ({}, {})", .0.x, .0.y)]
    TouchingPointNotProjected(Coord<f64>),

    #[error("closed boundary line not found")]
    ClosedBoundaryNotFound,

    #[error("error constructing ring: {0}")]
    RingConstruction(String),

    #[error("resulting multipolygon is {0}")]
    ResultInvalidOrEmpty(ResultDefect),
}
