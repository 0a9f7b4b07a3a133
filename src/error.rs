use thiserror::Error;

/// Errors returned by track construction and generation.
///
/// The simulation step and the rebuild pass never fail outright; they log and
/// carry on with whatever could be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("chain has {found} anchors, at least 2 are required")]
    TooFewAnchors { found: usize },

    #[error("chain index {index} out of range ({count} chains)")]
    ChainOutOfRange { index: usize, count: usize },

    #[error("anchor index {index} out of range ({count} anchors)")]
    AnchorOutOfRange { index: usize, count: usize },

    #[error("chain {chain} has zero length")]
    DegenerateChain { chain: usize },

    #[error("profile mesh has no vertices")]
    EmptyProfile,

    #[error("profile triangle list is malformed: {reason}")]
    InvalidProfile { reason: String },

    #[error("no profile mesh configured")]
    MissingProfile,

    #[error("no support prefabs configured")]
    MissingSupportPrefabs,

    #[error("no track chain near the requested position")]
    NoTrackNearPosition,

    #[error("cart index {index} out of range ({count} carts)")]
    CartOutOfRange { index: usize, count: usize },
}

pub type TrackResult<T> = Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = TrackError::TooFewAnchors { found: 1 };
        assert_eq!(
            err.to_string(),
            "chain has 1 anchors, at least 2 are required"
        );

        let err = TrackError::ChainOutOfRange { index: 4, count: 2 };
        assert!(err.to_string().contains("4"));
    }
}
