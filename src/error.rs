use thiserror::Error;

pub type Result<T> = std::result::Result<T, CapacityError>;

/// Failure to resize the backing arrays. The container is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("requested capacity {requested} exceeds the maximum of {max} slots")]
    TooLarge { requested: usize, max: usize },
    #[error("requested capacity {requested} cannot hold {len} live entries")]
    BelowLen { requested: usize, len: usize },
    #[error("allocation of {requested} slots failed")]
    AllocFailed { requested: usize },
}
