/// Errors raised by the core at its API boundary.
///
/// Stepping and store replacement never fail; only out-of-range access to a
/// dense grid and invalid configuration values are reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifeError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    IndexOutOfBounds { x: i64, y: i64, width: u32, height: u32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type LifeResult<T> = Result<T, LifeError>;

impl LifeError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LifeError::InvalidConfig(msg.into())
    }
}
