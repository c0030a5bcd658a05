use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by task operations. Unknown ids are never an error; they are
/// treated as no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("Invalid status")]
    InvalidStatus,
    /// Bad reorder payload: unknown status or no usable ids.
    #[error("Invalid")]
    InvalidOrder,
    #[error("Title required")]
    TitleRequired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OpError {
    /// Rejected input, as opposed to a storage failure.
    pub fn is_validation(&self) -> bool {
        !matches!(self, OpError::Store(_))
    }
}
