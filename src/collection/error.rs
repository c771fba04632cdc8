use anyhow::anyhow;
use thiserror::Error;

use super::processes::Pid;

/// An error to do with data collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A general error to propagate back up. A wrapper around [`anyhow::Error`].
    #[error(transparent)]
    General(anyhow::Error),

    /// A detail lookup was made for a process that no longer exists.
    #[error("process not found (pid {pid})")]
    ProcessNotFound { pid: Pid },

    /// The caller-supplied deadline passed before the collection finished.
    #[error("deadline exceeded while collecting data")]
    DeadlineExceeded,

    /// The collection is unsupported.
    #[error("sbcmon does not support this type of data collection for this platform.")]
    Unsupported,
}

impl CollectionError {
    pub(crate) fn from_str(msg: &'static str) -> Self {
        Self::General(anyhow!(msg))
    }
}

/// A [`Result`] with the error type being a [`CollectionError`].
pub type CollectionResult<T> = Result<T, CollectionError>;

impl From<std::io::Error> for CollectionError {
    fn from(err: std::io::Error) -> Self {
        CollectionError::General(err.into())
    }
}

impl From<anyhow::Error> for CollectionError {
    fn from(err: anyhow::Error) -> Self {
        CollectionError::General(err)
    }
}
