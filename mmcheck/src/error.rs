use core::fmt::{self, Display};
use std::io;

/// Central error type.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Json(serde_json::Error),
    Mm(mmko::Error),
    ThreadPool(rayon::ThreadPoolBuildError),
    /// the verifying thread stopped receiving proofs
    Disconnected,
    /// the verifying thread panicked
    Thread,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::Json(e) => e.fmt(f),
            Self::Mm(e) => e.fmt(f),
            Self::ThreadPool(e) => e.fmt(f),
            Self::Disconnected => write!(f, "verification channel disconnected"),
            Self::Thread => write!(f, "verification thread panicked"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<mmko::Error> for Error {
    fn from(err: mmko::Error) -> Self {
        Self::Mm(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(err)
    }
}
