use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Pipeline error taxonomy.
///
/// `Config` is fatal before any cycle runs. `InvalidShape` is recoverable:
/// the affected cycle yields no detections and the pipeline keeps running.
/// `Inference` halts the session while preserving the last good results.
#[derive(Debug)]
pub enum Error {
    Config(String),
    InvalidShape(String),
    Inference(anyhow::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid tensor shape: {msg}"),
            Error::Inference(err) => write!(f, "inference failed: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Inference(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Inference(err)
    }
}
