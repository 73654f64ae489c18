use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Chrome not found: {0}")]
    ChromeNotFound(String),

    #[error("Chrome launch failed: {0}")]
    Launch(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

/// Page-level failures surface to the engine as browser errors
impl From<Error> for lectern_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => lectern_core::Error::Io(e),
            other => lectern_core::Error::Browser(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
