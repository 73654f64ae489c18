use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Missing credentials: set {0}")]
    MissingCredentials(String),

    #[error("No courses found on the course list")]
    NoCourses,

    #[error("Invalid course link '{0}': {1}")]
    InvalidCourseLink(String, url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
