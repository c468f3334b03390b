use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error while accessing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `reason` is the HTTP status line, or the transport error if no response arrived.
    #[error("Error while trying to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not sure how to find items in that JSON")]
    Format,

    #[error("Repository #{index} is missing a string `{field}` field")]
    Descriptor { index: usize, field: &'static str },

    #[error("Refusing to clone repository with unsafe name {0:?}")]
    InvalidName(String),

    #[error("Command `{command}` failed: {status}")]
    Command { command: String, status: String },
}
