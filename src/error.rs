use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("GET {url} returned {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Archive {} has no member '{member}'", archive.display())]
    MissingArchiveMember { archive: PathBuf, member: String },

    #[error("Refusing to extract archive member with unsafe path: {0}")]
    UnsafeArchivePath(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Interpreter not found on PATH: {0}")]
    InterpreterNotFound(String),

    #[error("Command `{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("Unfulfilled dependencies for {task}: {}", missing.join(", "))]
    MissingDependencies { task: String, missing: Vec<String> },

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{failed} task(s) failed")]
    RunFailed { failed: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
