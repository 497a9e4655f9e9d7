// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur in namespace operations
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Chain is longer than the fetch ceiling; raised before any store call
    #[error("Chain of {count} chunks exceeds the fetch limit of {limit}")]
    TooLarge { count: usize, limit: usize },

    #[error("Store error: {0}")]
    IoFailure(String),

    #[error("Serialization error: {0}")]
    SerializationFailure(String),

    #[error("Offset {offset} out of range for {len} bytes")]
    OutOfRange { offset: u64, len: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found<S: AsRef<str>>(path: S) -> Self {
        Error::NotFound(path.as_ref().into())
    }

    pub fn not_a_directory<S: AsRef<str>>(path: S) -> Self {
        Error::NotADirectory(path.as_ref().into())
    }

    pub fn not_a_file<S: AsRef<str>>(path: S) -> Self {
        Error::NotAFile(path.as_ref().into())
    }

    pub fn already_exists<S: AsRef<str>>(path: S) -> Self {
        Error::AlreadyExists(path.as_ref().into())
    }

    pub fn directory_not_empty<S: AsRef<str>>(path: S) -> Self {
        Error::DirectoryNotEmpty(path.as_ref().into())
    }

    pub fn invalid_path<S: AsRef<str>>(path: S) -> Self {
        Error::InvalidPath(path.as_ref().into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Error::IoFailure(message.into())
    }

    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Error::SerializationFailure(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::SerializationFailure(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        Error::SerializationFailure(format!("content decoding: {err}"))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Error {
        Error::SerializationFailure(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Error {
        Error::SerializationFailure(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for Error {
    fn from(err: serde_yaml_ng::Error) -> Error {
        Error::Config(err.to_string())
    }
}
