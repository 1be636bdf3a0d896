use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Malformed startup parameters: {0}")]
    Startup(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Oracle exchange failed: {0}")]
    Oracle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
