use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmuxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Container inspection error: {0}")]
    Inspect(String),

    #[error("Track extraction error: {0}")]
    Extract(String),

    #[error("Subtitle conversion error: {0}")]
    Convert(String),

    #[error("Remux error: {0}")]
    Mux(String),
}

pub type Result<T> = std::result::Result<T, SubmuxError>;
