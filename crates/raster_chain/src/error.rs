use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Unknown raster function: {0}")]
    UnknownFunction(String),

    #[error("Missing required parameter '{parameter}' for {function}")]
    MissingParameter { function: String, parameter: String },

    #[error("Chain has no step at index {index} (length {len})")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Pixel block has {actual} bands, expected {expected}")]
    BandCountMismatch { expected: usize, actual: usize },

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
