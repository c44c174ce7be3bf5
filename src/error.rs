use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Status snapshot is missing its result block")]
    MissingResult,

    #[error("Invalid snapshot tag: {0}")]
    InvalidTag(String),

    #[error("Unable to parse {field} timestamp: {value}")]
    TimestampParse { field: &'static str, value: String },

    #[error("{field} does not match the snapshot value")]
    IdentityMismatch { field: &'static str },

    #[error("Task encode failed: {0}")]
    Encode(#[source] bincode::Error),

    #[error("Task decode failed: {0}")]
    Decode(#[source] bincode::Error),

    #[error("Unknown subscriber: {0}")]
    UnknownSubscriber(String),

    #[error("Too many subscribers (max: {max})")]
    TooManySubscribers { max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
