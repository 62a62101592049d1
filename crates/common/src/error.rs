use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorybotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("decode error: {0}")]
    Decode(String),
}

pub type StorybotResult<T> = Result<T, StorybotError>;
