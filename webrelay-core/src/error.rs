use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ValidationError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
