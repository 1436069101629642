use crate::types::ItemId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Response error:\nStatusCode: {0}\nText: {1}")]
    Response(reqwest::StatusCode, String),

    #[error("Failed to deserialize response: {0}")]
    Deserialize(String),

    #[error("Missing field in response: {0}")]
    MissingData(&'static str),

    #[error("GraphQL error {}: {message}", .code.as_deref().unwrap_or("without code"))]
    GraphQl {
        code: Option<String>,
        message: String,
    },

    #[error("Invalid header value, check the credentials for invalid characters: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to resolve item reference: {0}")]
    Resolution(String),

    #[error("Authorization is expired, replace AUTH_TOKEN and SESSION_ID")]
    AuthExpired,

    #[error("No sell listings for item {0}")]
    NoLiquidity(ItemId),
}
