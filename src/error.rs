use thiserror::Error;

/// Every failure the pipeline can surface. Each variant carries a message
/// that is safe to show to an end user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Authentication error: {0}")]
    AuthError(String),
    #[error("Rate limited: {0}")]
    RateLimitError(String),
    #[error("Bad request: {0}")]
    BadRequestError(String),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Request timed out after {seconds}s. Try compressing the reference image, checking your network connection, or retrying")]
    TimeoutError { seconds: u64 },
    #[error("Empty response: the API returned an empty body")]
    EmptyResponseError,
    #[error("Generation rejected: {0}")]
    GenerationRejectedError(String),
    #[error("No image returned: {0}")]
    NoImageReturnedError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Prompt error: {0}")]
    PromptError(String),
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<image::ImageError> for GridError {
    fn from(err: image::ImageError) -> Self {
        GridError::ImageError(err.to_string())
    }
}

impl From<base64::DecodeError> for GridError {
    fn from(err: base64::DecodeError) -> Self {
        GridError::ImageError(format!("invalid base64 payload: {}", err))
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
