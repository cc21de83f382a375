pub mod generation_client;
pub mod response;

use crate::{
    error::Result,
    models::{GenerationRequest, GenerationResult},
};
use async_trait::async_trait;

pub use generation_client::GenerationClient;
pub use response::{classify_http_error, extract_image, truncate_text};

/// Anything that can turn a [`GenerationRequest`] into a composite image.
///
/// [`GenerationClient`] is the production implementation; the matrix
/// generator only depends on this trait.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}
