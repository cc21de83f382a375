//! Game asset grids from the Gemini image API.
//!
//! A [`GenerationClient`] turns a [`GenerationRequest`] into one composite
//! image, the [`slicer`] cuts that composite into per-asset cells, and a
//! [`MatrixGenerator`] runs style x asset exploration batches on top of any
//! [`ImageGenerator`].

pub mod config;
pub mod error;
pub mod gemini;
pub mod imaging;
pub mod logger;
pub mod matrix;
pub mod models;
pub mod prompt;
pub mod slicer;

pub use config::GeminiConfig;
pub use error::{GridError, Result};
pub use gemini::{GenerationClient, ImageGenerator};
pub use matrix::{
    AbortHandle, AssetRepository, InMemoryAssetRepository, MatrixGenerator, MatrixObserver,
    MatrixOptions, NoopObserver,
};
pub use models::*;
pub use prompt::{build_grid_prompt, build_prompt, build_style_grid_prompt, PromptParams};
pub use slicer::{slice_base64, slice_image, split_composite};
