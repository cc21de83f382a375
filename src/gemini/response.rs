//! Turning raw HTTP responses into either an image or a typed error.

use crate::{
    error::{GridError, Result},
    models::{GenerateContentResponse, ResponsePart},
};
use serde::Deserialize;

/// Longest model refusal text carried in a `GenerationRejectedError`.
pub const REJECTION_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

/// Maps a non-2xx status and its body onto a [`GridError`]. Only the status
/// code decides the variant; the body only contributes message text.
pub fn classify_http_error(status: u16, body: &str) -> GridError {
    match status {
        401 | 403 => GridError::AuthError(
            "the API key was rejected, check that it is valid and has access to the model".into(),
        ),
        429 => GridError::RateLimitError(
            "too many requests, wait a moment before trying again".into(),
        ),
        400 => GridError::BadRequestError(
            server_message(body)
                .unwrap_or_else(|| "the request parameters were rejected".to_string()),
        ),
        500..=599 => GridError::ServerError(format!(
            "the service is temporarily unavailable ({}), try again later",
            status
        )),
        _ if body.trim().is_empty() => {
            GridError::RequestError(format!("request failed ({}): empty response", status))
        }
        _ => GridError::RequestError(
            server_message(body).unwrap_or_else(|| format!("request failed ({})", status)),
        ),
    }
}

/// Truncates to `max_chars` characters, appending `…` when anything was cut.
pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

/// Pulls the base64 image out of the first candidate.
pub fn extract_image(response: &GenerateContentResponse) -> Result<String> {
    let parts = response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| GridError::NoImageReturnedError("the response contained no candidates".into()))?
        .content
        .as_ref()
        .and_then(|content| content.parts.as_deref())
        .unwrap_or_default();

    let mut first_text: Option<&str> = None;
    for part in parts {
        match part {
            ResponsePart::InlineData { inline_data } if !inline_data.data.is_empty() => {
                return Ok(inline_data.data.clone());
            }
            ResponsePart::Text { text } if first_text.is_none() && !text.is_empty() => {
                first_text = Some(text);
            }
            _ => {}
        }
    }

    match first_text {
        Some(text) => {
            let trimmed = text.trim();
            let message = if trimmed.is_empty() { text } else { trimmed };
            Err(GridError::GenerationRejectedError(truncate_text(
                message,
                REJECTION_PREVIEW_CHARS,
            )))
        }
        None => Err(GridError::NoImageReturnedError(
            "the response contained neither an image nor text".into(),
        )),
    }
}

/// Parses a 2xx body and extracts the image.
pub fn parse_success_body(body: &str) -> Result<String> {
    if body.trim().is_empty() {
        return Err(GridError::EmptyResponseError);
    }
    let envelope: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GridError::ResponseError(format!("invalid JSON in response: {}", e)))?;
    extract_image(&envelope)
}
