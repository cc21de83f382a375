//! JSON envelopes exchanged with the `generateContent` endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

/// One ordered input part: either prompt text or an inline image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl RequestPart {
    pub fn text(text: impl Into<String>) -> Self {
        RequestPart::Text { text: text.into() }
    }

    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub image_config: ImageConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub image_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

/// A returned content part. Anything that is neither an inline image nor
/// text (function calls, thought signatures...) lands in `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponsePart {
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineImage,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineImage {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_parts_serialize_in_api_shape() {
        let parts = vec![
            RequestPart::image("image/png", "QUJD"),
            RequestPart::text("draw a sword"),
        ];
        let value = serde_json::to_value(&parts).unwrap();
        assert_eq!(
            value,
            json!([
                { "inlineData": { "mimeType": "image/png", "data": "QUJD" } },
                { "text": "draw a sword" }
            ])
        );
    }

    #[test]
    fn square_requests_omit_aspect_ratio() {
        let config = GenerationConfig {
            response_modalities: vec!["IMAGE".into(), "TEXT".into()],
            image_config: ImageConfig {
                image_size: "2K".into(),
                aspect_ratio: None,
            },
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "responseModalities": ["IMAGE", "TEXT"],
                "imageConfig": { "imageSize": "2K" }
            })
        );
    }

    #[test]
    fn response_parts_decode_into_tagged_variants() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inline_data": { "mime_type": "image/png", "data": "AAAA" } },
                        { "thoughtSignature": "xyz" }
                    ]
                }
            }]
        });
        let response: GenerateContentResponse = serde_json::from_value(payload).unwrap();
        let parts = response.candidates.unwrap()[0]
            .content
            .clone()
            .unwrap()
            .parts
            .unwrap();
        assert!(matches!(&parts[0], ResponsePart::Text { text } if text == "here you go"));
        assert!(
            matches!(&parts[1], ResponsePart::InlineData { inline_data } if inline_data.data == "AAAA")
        );
        assert!(matches!(&parts[2], ResponsePart::Other(_)));
    }
}
