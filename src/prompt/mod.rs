//! Deterministic prompt construction.
//!
//! A prompt is chosen along two axes, content mode (text only or style
//! transfer from a reference image) and layout (single asset or an N x N
//! grid), then specialised by [`GenerationType`]. Rendering is a single pass
//! over the template, so user text containing braces is never re-expanded.

pub mod templates;

use crate::error::{GridError, Result};
use crate::models::{AspectRatio, GenerationRequest, GenerationType, GridSize, Resolution};
use std::collections::BTreeMap;

pub const DEFAULT_SUBJECT: &str = "icon";
pub const DEFAULT_STYLE: &str = "game asset style";
pub const DEFAULT_BACKGROUND: &str = "WHITE";
pub const DEFAULT_POSE: &str = "standing, three-quarter view";

/// Inputs to [`build_prompt`].
#[derive(Debug, Clone, Default)]
pub struct PromptParams {
    pub user_prompt: String,
    pub style: String,
    pub subject: String,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub grid_size: GridSize,
    pub has_reference_image: bool,
    pub generation_type: GenerationType,
    /// Recognised keys: `pose`, `background`.
    pub extra_options: BTreeMap<String, String>,
}

impl PromptParams {
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            user_prompt: request.prompt_text.clone(),
            style: request.style.clone(),
            subject: request.subject.clone(),
            resolution: request.resolution,
            aspect_ratio: request.aspect_ratio,
            grid_size: request.grid_size,
            has_reference_image: request.reference_image.is_some(),
            generation_type: request.generation_type,
            extra_options: request.extra_options.clone(),
        }
    }

    fn option_or(&self, key: &str, default: &str) -> String {
        non_blank(self.extra_options.get(key).map(String::as_str))
            .unwrap_or(default)
            .to_string()
    }

    /// `WxH`, with the ratio appended when the output is not square.
    fn output_size(&self) -> String {
        let (width, height) = self.aspect_ratio.dimensions(self.resolution.pixels());
        if self.aspect_ratio.is_square() {
            format!("{}x{}", width, height)
        } else {
            format!("{}x{} ({})", width, height, self.aspect_ratio)
        }
    }

    fn placeholders(&self) -> BTreeMap<&'static str, String> {
        let grid = self.grid_size.value();
        let mut map = BTreeMap::new();
        map.insert(
            "SUBJECT",
            non_blank(Some(self.subject.as_str()))
                .unwrap_or(DEFAULT_SUBJECT)
                .to_string(),
        );
        map.insert(
            "STYLE",
            non_blank(Some(self.style.as_str())).unwrap_or(DEFAULT_STYLE).to_string(),
        );
        map.insert("USER_PROMPT", self.user_prompt.trim().to_string());
        map.insert("RESOLUTION", self.resolution.pixels().to_string());
        map.insert("OUTPUT_SIZE", self.output_size());
        map.insert("GRID_SIZE", grid.to_string());
        map.insert("ICON_COUNT", (grid * grid).to_string());
        map.insert("POSE_TYPE", self.option_or("pose", DEFAULT_POSE));
        map.insert("BACKGROUND", self.option_or("background", DEFAULT_BACKGROUND));
        map
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Renders the final prompt text for one generation call.
pub fn build_prompt(params: &PromptParams) -> Result<String> {
    let values = params.placeholders();
    if params.grid_size.is_grid() {
        render_template(templates::grid_template(params.has_reference_image), &values)
    } else {
        let template = templates::single_template(params.generation_type, params.has_reference_image);
        render_template(&template, &values)
    }
}

/// Text-mode N x N icon grid prompt.
pub fn build_grid_prompt(
    user_prompt: &str,
    style: &str,
    subject: &str,
    resolution: Resolution,
    grid_size: GridSize,
) -> Result<String> {
    build_prompt(&PromptParams {
        user_prompt: user_prompt.to_string(),
        style: style.to_string(),
        subject: subject.to_string(),
        resolution,
        grid_size,
        ..Default::default()
    })
}

/// Style-transfer N x N icon grid prompt; the reference image supplies the style.
pub fn build_style_grid_prompt(
    user_prompt: &str,
    subject: &str,
    resolution: Resolution,
    grid_size: GridSize,
) -> Result<String> {
    build_prompt(&PromptParams {
        user_prompt: user_prompt.to_string(),
        subject: subject.to_string(),
        resolution,
        grid_size,
        has_reference_image: true,
        ..Default::default()
    })
}

/// Replaces every `{KEY}` in `template` with its value from `values`.
///
/// A brace group that looks like a placeholder (upper-case ASCII, digits and
/// underscores) but has no value is an error. Anything else between braces is
/// copied through as literal text.
pub fn render_template(template: &str, values: &BTreeMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_placeholder_name(&after[..close]) => {
                let name = &after[..close];
                let value = values.get(name).ok_or_else(|| {
                    GridError::PromptError(format!("unresolved placeholder {{{}}}", name))
                })?;
                out.push_str(value);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_braces(prompt: &str) -> bool {
        !prompt.contains('{') && !prompt.contains('}')
    }

    #[test]
    fn grid_prompt_is_deterministic_and_fully_resolved() {
        let first =
            build_grid_prompt("a sword", "pixel art", "icon", Resolution::Res1024, GridSize::Three)
                .unwrap();
        let second =
            build_grid_prompt("a sword", "pixel art", "icon", Resolution::Res1024, GridSize::Three)
                .unwrap();

        assert_eq!(first, second);
        assert!(first.contains("3x3"));
        assert!(first.contains("9 game icons"));
        assert!(first.contains("pixel art"));
        assert!(first.contains("a sword"));
        assert!(first.contains("1024x1024"));
        assert!(no_braces(&first));
    }

    #[test]
    fn wide_request_describes_a_wide_output() {
        let request = GenerationRequest::new("castle gates")
            .with_grid_size(GridSize::Three)
            .with_aspect_ratio(AspectRatio::new(16, 9).unwrap());
        let prompt = build_prompt(&PromptParams::from_request(&request)).unwrap();
        assert!(prompt.contains("1024x576 (16:9)"));
        assert!(!prompt.contains("1024x1024"));
        assert!(no_braces(&prompt));

        let single = build_prompt(&PromptParams {
            user_prompt: "a tower".into(),
            aspect_ratio: AspectRatio::new(9, 16).unwrap(),
            generation_type: GenerationType::Scene,
            ..Default::default()
        })
        .unwrap();
        assert!(single.contains("576x1024 (9:16)"));
        assert!(!single.contains("1024x1024"));
    }

    #[test]
    fn grid_prompt_leaves_out_decoration_rules() {
        for reference in [false, true] {
            let template = templates::grid_template(reference);
            assert!(!template.contains("Do not draw"));
            assert!(!template.contains("{RESOLUTION}x{RESOLUTION}"));
        }
    }

    #[test]
    fn five_by_five_grid_counts_twenty_five_icons() {
        let prompt =
            build_grid_prompt("potions", "watercolor", "icon", Resolution::Res2048, GridSize::Five)
                .unwrap();
        assert!(prompt.contains("5x5"));
        assert!(prompt.contains("25 game icons"));
        assert!(prompt.contains("5 rows x 5 columns"));
    }

    #[test]
    fn single_layout_never_uses_grid_phrasing() {
        for ty in GenerationType::ALL {
            for reference in [false, true] {
                let prompt = build_prompt(&PromptParams {
                    user_prompt: "a treasure chest".into(),
                    style: "pixel art".into(),
                    subject: "icon".into(),
                    grid_size: GridSize::One,
                    generation_type: ty,
                    has_reference_image: reference,
                    ..Default::default()
                })
                .unwrap();
                assert!(
                    prompt.contains("should be centered in the image"),
                    "{ty:?} single prompt lost its centering rule"
                );
                assert!(!prompt.to_lowercase().contains("arrange exactly"));
                assert!(no_braces(&prompt));
            }
        }
    }

    #[test]
    fn grid_layout_never_uses_single_phrasing() {
        let prompt =
            build_grid_prompt("gems", "flat", "icon", Resolution::Res1024, GridSize::Three).unwrap();
        assert!(prompt.to_lowercase().contains("arrange exactly"));
        assert!(!prompt.contains("should be centered in the image"));
    }

    #[test]
    fn empty_subject_defaults_to_icon() {
        let prompt =
            build_grid_prompt("shields", "", "  ", Resolution::Res1024, GridSize::Three).unwrap();
        assert!(prompt.contains("9 game icons"));
        assert!(prompt.contains(DEFAULT_STYLE));
    }

    #[test]
    fn style_transfer_demands_precise_match() {
        let prompt =
            build_style_grid_prompt("magic scrolls", "icon", Resolution::Res1024, GridSize::Three)
                .unwrap();
        assert!(prompt.contains(
            "Match the art style, color palette, line work, and level of detail from the reference image PRECISELY"
        ));
        assert!(prompt.contains("EXACT visual style of the reference image"));
        assert!(!prompt.contains("inspired by"));
        assert!(no_braces(&prompt));
    }

    #[test]
    fn character_prompt_uses_pose_and_background_options() {
        let mut extra = BTreeMap::new();
        extra.insert("pose".to_string(), "running".to_string());
        extra.insert("background".to_string(), "light gray".to_string());
        let prompt = build_prompt(&PromptParams {
            user_prompt: "a knight".into(),
            generation_type: GenerationType::Character,
            extra_options: extra,
            ..Default::default()
        })
        .unwrap();
        assert!(prompt.contains("Pose: running"));
        assert!(prompt.contains("plain light gray background"));

        let defaulted = build_prompt(&PromptParams {
            user_prompt: "a knight".into(),
            generation_type: GenerationType::Character,
            ..Default::default()
        })
        .unwrap();
        assert!(defaulted.contains(DEFAULT_POSE));
        assert!(defaulted.contains("plain WHITE background"));
    }

    #[test]
    fn user_text_with_braces_is_not_expanded() {
        let prompt =
            build_grid_prompt("{STYLE} {weird}", "ink", "icon", Resolution::Res1024, GridSize::Three)
                .unwrap();
        assert!(prompt.contains("theme: {STYLE} {weird}"));
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let values = BTreeMap::from([("SUBJECT", "icon".to_string())]);
        let err = render_template("a {SUBJECT} in {STYLE}", &values).unwrap_err();
        assert_eq!(
            err,
            GridError::PromptError("unresolved placeholder {STYLE}".into())
        );
    }

    #[test]
    fn non_placeholder_braces_pass_through() {
        let values = BTreeMap::from([("A", "x".to_string())]);
        assert_eq!(
            render_template("{A} {lower} {} {A", &values).unwrap(),
            "x {lower} {} {A"
        );
    }

    #[test]
    fn every_template_resolves_with_the_standard_placeholder_set() {
        let values = PromptParams::default().placeholders();
        for reference in [false, true] {
            assert!(render_template(templates::grid_template(reference), &values).is_ok());
            for ty in GenerationType::ALL {
                let template = templates::single_template(ty, reference);
                let rendered = render_template(&template, &values).unwrap();
                assert!(no_braces(&rendered), "{ty:?} left braces behind");
            }
        }
    }
}
