//! Frozen template text. The wording is the only signal steering the model,
//! so edits here change generation behaviour.

use crate::models::GenerationType;

pub const GRID_TEXT_TEMPLATE: &str = "Create a single image containing a {GRID_SIZE}x{GRID_SIZE} grid of {ICON_COUNT} game {SUBJECT}s.

Requirements:
- The image should have a pure {BACKGROUND} background
- Arrange exactly {ICON_COUNT} {SUBJECT}s in a {GRID_SIZE} rows x {GRID_SIZE} columns grid layout
- Each {SUBJECT} should be centered in its grid cell with equal spacing
- Leave safe margins around each {SUBJECT} (about 10% padding)
- All {ICON_COUNT} {SUBJECT}s should follow the same visual style: {STYLE}
- Each {SUBJECT} should be a variation of the theme: {USER_PROMPT}
- The {SUBJECT}s should be distinct but cohesive in style
- Make sure all {SUBJECT}s are properly aligned and evenly spaced

Output a single image at {OUTPUT_SIZE} resolution with this {GRID_SIZE}x{GRID_SIZE} grid.";

pub const GRID_STYLE_TEMPLATE: &str = "Create a single image containing a {GRID_SIZE}x{GRID_SIZE} grid of {ICON_COUNT} game {SUBJECT}s, matching the EXACT visual style of the reference image.

Requirements:
- The image should have a pure {BACKGROUND} background
- Arrange exactly {ICON_COUNT} {SUBJECT}s in a {GRID_SIZE} rows x {GRID_SIZE} columns grid layout
- Each {SUBJECT} should be centered in its grid cell with equal spacing
- Leave safe margins around each {SUBJECT} (about 10% padding)
- Match the art style, color palette, line work, and level of detail from the reference image PRECISELY
- Each {SUBJECT} should be a variation of the theme: {USER_PROMPT}
- The {SUBJECT}s should be distinct but cohesive in style
- Make sure all {SUBJECT}s are properly aligned and evenly spaced

Output a single image at {OUTPUT_SIZE} resolution with this {GRID_SIZE}x{GRID_SIZE} grid.";

const STYLE_TRANSFER_OPENING_SUFFIX: &str = ", matching the EXACT visual style of the reference image";
const STYLE_TEXT_LINE: &str = "- Visual style: {STYLE}";
const STYLE_TRANSFER_LINE: &str =
    "- Match the art style, color palette, line work, and level of detail from the reference image PRECISELY";

fn single_opening(generation_type: GenerationType) -> &'static str {
    match generation_type {
        GenerationType::Icon => "Create a single game {SUBJECT}",
        GenerationType::Character => "Create a single game character portrait",
        GenerationType::Scene => "Create a single game scene for use as background art",
        GenerationType::UiTemplate => "Create a single game UI template",
        GenerationType::ColorPalette => "Create a single game color palette",
    }
}

fn single_requirements(generation_type: GenerationType) -> &'static [&'static str] {
    match generation_type {
        GenerationType::Icon => &[
            "- The image should have a pure {BACKGROUND} background",
            "- The {SUBJECT} should be centered in the image",
            "- Leave safe margins around the {SUBJECT} (about 10% padding)",
            "- Use clean, readable shapes that stay legible at small sizes",
        ],
        GenerationType::Character => &[
            "- Pose: {POSE_TYPE}",
            "- The character should be centered in the image, shown half body or full body",
            "- Use a plain {BACKGROUND} background so the character can be cut out cleanly",
            "- Keep the whole silhouette inside the frame with safe margins",
        ],
        GenerationType::Scene => &[
            "- The scene should fill the entire frame edge to edge",
            "- The main focal point should be centered in the image",
            "- Leave out borders, text, and interface elements",
        ],
        GenerationType::UiTemplate => &[
            "- Show buttons, panels, and frames as one coherent interface kit",
            "- The layout should be centered in the image on a {BACKGROUND} background",
            "- Keep every element evenly spaced and aligned",
        ],
        GenerationType::ColorPalette => &[
            "- Show 5-7 harmonious color swatches displayed in a single row",
            "- The palette should be centered in the image on a {BACKGROUND} background",
            "- Each swatch should be a flat, solid block of color of equal size",
        ],
    }
}

/// Assembles the single-asset template for one generation type and content
/// mode. The result still contains placeholders.
pub fn single_template(generation_type: GenerationType, style_transfer: bool) -> String {
    let mut lines: Vec<String> = Vec::new();

    let mut opening = single_opening(generation_type).to_string();
    if style_transfer {
        opening.push_str(STYLE_TRANSFER_OPENING_SUFFIX);
    }
    opening.push('.');
    lines.push(opening);
    lines.push(String::new());
    lines.push("Requirements:".to_string());
    lines.extend(single_requirements(generation_type).iter().map(|l| l.to_string()));
    lines.push(if style_transfer {
        STYLE_TRANSFER_LINE.to_string()
    } else {
        STYLE_TEXT_LINE.to_string()
    });
    lines.push("- Theme: {USER_PROMPT}".to_string());
    lines.push(String::new());
    lines.push("Output a single image at {OUTPUT_SIZE} resolution.".to_string());

    lines.join("\n")
}

pub fn grid_template(style_transfer: bool) -> &'static str {
    if style_transfer {
        GRID_STYLE_TEMPLATE
    } else {
        GRID_TEXT_TEMPLATE
    }
}
