use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Output resolution of the composite image (long side, in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Resolution {
    #[default]
    Res1024,
    Res2048,
    Res4096,
}

impl Resolution {
    pub fn pixels(&self) -> u32 {
        match self {
            Resolution::Res1024 => 1024,
            Resolution::Res2048 => 2048,
            Resolution::Res4096 => 4096,
        }
    }

    pub fn size_token(&self) -> &'static str {
        image_size_token(self.pixels())
    }
}

impl TryFrom<u32> for Resolution {
    type Error = GridError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1024 => Ok(Resolution::Res1024),
            2048 => Ok(Resolution::Res2048),
            4096 => Ok(Resolution::Res4096),
            other => Err(GridError::ConfigError(format!(
                "unsupported resolution {} (expected 1024, 2048 or 4096)",
                other
            ))),
        }
    }
}

impl From<Resolution> for u32 {
    fn from(value: Resolution) -> Self {
        value.pixels()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pixels())
    }
}

/// Maps a pixel resolution onto the coarse size token the API understands.
/// Unknown values fall back to `"1K"`.
pub fn image_size_token(resolution: u32) -> &'static str {
    match resolution {
        2048 => "2K",
        4096 => "4K",
        _ => "1K",
    }
}

/// N in an N x N layout. `One` means a single asset with no grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum GridSize {
    #[default]
    One,
    Three,
    Five,
}

impl GridSize {
    pub fn value(&self) -> u32 {
        match self {
            GridSize::One => 1,
            GridSize::Three => 3,
            GridSize::Five => 5,
        }
    }

    pub fn cell_count(&self) -> u32 {
        self.value() * self.value()
    }

    pub fn is_grid(&self) -> bool {
        *self != GridSize::One
    }
}

impl TryFrom<u32> for GridSize {
    type Error = GridError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(GridSize::One),
            3 => Ok(GridSize::Three),
            5 => Ok(GridSize::Five),
            other => Err(GridError::ConfigError(format!(
                "unsupported grid size {} (expected 1, 3 or 5)",
                other
            ))),
        }
    }
}

impl From<GridSize> for u32 {
    fn from(value: GridSize) -> Self {
        value.value()
    }
}

/// `W:H` aspect ratio of the requested composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1,
        height: 1,
    };

    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GridError::ConfigError(format!(
                "aspect ratio {}:{} must use positive integers",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Pixel dimensions with the longer side equal to `long_side`.
    pub fn dimensions(&self, long_side: u32) -> (u32, u32) {
        let scale = |short: u32, long: u32| {
            ((long_side as u64 * short as u64 + long as u64 / 2) / long as u64).max(1) as u32
        };
        if self.width >= self.height {
            (long_side, scale(self.height, self.width))
        } else {
            (scale(self.width, self.height), long_side)
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl FromStr for AspectRatio {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GridError::ConfigError(format!("invalid aspect ratio '{}' (expected W:H)", s));
        let (w, h) = s.trim().split_once(':').ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        AspectRatio::new(width, height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// What kind of asset is being generated. Each type carries its own prompt
/// fragment and default grid layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationType {
    #[default]
    Icon,
    Character,
    Scene,
    UiTemplate,
    ColorPalette,
}

impl GenerationType {
    pub const ALL: [GenerationType; 5] = [
        GenerationType::Icon,
        GenerationType::Character,
        GenerationType::Scene,
        GenerationType::UiTemplate,
        GenerationType::ColorPalette,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            GenerationType::Icon => "icon",
            GenerationType::Character => "character",
            GenerationType::Scene => "scene",
            GenerationType::UiTemplate => "uiTemplate",
            GenerationType::ColorPalette => "colorPalette",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GenerationType::Icon => "Icons",
            GenerationType::Character => "Character portrait",
            GenerationType::Scene => "Game scene",
            GenerationType::UiTemplate => "UI template",
            GenerationType::ColorPalette => "Color palette",
        }
    }

    pub fn default_grid_size(&self) -> GridSize {
        match self {
            GenerationType::Icon => GridSize::Three,
            _ => GridSize::One,
        }
    }

    pub fn prompt_fragment(&self) -> &'static str {
        match self {
            GenerationType::Icon => "game icons",
            GenerationType::Character => "character portrait, half body or full body",
            GenerationType::Scene => "game scene, background art",
            GenerationType::UiTemplate => "game UI template, interface design, buttons and panels",
            GenerationType::ColorPalette => {
                "color palette with 5-7 harmonious colors, swatches displayed in a row"
            }
        }
    }
}

impl FromStr for GenerationType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        GenerationType::ALL
            .iter()
            .copied()
            .find(|t| t.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| GridError::ConfigError(format!("unknown generation type '{}'", s)))
    }
}

/// A reference image for style transfer: base64 without any data-URI prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub data: String,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let data = data.into();
        Self {
            data: crate::imaging::strip_data_uri_prefix(&data).to_string(),
            mime_type: mime_type.into(),
        }
    }

    pub fn png(data: impl Into<String>) -> Self {
        Self::new(data, "image/png")
    }
}

/// One generation call's worth of parameters. Built fresh per call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub style: String,
    pub subject: String,
    pub resolution: Resolution,
    pub grid_size: GridSize,
    pub aspect_ratio: AspectRatio,
    pub reference_image: Option<ReferenceImage>,
    pub generation_type: GenerationType,
    pub extra_options: BTreeMap<String, String>,
}

impl GenerationRequest {
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            style: "game asset style".to_string(),
            subject: "icon".to_string(),
            resolution: Resolution::default(),
            grid_size: GridSize::Three,
            aspect_ratio: AspectRatio::default(),
            reference_image: None,
            generation_type: GenerationType::Icon,
            extra_options: BTreeMap::new(),
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_grid_size(mut self, grid_size: GridSize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    pub fn with_generation_type(mut self, generation_type: GenerationType) -> Self {
        self.generation_type = generation_type;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_options.insert(key.into(), value.into());
        self
    }
}

/// The single composite image returned by one generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub image_base64: String,
    pub model: String,
    pub prompt: String,
    pub resolution: Resolution,
    pub grid_size: GridSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_tokens_follow_resolution_with_1k_fallback() {
        assert_eq!(image_size_token(1024), "1K");
        assert_eq!(image_size_token(2048), "2K");
        assert_eq!(image_size_token(4096), "4K");
        assert_eq!(image_size_token(1500), "1K");
        assert_eq!(image_size_token(0), "1K");
        assert_eq!(Resolution::Res4096.size_token(), "4K");
    }

    #[test]
    fn grid_size_rejects_values_outside_the_allowed_set() {
        assert_eq!(GridSize::try_from(3).map(|g| g.cell_count()), Ok(9));
        assert_eq!(GridSize::try_from(5).map(|g| g.cell_count()), Ok(25));
        for bad in [0, 2, 4, 6, 9] {
            assert!(matches!(
                GridSize::try_from(bad),
                Err(GridError::ConfigError(_))
            ));
        }
    }

    #[test]
    fn resolution_rejects_unsupported_pixels() {
        assert_eq!(Resolution::try_from(2048), Ok(Resolution::Res2048));
        assert!(matches!(
            Resolution::try_from(1500),
            Err(GridError::ConfigError(_))
        ));
    }

    #[test]
    fn aspect_ratio_parses_and_validates() {
        let ratio: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(ratio, AspectRatio::new(16, 9).unwrap());
        assert!(!ratio.is_square());
        assert_eq!(ratio.to_string(), "16:9");
        assert!(AspectRatio::default().is_square());
        assert_eq!(ratio.dimensions(1024), (1024, 576));
        assert_eq!(AspectRatio::new(2, 3).unwrap().dimensions(1536), (1024, 1536));
        assert_eq!(AspectRatio::SQUARE.dimensions(2048), (2048, 2048));

        for bad in ["", "16", "16:", "a:b", "0:1", "16x9"] {
            assert!(bad.parse::<AspectRatio>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn generation_type_keys_round_trip_through_from_str() {
        for ty in GenerationType::ALL {
            assert_eq!(ty.key().parse::<GenerationType>(), Ok(ty));
        }
        assert_eq!("UITEMPLATE".parse::<GenerationType>(), Ok(GenerationType::UiTemplate));
        assert!("poster".parse::<GenerationType>().is_err());
    }

    #[test]
    fn only_icons_default_to_a_grid() {
        assert_eq!(GenerationType::Icon.default_grid_size(), GridSize::Three);
        assert_eq!(GenerationType::Scene.default_grid_size(), GridSize::One);
        assert_eq!(GenerationType::ColorPalette.default_grid_size(), GridSize::One);
    }

    #[test]
    fn reference_image_drops_data_uri_prefix() {
        let image = ReferenceImage::png("data:image/png;base64,QUJD");
        assert_eq!(image.data, "QUJD");
        assert_eq!(image.mime_type, "image/png");
    }
}
