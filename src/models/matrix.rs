use crate::error::GridError;
use crate::models::request::{GenerationType, Resolution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored asset used as the style-transfer reference of one matrix column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: String,
    pub image_base64: String,
    #[serde(default = "default_mime")]
    pub mime_type: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

impl AssetRef {
    pub fn new(id: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_base64: image_base64.into(),
            mime_type: default_mime(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// A style row of the matrix; `prompt` is appended to the cell prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub id: String,
    pub name: String,
    pub prompt: String,
}

impl StyleDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prompt: prompt.into(),
        }
    }
}

/// Everything needed to run one style x asset exploration batch.
#[derive(Debug, Clone)]
pub struct MatrixJob {
    pub assets: Vec<AssetRef>,
    pub styles: Vec<StyleDescriptor>,
    pub generation_type: GenerationType,
    pub custom_prompt: Option<String>,
    pub resolution: Resolution,
}

impl MatrixJob {
    pub fn new(assets: Vec<AssetRef>, styles: Vec<StyleDescriptor>) -> Self {
        Self {
            assets,
            styles,
            generation_type: GenerationType::Icon,
            custom_prompt: None,
            resolution: Resolution::default(),
        }
    }

    pub fn with_generation_type(mut self, generation_type: GenerationType) -> Self {
        self.generation_type = generation_type;
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn cell_count(&self) -> usize {
        self.styles.len() * self.assets.len()
    }
}

/// A successfully generated cell.
#[derive(Debug, Clone, Serialize)]
pub struct CellPayload {
    pub id: Uuid,
    pub image_base64: String,
    pub prompt: String,
    pub asset_id: String,
    pub style_id: String,
    pub generation_type: GenerationType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum MatrixCell {
    Succeeded(CellPayload),
    Failed(GridError),
    /// Never started because the batch was aborted first.
    Skipped,
}

impl MatrixCell {
    pub fn is_success(&self) -> bool {
        matches!(self, MatrixCell::Succeeded(_))
    }

    pub fn payload(&self) -> Option<&CellPayload> {
        match self {
            MatrixCell::Succeeded(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GridError> {
        match self {
            MatrixCell::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl MatrixProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// `cells[row][col]`: rows are styles, columns are assets.
#[derive(Debug, Clone)]
pub struct MatrixResult {
    pub asset_ids: Vec<String>,
    pub style_ids: Vec<String>,
    pub generation_type: GenerationType,
    pub cells: Vec<Vec<MatrixCell>>,
}

impl MatrixResult {
    pub fn cell(&self, row: usize, col: usize) -> Option<&MatrixCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn success_count(&self) -> usize {
        self.iter_cells().filter(|c| c.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.iter_cells()
            .filter(|c| matches!(c, MatrixCell::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.iter_cells()
            .filter(|c| matches!(c, MatrixCell::Skipped))
            .count()
    }

    fn iter_cells(&self) -> impl Iterator<Item = &MatrixCell> {
        self.cells.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_is_rounded() {
        assert_eq!(MatrixProgress::new(1, 3).percent, 33);
        assert_eq!(MatrixProgress::new(2, 3).percent, 67);
        assert_eq!(MatrixProgress::new(4, 4).percent, 100);
        assert_eq!(MatrixProgress::new(0, 0).percent, 100);
    }

    #[test]
    fn result_counts_each_cell_state() {
        let result = MatrixResult {
            asset_ids: vec!["a".into(), "b".into()],
            style_ids: vec!["s".into()],
            generation_type: GenerationType::Icon,
            cells: vec![vec![
                MatrixCell::Failed(GridError::ServerError("down".into())),
                MatrixCell::Skipped,
            ]],
        };
        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert!(result.cell(0, 1).is_some());
        assert!(result.cell(1, 0).is_none());
    }
}
