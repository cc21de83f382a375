//! Style x asset exploration batches.
//!
//! Every cell is one style-transfer generation: the column's asset image is
//! the reference and the row's style prompt is folded into the text. Cells
//! fail independently; a failed cell never stops the batch.

pub mod presets;
pub mod repository;

use crate::{
    error::{GridError, Result},
    gemini::ImageGenerator,
    models::{
        AssetRef, CellPayload, GenerationRequest, GenerationType, MatrixCell, MatrixJob,
        MatrixProgress, MatrixResult, ReferenceImage, Resolution, StyleDescriptor,
    },
};
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

pub use presets::{preset_styles, resolve_styles, style_by_id};
pub use repository::{AssetRepository, InMemoryAssetRepository};

pub const DEFAULT_MAX_CONCURRENT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixOptions {
    pub concurrent: bool,
    pub max_concurrent: usize,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            concurrent: false,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl MatrixOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequential() -> Self {
        Self::default()
    }

    /// Concurrent mode with at most `max_concurrent` cells in flight
    /// (clamped to at least 1).
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.concurrent = true;
        self.max_concurrent = max_concurrent.max(1);
        self
    }
}

/// Cooperative stop signal. Cells that have not started yet are skipped;
/// cells already in flight run to completion. A signal raised before a
/// batch starts skips the whole batch. The flag clears when the batch ends.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Callbacks fired as cells land. All of them run on the task that called
/// [`MatrixGenerator::generate`], one at a time.
pub trait MatrixObserver {
    fn on_progress(&mut self, _progress: MatrixProgress) {}
    fn on_cell_complete(&mut self, _row: usize, _col: usize, _payload: &CellPayload) {}
    fn on_cell_error(&mut self, _row: usize, _col: usize, _error: &GridError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatrixObserver for NoopObserver {}

/// `"{type fragment}, {style prompt}[, {custom}]"`
pub fn build_cell_prompt(
    generation_type: GenerationType,
    style_prompt: &str,
    custom_prompt: Option<&str>,
) -> String {
    let mut parts = vec![generation_type.prompt_fragment(), style_prompt];
    if let Some(custom) = custom_prompt.map(str::trim).filter(|c| !c.is_empty()) {
        parts.push(custom);
    }
    parts.join(", ")
}

fn cell_request(job: &MatrixJob, style: &StyleDescriptor, asset: &AssetRef) -> GenerationRequest {
    let prompt = build_cell_prompt(job.generation_type, &style.prompt, job.custom_prompt.as_deref());
    GenerationRequest::new(prompt)
        .with_style(style.prompt.clone())
        .with_subject(job.generation_type.key())
        .with_resolution(job.resolution)
        .with_grid_size(job.generation_type.default_grid_size())
        .with_generation_type(job.generation_type)
        .with_reference_image(ReferenceImage::new(
            asset.image_base64.clone(),
            asset.mime_type.clone(),
        ))
}

struct CellOutcome {
    row: usize,
    col: usize,
    prompt: String,
    outcome: Result<String>,
}

pub struct MatrixGenerator<G: ImageGenerator + 'static> {
    generator: Arc<G>,
    options: MatrixOptions,
    abort: AbortHandle,
}

impl<G: ImageGenerator + 'static> MatrixGenerator<G> {
    pub fn new(generator: Arc<G>, options: MatrixOptions) -> Self {
        Self {
            generator,
            options,
            abort: AbortHandle::default(),
        }
    }

    pub fn options(&self) -> MatrixOptions {
        self.options
    }

    /// Handle for stopping the batch from another task or from an observer.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Runs every style x asset cell and returns the filled matrix.
    ///
    /// Only an empty asset list is an error; individual cell failures are
    /// recorded in the result.
    pub async fn generate<O: MatrixObserver + ?Sized>(
        &self,
        job: MatrixJob,
        observer: &mut O,
    ) -> Result<MatrixResult> {
        if job.assets.is_empty() {
            return Err(GridError::ConfigError("no valid assets were provided".into()));
        }

        let total = job.cell_count();
        log::info!(
            "🧩 Starting {} matrix: {} styles x {} assets ({} cells, {})",
            job.generation_type.key(),
            job.styles.len(),
            job.assets.len(),
            total,
            if self.options.concurrent {
                format!("up to {} concurrent", self.options.max_concurrent)
            } else {
                "sequential".to_string()
            }
        );

        let mut collector = Collector::new(&job, observer);
        if self.options.concurrent {
            self.run_concurrent(&job, &mut collector).await;
        } else {
            self.run_sequential(&job, &mut collector).await;
        }

        let result = collector.finish(&job);
        self.abort.reset();
        log::info!(
            "✅ Matrix finished: {} succeeded, {} failed, {} skipped",
            result.success_count(),
            result.failure_count(),
            result.skipped_count()
        );
        Ok(result)
    }

    /// Resolves asset and style ids, then runs [`generate`](Self::generate).
    #[allow(clippy::too_many_arguments)]
    pub async fn generate_from_ids<R, O>(
        &self,
        repository: &R,
        asset_ids: &[String],
        style_ids: &[String],
        generation_type: GenerationType,
        custom_prompt: Option<String>,
        resolution: Resolution,
        observer: &mut O,
    ) -> Result<MatrixResult>
    where
        R: AssetRepository + ?Sized,
        O: MatrixObserver + ?Sized,
    {
        let assets = repository.get_assets_by_ids(asset_ids).await?;
        if assets.is_empty() {
            return Err(GridError::ConfigError(
                "none of the requested assets could be found".into(),
            ));
        }

        let mut job = MatrixJob::new(assets, resolve_styles(style_ids))
            .with_generation_type(generation_type)
            .with_resolution(resolution);
        job.custom_prompt = custom_prompt;

        self.generate(job, observer).await
    }

    async fn run_sequential<O: MatrixObserver + ?Sized>(
        &self,
        job: &MatrixJob,
        collector: &mut Collector<'_, O>,
    ) {
        for (row, style) in job.styles.iter().enumerate() {
            for (col, asset) in job.assets.iter().enumerate() {
                if self.abort.is_aborted() {
                    log::warn!("Matrix aborted before cell ({}, {})", row, col);
                    return;
                }
                let request = cell_request(job, style, asset);
                let outcome = self
                    .generator
                    .generate(&request)
                    .await
                    .map(|result| result.image_base64);
                collector.record(CellOutcome {
                    row,
                    col,
                    prompt: request.prompt_text,
                    outcome,
                });
            }
        }
    }

    async fn run_concurrent<O: MatrixObserver + ?Sized>(
        &self,
        job: &MatrixJob,
        collector: &mut Collector<'_, O>,
    ) {
        let (tx, mut rx) = mpsc::unbounded_channel::<CellOutcome>();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent.max(1)));

        let mut requests = Vec::with_capacity(job.cell_count());
        for (row, style) in job.styles.iter().enumerate() {
            for (col, asset) in job.assets.iter().enumerate() {
                requests.push((row, col, cell_request(job, style, asset)));
            }
        }

        let generator = Arc::clone(&self.generator);
        let abort = self.abort.clone();
        let scheduler = tokio::spawn(async move {
            for (row, col, request) in requests {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        log::error!("Semaphore error: {}", e);
                        break;
                    }
                };
                if abort.is_aborted() {
                    log::warn!("Matrix aborted before cell ({}, {})", row, col);
                    break;
                }

                let generator = Arc::clone(&generator);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let prompt = request.prompt_text.clone();
                    // A panic inside the generator must still land as a failed cell.
                    let generation = tokio::spawn(async move {
                        generator
                            .generate(&request)
                            .await
                            .map(|result| result.image_base64)
                    });
                    let outcome = match generation.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(GridError::RequestError(format!("cell task failed: {}", e))),
                    };
                    drop(permit);
                    let _ = tx.send(CellOutcome {
                        row,
                        col,
                        prompt,
                        outcome,
                    });
                });
            }
        });

        // The channel closes once the scheduler and every cell task are done.
        while let Some(outcome) = rx.recv().await {
            collector.record(outcome);
        }
        if let Err(e) = scheduler.await {
            log::error!("Matrix scheduler stopped unexpectedly: {}", e);
        }
    }
}

/// Sole writer of the result matrix and sole caller of the observer.
struct Collector<'a, O: MatrixObserver + ?Sized> {
    observer: &'a mut O,
    cells: Vec<Vec<Option<MatrixCell>>>,
    completed: usize,
    total: usize,
    generation_type: GenerationType,
    asset_ids: Vec<String>,
    style_ids: Vec<String>,
}

impl<'a, O: MatrixObserver + ?Sized> Collector<'a, O> {
    fn new(job: &MatrixJob, observer: &'a mut O) -> Self {
        Self {
            observer,
            cells: vec![vec![None; job.assets.len()]; job.styles.len()],
            completed: 0,
            total: job.cell_count(),
            generation_type: job.generation_type,
            asset_ids: job.assets.iter().map(|a| a.id.clone()).collect(),
            style_ids: job.styles.iter().map(|s| s.id.clone()).collect(),
        }
    }

    fn record(&mut self, cell: CellOutcome) {
        let CellOutcome {
            row,
            col,
            prompt,
            outcome,
        } = cell;

        let entry = match outcome {
            Ok(image_base64) => {
                let payload = CellPayload {
                    id: Uuid::new_v4(),
                    image_base64,
                    prompt,
                    asset_id: self.asset_ids[col].clone(),
                    style_id: self.style_ids[row].clone(),
                    generation_type: self.generation_type,
                    created_at: Utc::now(),
                };
                log::debug!("Cell ({}, {}) succeeded", row, col);
                self.observer.on_cell_complete(row, col, &payload);
                MatrixCell::Succeeded(payload)
            }
            Err(error) => {
                log::warn!("Cell ({}, {}) failed: {}", row, col, error);
                self.observer.on_cell_error(row, col, &error);
                MatrixCell::Failed(error)
            }
        };
        self.cells[row][col] = Some(entry);

        self.completed += 1;
        self.observer
            .on_progress(MatrixProgress::new(self.completed, self.total));
    }

    fn finish(self, job: &MatrixJob) -> MatrixResult {
        MatrixResult {
            asset_ids: self.asset_ids,
            style_ids: self.style_ids,
            generation_type: job.generation_type,
            cells: self
                .cells
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| cell.unwrap_or(MatrixCell::Skipped))
                        .collect()
                })
                .collect(),
        }
    }
}
