// batchpix/src/processors/batch.rs
use crate::core::processor::ImageProcessor;
use crate::core::{BatchResult, OperationRequest, ProcessError, Progress, Result};
use crate::utils::is_supported_input;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

/// Applies one operation request to every supported image directly inside
/// an input directory. Strictly synchronous: one file is fully decoded,
/// transformed, encoded and recorded before the next begins.
pub struct BatchPipeline {
    processor: ImageProcessor,
}

impl BatchPipeline {
    pub fn new(request: OperationRequest) -> Result<Self> {
        Ok(Self {
            processor: ImageProcessor::new(request)?,
        })
    }

    /// Process without progress reporting or cancellation.
    pub fn process(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchResult> {
        self.process_with(input_dir, output_dir, |_| {}, &AtomicBool::new(false))
    }

    /// Full contract: `on_progress` fires after each file completes either
    /// way, and `cancel` is checked before each new file is started. A file
    /// already in flight always runs to completion.
    pub fn process_with<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        mut on_progress: F,
        cancel: &AtomicBool,
    ) -> Result<BatchResult>
    where
        F: FnMut(&Progress),
    {
        self.validate_paths(input_dir, output_dir)?;

        // batch-fatal: nothing could possibly be written otherwise
        std::fs::create_dir_all(output_dir)?;

        let files = self.collect_image_files(input_dir);
        let total = files.len();
        if total == 0 {
            log::warn!("no supported image files in {}", input_dir.display());
        } else {
            log::info!(
                "processing {} files from {}",
                total,
                input_dir.display()
            );
        }

        let mut result = BatchResult::default();
        for (i, path) in files.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                log::info!("cancelled after {} of {} files", i, total);
                break;
            }

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            log::info!("processing {filename}");

            match self.processor.process_file(path, output_dir) {
                Ok(written) => {
                    log::debug!("wrote {}", written.display());
                    result.successes.push(filename.clone());
                }
                Err(err) => {
                    log::error!("failed to process {filename}: {err}");
                    result.failures.push((filename.clone(), err.to_string()));
                }
            }

            on_progress(&Progress {
                index: i + 1,
                total,
                filename,
            });
        }

        Ok(result)
    }

    // Direct children only, sorted by name so failure attribution and
    // same-name collisions (last write wins) are deterministic.
    fn collect_image_files(&self, input_dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(input_dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_supported_input(path))
            .collect()
    }

    fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if !input_dir.exists() {
            return Err(ProcessError::InvalidParameter(format!(
                "input directory does not exist: {}",
                input_dir.display()
            )));
        }
        if !input_dir.is_dir() {
            return Err(ProcessError::InvalidParameter(format!(
                "input path is not a directory: {}",
                input_dir.display()
            )));
        }
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ProcessError::InvalidParameter(format!(
                "output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }
        if input_dir == output_dir {
            return Err(ProcessError::InvalidParameter(
                "input and output directories cannot be the same".to_string(),
            ));
        }
        Ok(())
    }
}
