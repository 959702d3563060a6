use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tempfile::TempDir;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use leadsheet_domain::{
    AttemptRecord, AttemptStatus, InferenceOptions, InferenceOutcome, RunConfig, RunReport,
};

use crate::collect::collect_outputs;
use crate::tool::{InferenceRequest, InferenceTool};

const SCRATCH_PREFIX: &str = "leadsheet-";

/// Runs the inference tool into a scratch directory, retries once with a
/// `measures_per_chunk` override, then copies whatever was written into the target directory.
///
/// Inference failure is not an error: it is recorded in the report's
/// `outcome` and the copy still happens. Filesystem failures are errors. The
/// scratch directory is removed on every path.
pub struct ExtractionPipeline<T> {
    tool: T,
}

impl<T: InferenceTool> ExtractionPipeline<T> {
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    #[instrument(skip(self, config), fields(audio = %config.audio))]
    pub fn run(&self, config: &RunConfig) -> Result<RunReport> {
        config.validate()?;
        let target_dir = config.target_dir()?;
        let started_at = OffsetDateTime::now_utc();

        let scratch = create_scratch(config.scratch_root.as_deref())?;
        let scratch_dir = scratch.path().to_path_buf();
        debug!(scratch = %scratch_dir.display(), "created scratch directory");

        let mut attempts = vec![self.attempt(1, &scratch_dir, &config.audio, &config.inference)];
        if !attempts[0].status.is_success() {
            if let Some(measures) = config.retry_measures_per_chunk {
                info!(measures_per_chunk = measures, "retrying with measures_per_chunk override");
                let retry = config.inference.with_measures_per_chunk(measures);
                attempts.push(self.attempt(2, &scratch_dir, &config.audio, &retry));
            }
        }
        let outcome = InferenceOutcome::from_attempts(&attempts);
        if !outcome.is_success() {
            warn!(
                attempts = attempts.len(),
                "inference failed, copying whatever output exists"
            );
        }

        let collected = collect_outputs(&scratch_dir, &target_dir);
        let cleanup = scratch
            .close()
            .with_context(|| format!("remove scratch directory {}", scratch_dir.display()));
        let copied = match (collected, cleanup) {
            (Ok(copied), Ok(())) => copied,
            (Ok(_), Err(err)) => return Err(err),
            (Err(err), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    warn!(error = %cleanup_err, "scratch cleanup also failed");
                }
                return Err(err);
            }
        };
        info!(
            dir = %target_dir.display(),
            files = copied.len(),
            "leadsheet extraction finished"
        );

        Ok(RunReport {
            audio: config.audio.clone(),
            target_dir,
            scratch_dir,
            started_at,
            attempts,
            outcome,
            copied,
        })
    }

    fn attempt(
        &self,
        attempt: u8,
        output_dir: &Path,
        audio: &str,
        options: &InferenceOptions,
    ) -> AttemptRecord {
        let request = InferenceRequest {
            output_dir,
            audio,
            options,
        };
        let started = Instant::now();
        let status = self.tool.run(&request).unwrap_or_else(|err| {
            let message = format!("{err:#}");
            warn!(attempt, error = %message, "inference tool could not be run");
            AttemptStatus::Failed { code: None }
        });
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match status {
            AttemptStatus::Succeeded => info!(attempt, elapsed_ms, "inference succeeded"),
            AttemptStatus::Failed { code } => {
                warn!(attempt, elapsed_ms, ?code, "inference failed")
            }
        }
        AttemptRecord {
            attempt,
            measures_per_chunk: options.measures_per_chunk,
            status,
            elapsed_ms,
        }
    }
}

fn create_scratch(root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    match root {
        Some(root) => builder
            .tempdir_in(root)
            .with_context(|| format!("create scratch directory in {}", root.display())),
        None => builder.tempdir().context("create scratch directory"),
    }
}
