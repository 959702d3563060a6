use std::ffi::OsString;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

use leadsheet_domain::{AttemptStatus, InferenceOptions, ToolConfig};

use crate::tool::{InferenceRequest, InferenceTool};

/// Runs `python -m sheetsage.infer` as a blocking child process.
///
/// Stdio is inherited so the tool's own progress output reaches the console.
#[derive(Debug, Clone)]
pub struct SheetSageCommand {
    python: String,
    module: String,
}

impl SheetSageCommand {
    pub fn new(python: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            module: module.into(),
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(config.python.clone(), config.module.clone())
    }

    /// Arguments after the interpreter, `-m <module>` first and the audio last.
    pub fn args(&self, request: &InferenceRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            self.module.clone().into(),
            "--output_dir".into(),
            request.output_dir.as_os_str().to_owned(),
        ];
        args.extend(option_args(request.options).into_iter().map(OsString::from));
        args.push(request.audio.into());
        args
    }
}

impl Default for SheetSageCommand {
    fn default() -> Self {
        Self::from_config(&ToolConfig::default())
    }
}

impl InferenceTool for SheetSageCommand {
    fn run(&self, request: &InferenceRequest<'_>) -> Result<AttemptStatus> {
        let args = self.args(request);
        debug!(python = %self.python, ?args, "spawning inference tool");
        let status = Command::new(&self.python)
            .args(&args)
            .status()
            .with_context(|| format!("run {} -m {}", self.python, self.module))?;
        info!(%status, "inference tool exited");
        if status.success() {
            Ok(AttemptStatus::Succeeded)
        } else {
            Ok(AttemptStatus::Failed {
                code: status.code(),
            })
        }
    }
}

fn option_args(options: &InferenceOptions) -> Vec<String> {
    let mut args = Vec::new();
    let mut push = |flag: &str, value: Option<String>| {
        if let Some(value) = value {
            args.push(format!("--{flag}"));
            args.push(value);
        }
    };
    push("segment_start_hint", options.segment_start_hint.map(|v| v.to_string()));
    push("segment_end_hint", options.segment_end_hint.map(|v| v.to_string()));
    push("title", options.title.clone());
    push("artist", options.artist.clone());
    push("measures_per_chunk", options.measures_per_chunk.map(|v| v.to_string()));
    push("beats_per_measure", options.beats_per_measure.map(|v| v.to_string()));
    push(
        "beats_per_minute_hint",
        options.beats_per_minute_hint.map(|v| v.to_string()),
    );
    push("melody_threshold", options.melody_threshold.map(|v| v.to_string()));
    push("harmony_threshold", options.harmony_threshold.map(|v| v.to_string()));

    let switches = [
        ("use_jukebox", options.use_jukebox),
        ("segment_hints_are_downbeats", options.segment_hints_are_downbeats),
        ("skip_melody", options.skip_melody),
        ("skip_harmony", options.skip_harmony),
        ("legacy_behavior", options.legacy_behavior),
    ];
    for (flag, enabled) in switches {
        if enabled {
            args.push(format!("--{flag}"));
        }
    }
    args
}
