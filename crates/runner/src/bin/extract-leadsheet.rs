use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, ValueEnum};
use leadsheet_domain::{ExportFormat, ReportExporter, RunConfig, SerdeExporter};
use leadsheet_runner::{ExtractionPipeline, InferenceTool, SheetSageCommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract a leadsheet from audio with sheetsage", long_about = None)]
struct Cli {
    /// Path or URL of the audio to transcribe
    audio: Option<String>,
    /// YAML run configuration; flags given here override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory that receives the leadsheet-<name> folder
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Leadsheet name, defaults to the audio file stem
    #[arg(long)]
    name: Option<String>,
    /// Where to create the scratch directory
    #[arg(long)]
    scratch_root: Option<PathBuf>,
    /// Python interpreter used to run the inference module
    #[arg(long)]
    python: Option<String>,
    #[arg(long)]
    module: Option<String>,
    /// Measures per chunk for the retry after a failed first attempt
    #[arg(long, conflicts_with = "no_retry")]
    retry_measures_per_chunk: Option<u8>,
    #[arg(long)]
    no_retry: bool,
    /// Exit with an error when inference failed after the retry
    #[arg(long)]
    strict: bool,
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    report_format: ReportFormat,
    /// Write the run report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
    #[command(flatten)]
    inference: InferenceArgs,
}

/// Flags passed through to sheetsage.
#[derive(Args, Debug, Default)]
struct InferenceArgs {
    #[arg(short = 's', long)]
    segment_start_hint: Option<f64>,
    #[arg(short = 'e', long)]
    segment_end_hint: Option<f64>,
    #[arg(short, long)]
    title: Option<String>,
    #[arg(short, long)]
    artist: Option<String>,
    #[arg(short = 'j', long)]
    use_jukebox: bool,
    #[arg(long)]
    measures_per_chunk: Option<u8>,
    #[arg(long)]
    segment_hints_are_downbeats: bool,
    #[arg(long)]
    beats_per_measure: Option<u8>,
    #[arg(long)]
    beats_per_minute_hint: Option<u32>,
    #[arg(long)]
    melody_threshold: Option<f32>,
    #[arg(long)]
    harmony_threshold: Option<f32>,
    #[arg(long)]
    skip_melody: bool,
    #[arg(long)]
    skip_harmony: bool,
    #[arg(long)]
    legacy_behavior: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReportFormat {
    Json,
    Yaml,
}

impl From<ReportFormat> for ExportFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => ExportFormat::Json,
            ReportFormat::Yaml => ExportFormat::Yaml,
        }
    }
}

impl Cli {
    fn resolve(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_yaml_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(audio) = &self.audio {
            config.audio = audio.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        if let Some(root) = &self.scratch_root {
            config.scratch_root = Some(root.clone());
        }
        if let Some(python) = &self.python {
            config.tool.python = python.clone();
        }
        if let Some(module) = &self.module {
            config.tool.module = module.clone();
        }
        if self.no_retry {
            config.retry_measures_per_chunk = None;
        } else if let Some(measures) = self.retry_measures_per_chunk {
            config.retry_measures_per_chunk = Some(measures);
        }
        self.inference.apply(&mut config);
        Ok(config)
    }
}

impl InferenceArgs {
    fn apply(&self, config: &mut RunConfig) {
        let options = &mut config.inference;
        overlay(&mut options.segment_start_hint, self.segment_start_hint);
        overlay(&mut options.segment_end_hint, self.segment_end_hint);
        overlay(&mut options.title, self.title.clone());
        overlay(&mut options.artist, self.artist.clone());
        overlay(&mut options.measures_per_chunk, self.measures_per_chunk);
        overlay(&mut options.beats_per_measure, self.beats_per_measure);
        overlay(&mut options.beats_per_minute_hint, self.beats_per_minute_hint);
        overlay(&mut options.melody_threshold, self.melody_threshold);
        overlay(&mut options.harmony_threshold, self.harmony_threshold);
        options.use_jukebox |= self.use_jukebox;
        options.segment_hints_are_downbeats |= self.segment_hints_are_downbeats;
        options.skip_melody |= self.skip_melody;
        options.skip_harmony |= self.skip_harmony;
        options.legacy_behavior |= self.legacy_behavior;
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve()?;
    let tool = SheetSageCommand::from_config(&config.tool);
    run(&cli, &config, tool)
}

/// Runs the pipeline, emits the report, and applies the `--strict` exit policy.
fn run<T: InferenceTool>(cli: &Cli, config: &RunConfig, tool: T) -> anyhow::Result<()> {
    let report = ExtractionPipeline::new(tool).run(config)?;

    let bytes = SerdeExporter.export(&report, cli.report_format.into())?;
    match &cli.report {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("write report {}", path.display()))?,
        None => println!("{}", String::from_utf8_lossy(&bytes)),
    }

    if !report.outcome.is_success() {
        if cli.strict {
            bail!(
                "inference failed after {} attempt(s) for {}",
                report.attempts.len(),
                report.audio
            );
        }
        warn!(dir = %report.target_dir.display(), "leadsheet may be empty or incomplete");
    }
    Ok(())
}
