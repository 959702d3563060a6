use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::options::{validate_measures_per_chunk, InferenceOptions};
use crate::DomainError;

pub const DEFAULT_OUTPUT_DIR: &str = "./output-no-jukebox";
pub const DEFAULT_RETRY_MEASURES_PER_CHUNK: u8 = 4;
pub const TARGET_DIR_PREFIX: &str = "leadsheet-";

/// How the external inference tool is launched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    /// Interpreter used to run the module.
    pub python: String,
    pub module: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            module: "sheetsage.infer".to_string(),
        }
    }
}

/// Everything one extraction run needs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Path or URL of the recording to transcribe.
    pub audio: String,
    pub output_dir: PathBuf,
    /// Overrides the name derived from the audio file stem.
    pub name: Option<String>,
    /// Parent for the scratch directory; the system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
    /// `measures_per_chunk` used for the single retry. `None` disables it.
    pub retry_measures_per_chunk: Option<u8>,
    pub tool: ToolConfig,
    pub inference: InferenceOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            audio: String::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            name: None,
            scratch_root: None,
            retry_measures_per_chunk: Some(DEFAULT_RETRY_MEASURES_PER_CHUNK),
            tool: ToolConfig::default(),
            inference: InferenceOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn new(audio: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio: audio.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(source).map_err(|err| DomainError::config(err.to_string()))
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| DomainError::config(format!("read {}: {err}", path.display())))?;
        Self::from_yaml_str(&source)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.audio.trim().is_empty() {
            return Err(DomainError::validation("no audio input given"));
        }
        self.leadsheet_name()?;
        if let Some(measures) = self.retry_measures_per_chunk {
            validate_measures_per_chunk(measures)?;
        }
        if self.tool.python.trim().is_empty() || self.tool.module.trim().is_empty() {
            return Err(DomainError::validation("tool interpreter and module are required"));
        }
        self.inference.validate()
    }

    /// Name of the leadsheet, `loveglow` for `songs/loveglow.mp3`.
    pub fn leadsheet_name(&self) -> Result<String, DomainError> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => Path::new(self.audio.trim_end_matches('/'))
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    DomainError::validation(format!(
                        "cannot derive a leadsheet name from {:?}",
                        self.audio
                    ))
                })?,
        };
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DomainError::validation(format!(
                "invalid leadsheet name {name:?}"
            )));
        }
        Ok(name)
    }

    pub fn target_dir(&self) -> Result<PathBuf, DomainError> {
        let name = self.leadsheet_name()?;
        Ok(self.output_dir.join(format!("{TARGET_DIR_PREFIX}{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_dir_uses_audio_stem() {
        let config = RunConfig::new("loveglow.mp3", DEFAULT_OUTPUT_DIR);
        assert_eq!(config.leadsheet_name().unwrap(), "loveglow");
        assert_eq!(
            config.target_dir().unwrap(),
            Path::new("./output-no-jukebox/leadsheet-loveglow")
        );
    }

    #[test]
    fn explicit_name_wins() {
        let mut config = RunConfig::new("https://example.com/track.wav", "out");
        assert_eq!(config.leadsheet_name().unwrap(), "track");
        config.name = Some("demo".to_string());
        assert_eq!(config.target_dir().unwrap(), Path::new("out/leadsheet-demo"));
    }

    #[test]
    fn rejects_bad_names_and_inputs() {
        assert!(RunConfig::new("", "out").validate().is_err());

        let mut config = RunConfig::new("song.mp3", "out");
        config.name = Some("../escape".to_string());
        assert!(config.validate().is_err());

        let mut config = RunConfig::new("song.mp3", "out");
        config.retry_measures_per_chunk = Some(30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_retry_with_four_measures() {
        let config = RunConfig::new("song.mp3", "out");
        assert_eq!(config.retry_measures_per_chunk, Some(4));
        assert_eq!(config.tool.module, "sheetsage.infer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let yaml = r#"
audio: loveglow.mp3
inference:
  title: Love Glow
  beats_per_measure: 4
tool:
  python: python3
"#;
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.audio, "loveglow.mp3");
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.tool.python, "python3");
        assert_eq!(config.tool.module, "sheetsage.infer");
        assert_eq!(config.inference.beats_per_measure, Some(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_can_disable_retry() {
        let config = RunConfig::from_yaml_str("audio: a.wav\nretry_measures_per_chunk: null\n").unwrap();
        assert_eq!(config.retry_measures_per_chunk, None);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "audio: song.flac\noutput_dir: sheets\n").unwrap();
        let config = RunConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.target_dir().unwrap(), Path::new("sheets/leadsheet-song"));

        let missing = RunConfig::from_yaml_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(DomainError::Config(_))));
    }
}
