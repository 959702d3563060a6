use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Largest chunk the inference tool can transcribe in one step.
pub const MAX_MEASURES_PER_CHUNK: u8 = 24;

/// Flags forwarded to the inference tool. Unset fields are left to the
/// tool's own defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceOptions {
    /// Approximate timestamp (seconds) of the first downbeat to transcribe.
    pub segment_start_hint: Option<f64>,
    /// Approximate timestamp (seconds) of the last downbeat to transcribe.
    pub segment_end_hint: Option<f64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub use_jukebox: bool,
    pub measures_per_chunk: Option<u8>,
    pub segment_hints_are_downbeats: bool,
    /// Overrides time signature detection: 3 for 3/4, 4 for 4/4.
    pub beats_per_measure: Option<u8>,
    pub beats_per_minute_hint: Option<u32>,
    pub melody_threshold: Option<f32>,
    pub harmony_threshold: Option<f32>,
    pub skip_melody: bool,
    pub skip_harmony: bool,
    /// Ignore the end hint and transcribe exactly one max-length chunk.
    pub legacy_behavior: bool,
}

impl InferenceOptions {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(start) = self.segment_start_hint {
            if start < 0.0 {
                return Err(DomainError::validation(
                    "segment start hint cannot be negative",
                ));
            }
        }
        if let Some(end) = self.segment_end_hint {
            if end < 0.0 {
                return Err(DomainError::validation("segment end hint cannot be negative"));
            }
        }
        if let (Some(start), Some(end)) = (self.segment_start_hint, self.segment_end_hint) {
            if end <= start {
                return Err(DomainError::validation(
                    "segment end hint must be greater than start hint",
                ));
            }
        }
        if let Some(measures) = self.measures_per_chunk {
            validate_measures_per_chunk(measures)?;
        }
        if let Some(beats) = self.beats_per_measure {
            if beats != 3 && beats != 4 {
                return Err(DomainError::validation(
                    "only 3/4 and 4/4 time signatures are supported",
                ));
            }
        }
        Ok(())
    }

    /// Copy of these options with `measures_per_chunk` replaced.
    pub fn with_measures_per_chunk(&self, measures: u8) -> Self {
        Self {
            measures_per_chunk: Some(measures),
            ..self.clone()
        }
    }
}

pub fn validate_measures_per_chunk(measures: u8) -> Result<(), DomainError> {
    if measures == 0 {
        return Err(DomainError::validation("measures per chunk must be positive"));
    }
    if measures > MAX_MEASURES_PER_CHUNK {
        return Err(DomainError::validation(format!(
            "at most {MAX_MEASURES_PER_CHUNK} measures per chunk can be transcribed"
        )));
    }
    Ok(())
}
