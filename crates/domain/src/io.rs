use serde::{Deserialize, Serialize};

use crate::{error::DomainError, report::RunReport};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

pub trait ReportExporter {
    fn export(&self, report: &RunReport, format: ExportFormat) -> Result<Vec<u8>, DomainError>;
}

pub struct SerdeExporter;

impl ReportExporter for SerdeExporter {
    fn export(&self, report: &RunReport, format: ExportFormat) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Json => serde_json::to_vec_pretty(report)
                .map_err(|err| DomainError::Serialization(err.to_string())),
            ExportFormat::Yaml => serde_yaml::to_string(report)
                .map(String::into_bytes)
                .map_err(|err| DomainError::Serialization(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::report::{AttemptRecord, AttemptStatus, InferenceOutcome};
    use time::OffsetDateTime;

    fn sample_report() -> RunReport {
        let attempts = vec![
            AttemptRecord {
                attempt: 1,
                measures_per_chunk: None,
                status: AttemptStatus::Failed { code: Some(1) },
                elapsed_ms: 120,
            },
            AttemptRecord {
                attempt: 2,
                measures_per_chunk: Some(4),
                status: AttemptStatus::Succeeded,
                elapsed_ms: 340,
            },
        ];
        RunReport {
            audio: "loveglow.mp3".to_string(),
            target_dir: PathBuf::from("out/leadsheet-loveglow"),
            scratch_dir: PathBuf::from("/tmp/leadsheet-abc"),
            started_at: OffsetDateTime::UNIX_EPOCH,
            outcome: InferenceOutcome::from_attempts(&attempts),
            attempts,
            copied: vec![PathBuf::from("out/leadsheet-loveglow/output.midi")],
        }
    }

    #[test]
    fn exports_json() {
        let bytes = SerdeExporter
            .export(&sample_report(), ExportFormat::Json)
            .unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("\"started_at\": \"1970-01-01T00:00:00Z\""));
        assert!(output.contains("\"outcome\": \"succeeded\""));
        assert!(output.contains("\"code\": 1"));
    }

    #[test]
    fn exports_yaml() {
        let report = sample_report();
        let bytes = SerdeExporter.export(&report, ExportFormat::Yaml).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("audio: loveglow.mp3"));
        let parsed: RunReport = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed, report);
    }
}
