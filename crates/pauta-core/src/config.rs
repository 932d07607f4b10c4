use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::path::Path;

use crate::error::PautaError;

pub const DEFAULT_MEETING_TITLE: &str = "REUNIÃO DE LÍDERES";
pub const DEFAULT_AGENDA_TITLE: &str = "PAUTA DE PLENÁRIO";
pub const DEFAULT_DOCUMENT_NAME: &str = "Pauta plenário";
pub const DEFAULT_STOP_MARKER: &str = "AVISO";

/// Settings for a single extraction run.
///
/// Built once per request and passed explicitly into each pipeline stage,
/// so the date stamped into an artifact never changes mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub date: NaiveDate,
    /// Banner title of the spreadsheet, also used in its file name.
    pub meeting_title: String,
    /// Header title of the agenda document.
    pub agenda_title: String,
    /// Name of the agenda document file. Kept apart from `agenda_title`,
    /// which is upper case for the page header.
    pub document_name: String,
    /// Literal text that halts block extraction at the page it appears on.
    pub stop_marker: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::for_date(Local::now().date_naive())
    }
}

impl RunConfig {
    pub fn for_date(date: NaiveDate) -> Self {
        RunConfig {
            date,
            meeting_title: DEFAULT_MEETING_TITLE.to_string(),
            agenda_title: DEFAULT_AGENDA_TITLE.to_string(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            stop_marker: Some(DEFAULT_STOP_MARKER.to_string()),
        }
    }

    /// Load overrides from a JSON file on top of today's defaults.
    pub fn load(path: &Path) -> Result<Self, PautaError> {
        let bytes = std::fs::read(path).map_err(|e| {
            PautaError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let file: ConfigFile = serde_json::from_slice(&bytes)
            .map_err(|e| PautaError::Config(format!("{}: {e}", path.display())))?;
        file.into_config(RunConfig::default())
    }

    /// Date as printed inside artifacts, e.g. `19/10/2026`.
    pub fn display_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }

    /// Date as used in suggested file names, e.g. `19_10_2026`.
    pub fn file_date(&self) -> String {
        self.date.format("%d_%m_%Y").to_string()
    }

    pub fn spreadsheet_file_name(&self) -> String {
        format!("{} - {}.xlsx", self.file_date(), self.meeting_title)
    }

    pub fn document_file_name(&self) -> String {
        format!("{} - {}.docx", self.file_date(), self.document_name)
    }
}

/// Parse a `DD/MM/YYYY` date as typed by a user.
pub fn parse_display_date(s: &str) -> Result<NaiveDate, PautaError> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").map_err(|e| {
        PautaError::Config(format!("invalid date '{s}' (expected DD/MM/YYYY): {e}"))
    })
}

/// On-disk configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    date: Option<String>,
    meeting_title: Option<String>,
    agenda_title: Option<String>,
    document_name: Option<String>,
    /// `null` disables the marker; absent keeps the default.
    #[serde(default, deserialize_with = "explicit_null")]
    stop_marker: Option<Option<String>>,
}

impl ConfigFile {
    fn into_config(self, mut config: RunConfig) -> Result<RunConfig, PautaError> {
        if let Some(date) = self.date {
            config.date = parse_display_date(&date)?;
        }
        if let Some(title) = self.meeting_title {
            config.meeting_title = title;
        }
        if let Some(title) = self.agenda_title {
            config.agenda_title = title;
        }
        if let Some(name) = self.document_name {
            config.document_name = name;
        }
        if let Some(marker) = self.stop_marker {
            config.stop_marker = marker.filter(|m| !m.is_empty());
        }
        Ok(config)
    }
}

fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn test_date_formats() {
        let config = RunConfig::for_date(date());
        assert_eq!(config.display_date(), "07/03/2025");
        assert_eq!(config.file_date(), "07_03_2025");
        assert_eq!(
            config.spreadsheet_file_name(),
            "07_03_2025 - REUNIÃO DE LÍDERES.xlsx"
        );
        assert_eq!(config.document_file_name(), "07_03_2025 - Pauta plenário.docx");
    }

    #[test]
    fn test_config_file_overrides() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"date": "01/02/2024", "agenda_title": "ORDEM DO DIA", "stop_marker": null}"#,
        )
        .unwrap();
        let config = file.into_config(RunConfig::for_date(date())).unwrap();
        assert_eq!(config.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(config.agenda_title, "ORDEM DO DIA");
        assert_eq!(config.meeting_title, DEFAULT_MEETING_TITLE);
        assert_eq!(config.stop_marker, None);
    }

    #[test]
    fn test_document_name_reaches_file_name() {
        let file: ConfigFile =
            serde_json::from_str(r#"{"document_name": "Ordem do dia"}"#).unwrap();
        let config = file.into_config(RunConfig::for_date(date())).unwrap();
        assert_eq!(config.document_file_name(), "07_03_2025 - Ordem do dia.docx");
        assert_eq!(config.agenda_title, DEFAULT_AGENDA_TITLE);
    }

    #[test]
    fn test_config_file_absent_marker_keeps_default() {
        let file: ConfigFile = serde_json::from_str("{}").unwrap();
        let config = file.into_config(RunConfig::for_date(date())).unwrap();
        assert_eq!(config.stop_marker.as_deref(), Some(DEFAULT_STOP_MARKER));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(parse_display_date("2024-02-01").is_err());
    }
}
