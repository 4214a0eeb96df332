//! Runtime configuration.
//!
//! Settings are read from `<config_dir>/classroom/config.json` when present and
//! then overridden by environment variables:
//! - `CLASSROOM_URL` - Base URL of the table API (default: `http://localhost:17020/api/v1`)
//! - `CLASSROOM_API_KEY` - Bearer key sent to (and required by) the table API
//! - `CLASSROOM_DB` - Path of the SQLite database used by `serve`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::calendar::WeekStart;
use crate::models::{AttendanceStatus, StudentStatus};

const APP_NAME: &str = "classroom";
const CONFIG_FILE: &str = "config.json";

/// Default URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:17020/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the table API, including the `/api/v1` prefix.
    pub api_url: String,
    pub api_key: Option<String>,
    /// SQLite file for the server. Falls back to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// How many entries the "upcoming assignments" list shows.
    pub upcoming_limit: usize,
    pub week_start: WeekStart,
    /// Artificial delay applied to every call of the in-memory demo store.
    pub demo_latency_ms: u64,
    pub defaults: FieldDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            database_path: None,
            upcoming_limit: 5,
            week_start: WeekStart::Sunday,
            demo_latency_ms: 0,
            defaults: FieldDefaults::default(),
        }
    }
}

impl Settings {
    /// Load settings from the user's config directory and the environment.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let mut settings = match Self::try_load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let settings = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(settings)
    }

    /// Apply `CLASSROOM_*` overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CLASSROOM_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup("CLASSROOM_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(path) = lookup("CLASSROOM_DB").filter(|v| !v.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
    }

    /// Resolve the database path, defaulting to `<data_dir>/classroom.db`.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("classroom.db"))
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

// ============================================================
// Field defaults
// ============================================================

/// Values used for optional fields omitted from a create payload.
///
/// Every optional field of every entity is listed here, so both stores fill
/// gaps the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefaults {
    pub student: StudentDefaults,
    pub assignment: AssignmentDefaults,
    pub grade: GradeDefaults,
    pub attendance: AttendanceDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDefaults {
    pub status: StudentStatus,
    pub parent_contact: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentDefaults {
    pub due_date: DateDefault,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeDefaults {
    pub submitted_date: SubmissionDefault,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceDefaults {
    pub date: DateDefault,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Default for a required calendar-date field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateDefault {
    /// The calendar day of the write on the local clock.
    #[default]
    Today,
    Fixed(NaiveDate),
}

impl DateDefault {
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Fixed(date) => *date,
        }
    }
}

/// Default for a grade's submission timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionDefault {
    /// Entering a grade marks the work as submitted at that moment.
    #[default]
    Now,
    NotSubmitted,
}

impl SubmissionDefault {
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Now => Some(now),
            Self::NotSubmitted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.upcoming_limit, 5);
        assert_eq!(settings.week_start, WeekStart::Sunday);
        assert_eq!(settings.defaults.student.status, StudentStatus::Active);
        assert_eq!(settings.defaults.attendance.status, AttendanceStatus::Present);
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("CLASSROOM_URL", "https://school.example/api/v1/"),
            ("CLASSROOM_API_KEY", "secret"),
            ("CLASSROOM_DB", "/tmp/class.db"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.api_url, "https://school.example/api/v1");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.database_path().unwrap(), PathBuf::from("/tmp/class.db"));
    }

    #[test]
    fn partial_config_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "upcoming_limit": 3, "week_start": "monday", "defaults": { "grade": { "submitted_date": "not_submitted" } } }"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.upcoming_limit, 3);
        assert_eq!(settings.week_start, WeekStart::Monday);
        assert_eq!(settings.defaults.grade.submitted_date, SubmissionDefault::NotSubmitted);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn date_defaults_resolve_against_the_local_day() {
        // 23:30 UTC on March 1st is already March 2nd east of Greenwich.
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(DateDefault::Today.resolve(today), today);

        let fixed = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(DateDefault::Fixed(fixed).resolve(today), fixed);
        assert_eq!(SubmissionDefault::Now.resolve(now), Some(now));
        assert_eq!(SubmissionDefault::NotSubmitted.resolve(now), None);
    }
}
