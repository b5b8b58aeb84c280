// Review profile
// Loaded from --config, else ~/.config/fieldcheck/profile.toml, else defaults.
//
// Example:
//
//   id_column = "Project Id"
//   filter_columns = ["Zone", "Ward"]
//   page_size = 25
//
//   [export]
//   fill = "verdict"
//   scope = "filtered"

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use fieldcheck_engine::dataset::{DEFAULT_REQUIRED_COLUMNS, PROJECT_ID};
use fieldcheck_engine::export::DEFAULT_EXPORT_COLUMNS;
use fieldcheck_engine::filter::{DEFAULT_FILTER_COLUMNS, MAX_FILTER_COLUMNS};
use fieldcheck_engine::paging::DEFAULT_PAGE_SIZE;
use fieldcheck_engine::verdict::DEFAULT_REASONS;
use fieldcheck_engine::{ExportScope, FillScope, ReasonCatalog, SessionOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SHEET_NAME: &str = "Approval Data";
pub const DEFAULT_FILE_NAME: &str = "updated_approval_data.xlsx";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewProfile {
    /// Column that identifies a record across uploads.
    pub id_column: String,
    pub required_columns: Vec<String>,
    /// Categorical filter columns (at most three).
    pub filter_columns: Vec<String>,
    pub page_size: usize,
    pub disapproval_reasons: Vec<String>,
    pub export: ExportProfile,
}

impl Default for ReviewProfile {
    fn default() -> Self {
        Self {
            id_column: PROJECT_ID.to_string(),
            required_columns: strings(&DEFAULT_REQUIRED_COLUMNS),
            filter_columns: strings(&DEFAULT_FILTER_COLUMNS),
            page_size: DEFAULT_PAGE_SIZE,
            disapproval_reasons: strings(&DEFAULT_REASONS),
            export: ExportProfile::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportProfile {
    /// Upload columns to copy, in order. Empty copies every column.
    pub columns: Vec<String>,
    pub sheet_name: String,
    pub file_name: String,
    pub fill: FillScope,
    pub scope: ExportScope,
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self {
            columns: strings(&DEFAULT_EXPORT_COLUMNS),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            fill: FillScope::default(),
            scope: ExportScope::default(),
        }
    }
}

impl ReviewProfile {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let profile: ReviewProfile =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&input)
    }

    /// `<config_dir>/fieldcheck/profile.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fieldcheck")
            .join("profile.toml")
    }

    /// An explicit path must exist; the default path is optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::debug!("using profile {}", path.display());
            return Self::load(path);
        }
        let path = Self::default_path();
        if path.is_file() {
            log::debug!("using profile {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Validation("page_size must be at least 1".into()));
        }

        if self.id_column.trim().is_empty() {
            return Err(ConfigError::Validation("id_column must not be empty".into()));
        }

        if !self.required_columns.iter().any(|c| c == &self.id_column) {
            return Err(ConfigError::Validation(format!(
                "id_column '{}' must be listed in required_columns",
                self.id_column
            )));
        }

        if self.filter_columns.len() > MAX_FILTER_COLUMNS {
            return Err(ConfigError::Validation(format!(
                "at most {MAX_FILTER_COLUMNS} filter columns are supported, got {}",
                self.filter_columns.len()
            )));
        }

        if self.disapproval_reasons.is_empty() {
            return Err(ConfigError::Validation(
                "at least one disapproval reason is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for reason in &self.disapproval_reasons {
            if reason.trim().is_empty() {
                return Err(ConfigError::Validation("disapproval reasons must not be blank".into()));
            }
            if !seen.insert(reason.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate disapproval reason '{reason}'"
                )));
            }
        }

        if self.export.sheet_name.trim().is_empty() {
            return Err(ConfigError::Validation("export.sheet_name must not be empty".into()));
        }

        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            id_column: self.id_column.clone(),
            required_columns: self.required_columns.clone(),
            filter_columns: self.filter_columns.clone(),
            page_size: self.page_size,
            reasons: ReasonCatalog::new(self.disapproval_reasons.clone()),
        }
    }
}
