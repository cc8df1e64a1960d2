//! Engine configuration
//!
//! Loaded from TOML; every key is optional and unknown keys are rejected.
//!
//! ```toml
//! database_path = "/var/lib/tutorsync/store.db"
//! log_profile = "production"
//!
//! [visibility]
//! create = "visible"
//!
//! [listing]
//! default_hits_per_page = 50
//! fallback_to_store = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tutorsync_core::errors::{ExError, ExErrorKind};
use tutorsync_core::logging_facility::Profile;

use crate::coordinator::CoordinatorOptions;
use crate::list::ListingOptions;

pub const DEFAULT_DATABASE_PATH: &str = ".tutorsync/store.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub log_profile: Profile,
    pub visibility: CoordinatorOptions,
    pub listing: ListingOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_profile: Profile::Development,
            visibility: CoordinatorOptions::default(),
            listing: ListingOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `Config` for syntax errors, unknown keys or invalid values.
    pub fn from_toml_str(text: &str) -> Result<Self, ExError> {
        let config: Self = toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, ExError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ExError> {
        let listing = &self.listing;
        if listing.max_hits_per_page == 0 {
            return Err(config_error("listing.max_hits_per_page must be at least 1"));
        }
        if listing.default_hits_per_page == 0
            || listing.default_hits_per_page > listing.max_hits_per_page
        {
            return Err(config_error(
                "listing.default_hits_per_page must be between 1 and max_hits_per_page",
            ));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(config_error("database_path cannot be empty"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(message)
}
