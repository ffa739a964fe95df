//! Process configuration for the kiosk
//!
//! Read once at startup from the environment:
//! - `LAB_ENV`: `test` keeps everything in memory, anything else uses files
//! - `LAB_DATA_DIR`: where the JSON files and the log live
//! - `LAB_ADMIN_PIN`: replaces the built-in admin PIN

use lab_core::DEFAULT_ADMIN_PIN;
use std::path::PathBuf;

/// Storage environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// JSON files under the data dir
    Local,
    /// In-memory stores, nothing touches disk
    Test,
}

impl Environment {
    /// Detect environment from LAB_ENV variable
    pub fn detect() -> Self {
        Self::from_value(std::env::var("LAB_ENV").ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("test") | Some("testing") => Environment::Test,
            _ => Environment::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabConfig {
    pub env: Environment,
    pub data_dir: PathBuf,
    pub admin_pin: String,
}

impl LabConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            Environment::detect(),
            std::env::var("LAB_DATA_DIR").ok(),
            std::env::var("LAB_ADMIN_PIN").ok(),
        )
    }

    fn from_values(env: Environment, data_dir: Option<String>, pin: Option<String>) -> Self {
        let data_dir = data_dir
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let admin_pin = pin
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_PIN.to_string());
        Self {
            env,
            data_dir,
            admin_pin,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("stabilize_lab.log")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stabilize-lab")
}
