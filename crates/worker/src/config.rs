use std::path::PathBuf;
use std::time::Duration;

use dlcpos_pipeline::render::DEFAULT_CRF;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Directory holding analysis files (default: `./analysis`).
    pub analysis_dir: PathBuf,
    /// Pause between polling passes (default: 30 s).
    pub poll_interval: Duration,
    /// Run a single pass and exit (default: `false`).
    pub run_once: bool,
    /// x264 constant rate factor for rendered videos (default: `23`).
    pub ffmpeg_crf: u8,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default      |
    /// |----------------------|--------------|
    /// | `DATABASE_URL`       | (required)   |
    /// | `ANALYSIS_DIR`       | `./analysis` |
    /// | `POLL_INTERVAL_SECS` | `30`         |
    /// | `RUN_ONCE`           | `false`      |
    /// | `FFMPEG_CRF`         | `23`         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`WorkerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let analysis_dir =
            PathBuf::from(lookup("ANALYSIS_DIR").unwrap_or_else(|| "./analysis".into()));

        let poll_interval_secs: u64 = parse(&lookup, "POLL_INTERVAL_SECS", "30", "u64")?;
        let run_once = match lookup("RUN_ONCE").as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "RUN_ONCE",
                    expected: "boolean",
                    value: v.to_string(),
                })
            }
        };
        let ffmpeg_crf: u8 = parse(&lookup, "FFMPEG_CRF", &DEFAULT_CRF.to_string(), "u8")?;
        if ffmpeg_crf > 51 {
            return Err(ConfigError::Invalid {
                name: "FFMPEG_CRF",
                expected: "CRF between 0 and 51",
                value: ffmpeg_crf.to_string(),
            });
        }

        Ok(Self {
            database_url,
            analysis_dir,
            poll_interval: Duration::from_secs(poll_interval_secs),
            run_once,
            ffmpeg_crf,
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: raw.clone(),
    })
}
