use chrono::Utc;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::time_utils::TimezoneHandler;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Consumption reports for water and heat meters
#[derive(Parser, Debug, Clone)]
#[command(
    name = "meter-report",
    about = "Consumption reports for water and heat meters",
    version
)]
pub struct Settings {
    /// Data directory (devices.json + *.jsonl readings) or a single .jsonl file
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Device catalog (defaults to devices.json inside the data directory)
    #[arg(long)]
    pub devices: Option<PathBuf>,

    /// Only report devices installed at this object (site)
    #[arg(long)]
    pub object: Option<String>,

    /// Reporting period: today, week, month, year, <N>d, YYYY-MM-DD or YYYY-MM-DD..YYYY-MM-DD
    #[arg(long, default_value = "month", value_parser = period_arg)]
    pub period: String,

    /// Timezone used for calendar days (auto-detected if not specified)
    #[arg(long, default_value = "auto", value_parser = timezone_arg)]
    pub timezone: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Write the daily consumption series as CSV to this path
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the per-device breakdown as CSV to this path
    #[arg(long)]
    pub export_devices: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.meter-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.meter-report/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".meter-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories if
    /// needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "data_path") && settings.data_path.is_none() {
            settings.data_path = last.data_path;
        }
        if !is_arg_explicitly_set(&matches, "object") && settings.object.is_none() {
            settings.object = last.object;
        }
        if !is_arg_explicitly_set(&matches, "period") {
            if let Some(v) = last.period.filter(|v| is_valid_saved(v, period_arg)) {
                settings.period = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone.filter(|v| is_valid_saved(v, timezone_arg)) {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_path: s.data_path.clone(),
            object: s.object.clone(),
            period: Some(s.period.clone()),
            timezone: Some(s.timezone.clone()),
            format: Some(s.format.clone()),
        }
    }
}

// ── Value parsers ──────────────────────────────────────────────────────────────

/// Accept any period expression `parse_period` understands.
fn period_arg(s: &str) -> Result<String, String> {
    crate::period::parse_period(s, Utc::now().date_naive())
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}

/// Accept `auto` or a recognised IANA timezone name.
fn timezone_arg(s: &str) -> Result<String, String> {
    if s == "auto" || TimezoneHandler::validate_timezone(s) {
        Ok(s.to_string())
    } else {
        Err(format!("unrecognised timezone \"{}\"", s))
    }
}

/// Saved values are re-checked; a stale or hand-edited entry is dropped.
fn is_valid_saved(value: &str, parser: fn(&str) -> Result<String, String>) -> bool {
    match parser(value) {
        Ok(_) => true,
        Err(e) => {
            warn!("Ignoring saved value \"{}\": {}", value, e);
            false
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
