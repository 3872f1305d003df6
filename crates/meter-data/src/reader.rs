//! Device catalog and JSONL reading-file loading.
//!
//! A data directory holds `devices.json` (a JSON array of devices) and any
//! number of `*.jsonl` files, one reading per line, anywhere below it.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use meter_core::error::{MeterError, Result};
use meter_core::models::{Device, MeterReading};
use meter_core::time_utils::TimezoneHandler;
use tracing::{debug, warn};

use crate::store::ReadingStore;

/// File name of the device catalog inside a data directory.
pub const DEVICES_FILE: &str = "devices.json";

/// Devices and readings loaded from one data path.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub devices: Vec<Device>,
    pub readings: ReadingStore,
    /// Reading files that were scanned.
    pub files: Vec<PathBuf>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.jsonl` files recursively under `data_path`, sorted by path.
pub fn find_reading_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load the device catalog at `path`.
pub fn load_devices(path: &Path) -> Result<Vec<Device>> {
    let content = std::fs::read_to_string(path).map_err(|source| MeterError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let devices: Vec<Device> = serde_json::from_str(&content)?;
    debug!("Loaded {} devices from {}", devices.len(), path.display());
    Ok(devices)
}

/// Parse every reading in `files` into a [`ReadingStore`].
///
/// Unreadable files are skipped with a warning, malformed lines with a debug
/// message. Offset-less timestamps are interpreted in `tz`.
pub fn load_readings(files: &[PathBuf], tz: &TimezoneHandler) -> ReadingStore {
    let mut all: Vec<MeterReading> = Vec::new();
    for file_path in files {
        all.extend(process_single_file(file_path, tz));
    }
    ReadingStore::from_readings(all)
}

/// Load devices and readings from `data_path`.
///
/// `data_path` may be a directory or a single `.jsonl` file. Without an
/// explicit `devices_path` the catalog is expected at `devices.json` in the
/// directory (or next to the file).
pub fn load_dataset(
    data_path: &Path,
    devices_path: Option<&Path>,
    tz: &TimezoneHandler,
) -> Result<Dataset> {
    if !data_path.exists() {
        return Err(MeterError::DataPathNotFound(data_path.to_path_buf()));
    }

    let (files, catalog_dir) = if data_path.is_file() {
        (
            vec![data_path.to_path_buf()],
            data_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        )
    } else {
        (find_reading_files(data_path), data_path.to_path_buf())
    };

    if files.is_empty() {
        return Err(MeterError::NoDataFiles(data_path.to_path_buf()));
    }

    let catalog = devices_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| catalog_dir.join(DEVICES_FILE));
    let devices = load_devices(&catalog)?;
    let readings = load_readings(&files, tz);

    debug!(
        "Loaded {} readings for {} devices from {} files",
        readings.len(),
        readings.device_count(),
        files.len()
    );

    Ok(Dataset {
        devices,
        readings,
        files,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse one JSONL file, skipping lines that do not map to a reading.
fn process_single_file(file_path: &Path, tz: &TimezoneHandler) -> Vec<MeterReading> {
    let file = match std::fs::File::open(file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to read file {}: {}", file_path.display(), e);
            return Vec::new();
        }
    };

    let reader = std::io::BufReader::new(file);
    let mut readings = Vec::new();
    let mut lines_read = 0u64;
    let mut lines_skipped = 0u64;

    for line_result in reader.lines() {
        let Ok(line) = line_result else {
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines_read += 1;

        let data: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                debug!(
                    "Failed to parse JSON line in {}: {}",
                    file_path.display(),
                    e
                );
                lines_skipped += 1;
                continue;
            }
        };

        match map_to_reading(&data, tz) {
            Some(reading) => readings.push(reading),
            None => lines_skipped += 1,
        }
    }

    debug!(
        "File {}: {} read, {} skipped",
        file_path.display(),
        lines_read,
        lines_skipped,
    );

    readings
}

/// Map a raw JSON object to a [`MeterReading`].
///
/// Requires a parseable `time` (or `timestamp`) and a `device_id` (or
/// `deviceId`). Channel values may be numbers or numeric strings.
fn map_to_reading(data: &serde_json::Value, tz: &TimezoneHandler) -> Option<MeterReading> {
    let ts = data
        .get("time")
        .or_else(|| data.get("timestamp"))
        .and_then(|v| v.as_str())?;
    let time = tz.parse_timestamp(ts)?;

    let device_id = data
        .get("device_id")
        .or_else(|| data.get("deviceId"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())?
        .to_string();

    Some(MeterReading {
        time,
        device_id,
        volume: channel_number(data, "volume"),
        energy: channel_number(data, "energy"),
    })
}

fn channel_number(data: &serde_json::Value, key: &str) -> Option<f64> {
    let value = data.get(key)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
