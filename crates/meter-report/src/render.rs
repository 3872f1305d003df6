//! Plain-text and JSON renderings of an analysis result.
//!
//! The text view has three blocks: a summary of the period totals, one row
//! per device with a totals row at the bottom, and the daily series.

use std::fmt::Write;

use meter_core::formatting;
use meter_core::models::DeviceKind;
use meter_data::analysis::AnalysisResult;

/// Data for a single row in the device table.
#[derive(Debug, Clone)]
pub struct DeviceRowData {
    /// Display label: device name, falling back to its id.
    pub label: String,
    pub kind: DeviceKind,
    pub unit: String,
    /// Cumulative value at the first in-period sample.
    pub start_value: f64,
    /// Cumulative value at the last in-period sample.
    pub end_value: f64,
    pub consumption: f64,
}

/// Pair each per-device report row with its catalog entry.
pub fn device_rows(result: &AnalysisResult) -> Vec<DeviceRowData> {
    result
        .devices
        .iter()
        .zip(&result.report.per_device)
        .map(|(device, row)| DeviceRowData {
            label: device.label().to_string(),
            kind: device.kind,
            unit: device.unit.clone(),
            start_value: row.start_value,
            end_value: row.end_value,
            consumption: row.consumption,
        })
        .collect()
}

/// Render the human-readable report.
pub fn render_text(result: &AnalysisResult) -> String {
    let summary = &result.summary;
    let Some(period) = summary.period else {
        return "No report period selected.\n".to_string();
    };
    let unit = summary.unit.as_deref().unwrap_or("");
    let mut out = String::new();

    let _ = writeln!(out, "Consumption report {} ({} days)", period, summary.days);
    if let Some(object) = &result.metadata.object {
        let _ = writeln!(out, "Object             {}", object);
    }
    if let Some(comparison) = summary.comparison {
        let _ = writeln!(out, "Compared with      {}", comparison);
    }
    let _ = writeln!(out);

    if result.devices.is_empty() {
        let _ = writeln!(out, "No devices matched the selection.");
        return out;
    }

    let tiles = [
        (
            "Current period",
            formatting::format_consumption(summary.total_current, unit),
        ),
        (
            "Previous period",
            formatting::format_consumption(summary.total_previous, unit),
        ),
        ("Change", formatting::format_change(summary.percentage_change)),
        (
            "Daily average",
            formatting::format_consumption(summary.average_daily, unit),
        ),
    ];
    for (title, value) in tiles {
        let _ = writeln!(out, "  {:<17}{}", title, value);
    }
    let _ = writeln!(out);

    let rows = device_rows(result);
    let label_width = rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Device".len());

    let _ = writeln!(out, "Devices");
    let _ = writeln!(
        out,
        "  {:<lw$}  {:<8}  {:>14}  {:>14}  {:>14}  {}",
        "Device",
        "Kind",
        "Start",
        "End",
        "Consumption",
        "Unit",
        lw = label_width
    );
    for row in &rows {
        let _ = writeln!(
            out,
            "  {:<lw$}  {:<8}  {:>14}  {:>14}  {:>14}  {}",
            row.label,
            row.kind.to_string(),
            formatting::format_number(row.start_value, 2),
            formatting::format_number(row.end_value, 2),
            formatting::format_number(row.consumption, 2),
            row.unit,
            lw = label_width
        );
    }
    let _ = writeln!(
        out,
        "  {:<lw$}  {:<8}  {:>14}  {:>14}  {:>14}  {}",
        "TOTAL",
        format!("{} dev", rows.len()),
        "",
        "",
        formatting::format_number(summary.total_current, 2),
        unit,
        lw = label_width
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Daily consumption");
    if result.report.daily_series.is_empty() {
        let _ = writeln!(out, "  No positive consumption recorded.");
    }
    for entry in &result.report.daily_series {
        let _ = writeln!(
            out,
            "  {}  {:>14}",
            entry.date.format("%Y-%m-%d"),
            formatting::format_number(entry.consumption, 2)
        );
    }

    out
}

/// Render the full analysis result as pretty-printed JSON.
pub fn render_json(result: &AnalysisResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
