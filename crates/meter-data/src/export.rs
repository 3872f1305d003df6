//! CSV export of report series.
//!
//! Both exports use CRLF record terminators and two-decimal fixed values.

use std::path::Path;

use meter_core::error::{MeterError, Result};
use meter_core::formatting::format_fixed;
use meter_core::models::{DailyConsumption, DeviceConsumption};
use tracing::info;

const DECIMALS: u32 = 2;

/// Render the daily series as `date,consumption` CSV.
pub fn daily_series_csv(series: &[DailyConsumption]) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(["date", "consumption"])?;
    for entry in series {
        writer.write_record([
            entry.date.format("%Y-%m-%d").to_string(),
            format_fixed(entry.consumption, DECIMALS),
        ])?;
    }
    finish(writer)
}

/// Render the per-device breakdown as CSV.
pub fn per_device_csv(rows: &[DeviceConsumption]) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(["device_id", "start_value", "end_value", "consumption"])?;
    for row in rows {
        writer.write_record([
            row.device_id.clone(),
            format_fixed(row.start_value, DECIMALS),
            format_fixed(row.end_value, DECIMALS),
            format_fixed(row.consumption, DECIMALS),
        ])?;
    }
    finish(writer)
}

/// Write already-rendered CSV text to `path`.
pub fn write_export(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    info!("Exported {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| MeterError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| MeterError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_daily_series_csv_exact_output() {
        let series = vec![
            DailyConsumption {
                date: day(1),
                consumption: 12.345,
            },
            DailyConsumption {
                date: day(2),
                consumption: 0.5,
            },
        ];

        let csv = daily_series_csv(&series).unwrap();
        assert_eq!(
            csv,
            "date,consumption\r\n2024-01-01,12.35\r\n2024-01-02,0.50\r\n"
        );
    }

    #[test]
    fn test_daily_series_csv_empty_has_header_only() {
        assert_eq!(daily_series_csv(&[]).unwrap(), "date,consumption\r\n");
    }

    #[test]
    fn test_daily_series_csv_large_values_not_grouped() {
        let series = vec![DailyConsumption {
            date: day(3),
            consumption: 12_345.678,
        }];
        assert_eq!(
            daily_series_csv(&series).unwrap(),
            "date,consumption\r\n2024-01-03,12345.68\r\n"
        );
    }

    #[test]
    fn test_per_device_csv() {
        let rows = vec![
            DeviceConsumption {
                device_id: "wm-1".to_string(),
                start_value: 100.0,
                end_value: 130.0,
                consumption: 30.0,
            },
            DeviceConsumption::zero("hm-1"),
        ];

        assert_eq!(
            per_device_csv(&rows).unwrap(),
            "device_id,start_value,end_value,consumption\r\n\
             wm-1,100.00,130.00,30.00\r\n\
             hm-1,0.00,0.00,0.00\r\n"
        );
    }

    #[test]
    fn test_per_device_csv_quotes_awkward_ids() {
        let rows = vec![DeviceConsumption::zero("meter, basement")];
        let csv = per_device_csv(&rows).unwrap();
        assert!(csv.contains("\"meter, basement\",0.00"));
    }

    #[test]
    fn test_write_export_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reports").join("daily.csv");

        write_export(&path, "date,consumption\r\n").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "date,consumption\r\n"
        );
    }
}
