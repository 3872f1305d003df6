mod bootstrap;
mod render;

use anyhow::{anyhow, Result};
use meter_core::period::parse_period;
use meter_core::settings::Settings;
use meter_core::time_utils::TimezoneHandler;
use meter_data::analysis::analyze_consumption;
use meter_data::export::{daily_series_csv, per_device_csv, write_export};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Meter Report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Period: {}, Timezone: {}, Format: {}",
        settings.period,
        settings.timezone,
        settings.format
    );

    let tz = TimezoneHandler::new(&settings.timezone);
    let period = parse_period(&settings.period, tz.today())?;

    let data_path = settings
        .data_path
        .clone()
        .or_else(bootstrap::discover_data_path)
        .ok_or_else(|| {
            anyhow!("no data path given and none found under ~/.meter-report/data")
        })?;
    tracing::debug!("Using data path {}", data_path.display());

    let result = analyze_consumption(
        &data_path,
        settings.devices.as_deref(),
        settings.object.as_deref(),
        Some(&period),
        &tz,
    )?;

    match settings.format.as_str() {
        "json" => println!("{}", render::render_json(&result)?),
        _ => print!("{}", render::render_text(&result)),
    }

    if let Some(path) = &settings.export {
        write_export(path, &daily_series_csv(&result.report.daily_series)?)?;
    }
    if let Some(path) = &settings.export_devices {
        write_export(path, &per_device_csv(&result.report.per_device)?)?;
    }

    Ok(())
}
