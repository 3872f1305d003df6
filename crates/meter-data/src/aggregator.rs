//! Period consumption aggregation over cumulative meter readings.
//!
//! Two independent passes run over each device's in-period samples:
//!
//! * the **span** pass takes first and last counter values and clamps the
//!   difference at zero; it feeds the period totals and the per-device rows;
//! * the **delta** pass walks consecutive sample pairs and books every
//!   positive increase on the day of the earlier sample; it feeds the daily
//!   series.
//!
//! A counter reset inside the period therefore lowers nothing in the daily
//! series but can make the period total differ from the series sum.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use meter_core::calculations::clamped_delta;
use meter_core::models::{
    DailyConsumption, Device, DeviceConsumption, MeterReading, Period, Report,
};
use meter_core::time_utils::TimezoneHandler;
use tracing::debug;

use crate::store::ReadingHistory;

/// One in-period sample: local calendar day and cumulative value.
type Sample = (NaiveDate, f64);

/// Stateless consumption aggregator bound to a timezone for day bucketing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumptionAggregator {
    tz: TimezoneHandler,
}

impl ConsumptionAggregator {
    pub fn new(tz: TimezoneHandler) -> Self {
        Self { tz }
    }

    /// Build a [`Report`] for `devices` over `period`.
    ///
    /// Returns [`Report::empty`] when `devices` is empty or `period` is
    /// `None`. Never fails: missing values count as zero and negative
    /// differences are clamped.
    pub fn aggregate<H>(&self, devices: &[Device], history: &H, period: Option<&Period>) -> Report
    where
        H: ReadingHistory + ?Sized,
    {
        let Some(period) = period else {
            return Report::empty();
        };
        if devices.is_empty() {
            return Report::empty();
        }

        let comparison = period.previous();
        let mut total_current = 0.0;
        let mut total_previous = 0.0;
        let mut per_device = Vec::with_capacity(devices.len());
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for device in devices {
            let readings = sorted_readings(history.readings_for(&device.id));

            let current = self.samples_in(device, &readings, period);
            let previous = self.samples_in(device, &readings, &comparison);

            let row = span_consumption(&device.id, &current);
            total_current += row.consumption;
            total_previous += span_consumption(&device.id, &previous).consumption;

            for (day, delta) in positive_deltas(&current) {
                *daily.entry(day).or_insert(0.0) += delta;
            }

            per_device.push(row);
        }

        let daily_series: Vec<DailyConsumption> = daily
            .into_iter()
            .filter(|(_, consumption)| *consumption > 0.0)
            .map(|(date, consumption)| DailyConsumption { date, consumption })
            .collect();

        debug!(
            "Aggregated {} devices over {}: current={:.3}, previous={:.3}, {} series days",
            devices.len(),
            period,
            total_current,
            total_previous,
            daily_series.len()
        );

        Report {
            period: Some(*period),
            comparison: Some(comparison),
            total_current,
            total_previous,
            daily_series,
            per_device,
        }
    }

    /// Samples of `readings` whose local day falls inside `period`.
    fn samples_in(
        &self,
        device: &Device,
        readings: &[&MeterReading],
        period: &Period,
    ) -> Vec<Sample> {
        readings
            .iter()
            .filter_map(|r| {
                let day = self.tz.local_date(r.time);
                period
                    .contains(day)
                    .then(|| (day, device.cumulative_value(r)))
            })
            .collect()
    }
}

// ── Passes ────────────────────────────────────────────────────────────────────

/// Stable time ordering; input order is not trusted.
fn sorted_readings(readings: &[MeterReading]) -> Vec<&MeterReading> {
    let mut sorted: Vec<&MeterReading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.time);
    sorted
}

/// First/last span of a device's samples, clamped at zero.
fn span_consumption(device_id: &str, samples: &[Sample]) -> DeviceConsumption {
    match (samples.first(), samples.last()) {
        (Some(&(_, start_value)), Some(&(_, end_value))) => DeviceConsumption {
            device_id: device_id.to_string(),
            start_value,
            end_value,
            consumption: clamped_delta(start_value, end_value),
        },
        _ => DeviceConsumption::zero(device_id),
    }
}

/// Positive pairwise increases, each booked on the earlier sample's day.
fn positive_deltas(samples: &[Sample]) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
    samples.windows(2).filter_map(|pair| match pair {
        [(day, before), (_, after)] if after - before > 0.0 => Some((*day, after - before)),
        _ => None,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
