use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calculations;
use crate::error::{MeterError, Result};

/// The family a metering device belongs to.
///
/// Unrecognised or null kind names deserialise to [`DeviceKind::Unknown`]
/// rather than failing, so a catalog with a newer device type still loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum DeviceKind {
    /// Cold or hot water meter; counts volume.
    Water,
    /// Heat meter; counts energy.
    Heat,
    /// Data concentrator. Reports on the volume channel when it reports at all.
    Gateway,
    /// Anything else.
    #[default]
    Unknown,
}

/// The reading field that carries a device's cumulative counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Primary volume counter.
    Volume,
    /// Energy counter.
    Energy,
}

impl DeviceKind {
    /// Parse a kind name case-insensitively; unknown names map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "water" => DeviceKind::Water,
            "heat" => DeviceKind::Heat,
            "gateway" => DeviceKind::Gateway,
            _ => DeviceKind::Unknown,
        }
    }

    /// Which channel holds the cumulative value for this kind.
    ///
    /// `None` means the kind has no counter the aggregator understands.
    pub fn channel(self) -> Option<Channel> {
        match self {
            DeviceKind::Heat => Some(Channel::Energy),
            DeviceKind::Water | DeviceKind::Gateway => Some(Channel::Volume),
            DeviceKind::Unknown => None,
        }
    }
}

impl From<Option<String>> for DeviceKind {
    fn from(name: Option<String>) -> Self {
        name.as_deref().map_or(DeviceKind::Unknown, DeviceKind::from_name)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Water => "water",
            DeviceKind::Heat => "heat",
            DeviceKind::Gateway => "gateway",
            DeviceKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A metering device as listed in the device catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device identifier.
    pub id: String,
    /// Device family; selects which reading channel is cumulative.
    #[serde(default)]
    pub kind: DeviceKind,
    /// Display unit, e.g. `"m³"` or `"GJ"`.
    #[serde(default)]
    pub unit: String,
    /// Human-readable label.
    #[serde(default)]
    pub name: Option<String>,
    /// Organisational object (site) the device is installed at.
    #[serde(default, alias = "objectId")]
    pub object_id: Option<String>,
}

impl Device {
    /// Cumulative counter value of `reading` for this device.
    ///
    /// Returns `0.0` when the kind has no channel, the channel is absent in
    /// the reading, or the stored number is not finite.
    pub fn cumulative_value(&self, reading: &MeterReading) -> f64 {
        self.kind
            .channel()
            .and_then(|channel| reading.channel_value(channel))
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Label for display: the name when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One timestamped sample reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// UTC instant the sample was taken.
    pub time: DateTime<Utc>,
    /// Owning device.
    #[serde(alias = "deviceId")]
    pub device_id: String,
    /// Volume counter, when reported.
    #[serde(default)]
    pub volume: Option<f64>,
    /// Energy counter, when reported.
    #[serde(default)]
    pub energy: Option<f64>,
}

impl MeterReading {
    /// Raw value stored on `channel`.
    pub fn channel_value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Volume => self.volume,
            Channel::Energy => self.energy,
        }
    }
}

/// A closed range of calendar days, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    from: NaiveDate,
    to: NaiveDate,
}

impl Period {
    /// Build a period, rejecting reversed bounds.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(MeterError::InvalidPeriod(format!("{from}..{to}")));
        }
        Ok(Self { from, to })
    }

    /// A period covering exactly one day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    /// First day (inclusive).
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day (inclusive).
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Inclusive day count, always at least 1.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Whether `day` lies within the period.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// The equal-length period ending the day before this one starts.
    ///
    /// Plain day arithmetic: `to' = from - 1`, `from' = to' - (to - from)`.
    pub fn previous(&self) -> Period {
        let span = self.to - self.from;
        let to = self.from.pred_opt().unwrap_or(NaiveDate::MIN);
        let from = to.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
        Period { from, to }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Consumption attributed to one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConsumption {
    pub date: NaiveDate,
    pub consumption: f64,
}

/// First/last counter values of one device inside a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConsumption {
    pub device_id: String,
    pub start_value: f64,
    pub end_value: f64,
    /// `max(0, end_value - start_value)`.
    pub consumption: f64,
}

impl DeviceConsumption {
    /// Breakdown row for a device with no readings in the period.
    pub fn zero(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            start_value: 0.0,
            end_value: 0.0,
            consumption: 0.0,
        }
    }
}

/// Output of the consumption aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// The period the report covers; `None` for an empty report.
    pub period: Option<Period>,
    /// Equal-length period immediately before `period`.
    pub comparison: Option<Period>,
    /// Sum of clamped first/last differences within `period`.
    pub total_current: f64,
    /// Same figure over `comparison`.
    pub total_previous: f64,
    /// Positive per-day deltas, ascending by date.
    pub daily_series: Vec<DailyConsumption>,
    /// One row per input device, in input order.
    pub per_device: Vec<DeviceConsumption>,
}

impl Report {
    /// All zeros, no series, no breakdown.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty report (no period was evaluated).
    pub fn is_empty(&self) -> bool {
        self.period.is_none()
    }

    /// Inclusive day count of `period`, `0` for an empty report.
    pub fn days(&self) -> i64 {
        self.period.map(|p| p.days()).unwrap_or(0)
    }

    /// Change against the comparison period, in percent.
    pub fn percentage_change(&self) -> f64 {
        calculations::percentage_change(self.total_current, self.total_previous)
    }

    /// Mean consumption per day of `period`.
    pub fn average_daily(&self) -> f64 {
        calculations::average_daily(self.total_current, self.days())
    }

    /// Sum of the daily series. Not necessarily equal to `total_current`.
    pub fn daily_total(&self) -> f64 {
        self.daily_series.iter().map(|d| d.consumption).sum()
    }
}
