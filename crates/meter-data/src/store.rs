//! In-memory reading history grouped per device.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use meter_core::models::MeterReading;

/// Source of per-device reading histories consumed by the aggregator.
pub trait ReadingHistory {
    /// All readings known for `device_id`, in no guaranteed order.
    /// An unknown device yields an empty slice.
    fn readings_for(&self, device_id: &str) -> &[MeterReading];
}

impl ReadingHistory for HashMap<String, Vec<MeterReading>> {
    fn readings_for(&self, device_id: &str) -> &[MeterReading] {
        self.get(device_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Readings grouped by device id, each list sorted by time.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    by_device: HashMap<String, Vec<MeterReading>>,
    len: usize,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an arbitrary reading sequence.
    ///
    /// A second reading for the same device and instant is dropped; the
    /// first one seen wins.
    pub fn from_readings(readings: impl IntoIterator<Item = MeterReading>) -> Self {
        let mut store = Self::new();
        let mut seen: HashSet<(String, DateTime<Utc>)> = HashSet::new();

        for reading in readings {
            if !seen.insert((reading.device_id.clone(), reading.time)) {
                continue;
            }
            store
                .by_device
                .entry(reading.device_id.clone())
                .or_default()
                .push(reading);
            store.len += 1;
        }

        for list in store.by_device.values_mut() {
            list.sort_by_key(|r| r.time);
        }

        store
    }

    /// Total number of readings held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of devices with at least one reading.
    pub fn device_count(&self) -> usize {
        self.by_device.len()
    }
}

impl ReadingHistory for ReadingStore {
    fn readings_for(&self, device_id: &str) -> &[MeterReading] {
        self.by_device.readings_for(device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(device: &str, day: u32, volume: f64) -> MeterReading {
        MeterReading {
            time: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            device_id: device.to_string(),
            volume: Some(volume),
            energy: None,
        }
    }

    #[test]
    fn test_store_groups_and_sorts() {
        let store = ReadingStore::from_readings(vec![
            reading("wm-1", 3, 30.0),
            reading("hm-1", 1, 5.0),
            reading("wm-1", 1, 10.0),
            reading("wm-1", 2, 20.0),
        ]);

        assert_eq!(store.len(), 4);
        assert_eq!(store.device_count(), 2);
        let values: Vec<f64> = store
            .readings_for("wm-1")
            .iter()
            .filter_map(|r| r.volume)
            .collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_store_drops_duplicate_instants() {
        let store = ReadingStore::from_readings(vec![
            reading("wm-1", 1, 10.0),
            reading("wm-1", 1, 99.0),
            reading("wm-2", 1, 99.0),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.readings_for("wm-1")[0].volume, Some(10.0));
    }

    #[test]
    fn test_store_unknown_device_is_empty() {
        let store = ReadingStore::from_readings(vec![reading("wm-1", 1, 10.0)]);
        assert!(store.readings_for("missing").is_empty());
    }

    #[test]
    fn test_empty_store() {
        let store = ReadingStore::new();
        assert!(store.is_empty());
        assert_eq!(store.device_count(), 0);
    }

    #[test]
    fn test_hash_map_history() {
        let mut map: HashMap<String, Vec<MeterReading>> = HashMap::new();
        map.insert("wm-1".to_string(), vec![reading("wm-1", 1, 1.0)]);
        assert_eq!(map.readings_for("wm-1").len(), 1);
        assert!(map.readings_for("wm-2").is_empty());
    }
}
